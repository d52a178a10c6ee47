//! Endpoint dispatch stage for HTTP request pipelines.
//!
//! For every request the dispatch stage selects the endpoint (if any) that
//! should handle it, publishes that choice in a request-scoped
//! [`EndpointFeature`], and hands the request to the next stage. The matcher
//! that makes the choice is built lazily, exactly once, by whichever request
//! arrives first.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::DispatchConfig;
pub use dispatch::{
    dispatch_middleware, DispatchError, EndpointDispatcher, EndpointFeature, EndpointFeatureExt,
};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Endpoint, EndpointSource, Matcher, MatcherBuilder};
