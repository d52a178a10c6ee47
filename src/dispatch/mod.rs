//! Endpoint dispatch stage.
//!
//! # Data Flow
//! ```text
//! Request
//!     → invoker.rs (attach EndpointFeature to extensions)
//!     → initializer.rs (shared matcher; built once, on the first caller)
//!     → Matcher::match_request (feature = Endpoint | NoMatch)
//!     → DispatchObserver (success / failure signal)
//!     → next stage (always, after the feature is final)
//! ```
//!
//! # Failure Handling
//! - Build failure: cached, every request fails with the same `MatcherBuildError`
//! - Match failure: this request fails, nothing is cached
//! - No match: not a failure, downstream decides (e.g. 404)

pub mod error;
pub mod feature;
pub mod initializer;
pub mod invoker;

pub use error::{BuildError, DispatchError, MatchError, MatcherBuildError};
pub use feature::{EndpointFeature, EndpointFeatureExt, FeatureState};
pub use initializer::{InitState, MatcherHandle, MatcherInitializer, MatcherResult};
pub use invoker::{dispatch_middleware, DispatcherBuilder, EndpointDispatcher};
