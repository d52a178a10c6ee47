//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Matcher construction (first request, once per process):
//!     EndpointSource[] (config, code)
//!     → source.rs (CompositeSource, order preserved)
//!     → MatcherBuilder (table.rs by default)
//!     → Freeze as immutable Matcher
//!
//! Per request:
//!     request head (host, path, method)
//!     → Matcher::match_request
//!     → EndpointFeature set to Endpoint or NoMatch
//! ```
//!
//! # Design Decisions
//! - Matchers are immutable after construction (thread-safe without locks)
//! - No hot reload: a matcher lives for the process lifetime
//! - Explicit NoMatch rather than silent default

pub mod endpoint;
pub mod matcher;
pub mod source;
pub mod table;

pub use endpoint::Endpoint;
pub use matcher::{Matcher, MatcherBuilder};
pub use source::{CompositeSource, EndpointSource, StaticEndpointSource};
pub use table::{RouteTable, RouteTableBuilder};
