//! Matcher capabilities.
//!
//! # Responsibilities
//! - `MatcherBuilder`: turn a composite source into an immutable matcher (once per process)
//! - `Matcher`: decide, per request, which endpoint applies and write it to the feature slot
//!
//! # Design Decisions
//! - Building is synchronous; it runs on the caller that wins the initialization race
//! - Matching returns a boxed future so implementations may suspend
//! - A non-match is written to the slot, never returned as an error

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use http::request::Parts;

use crate::dispatch::error::{BuildError, MatchError};
use crate::dispatch::feature::EndpointFeature;
use crate::routing::source::CompositeSource;

/// Selects the endpoint for a request.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Resolve `feature` to an endpoint or to "no match".
    ///
    /// Implementations must not return an error for an ordinary non-match.
    fn match_request<'a>(
        &'a self,
        request: &'a Parts,
        feature: &'a EndpointFeature,
    ) -> BoxFuture<'a, Result<(), MatchError>>;
}

/// Builds a matcher from the configured sources.
pub trait MatcherBuilder: Send + Sync {
    fn build(&self, source: &CompositeSource) -> Result<Arc<dyn Matcher>, BuildError>;
}

impl<F> MatcherBuilder for F
where
    F: Fn(&CompositeSource) -> Result<Arc<dyn Matcher>, BuildError> + Send + Sync,
{
    fn build(&self, source: &CompositeSource) -> Result<Arc<dyn Matcher>, BuildError> {
        self(source)
    }
}
