//! Request-scoped endpoint feature.
//!
//! # Responsibilities
//! - Carry the match result from the dispatch stage to downstream stages
//! - Stored in request extensions, looked up by type
//!
//! # Design Decisions
//! - Created fresh per request, never shared across requests
//! - Written exactly once: `Unset` → `Matched(E)` or `NoMatch`
//! - Cheap to clone; clones observe the same slot

use std::sync::{Arc, OnceLock};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{Request, StatusCode};

use crate::dispatch::error::MatchError;
use crate::routing::endpoint::Endpoint;

/// Observable state of the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureState {
    Unset,
    Matched(Arc<Endpoint>),
    NoMatch,
}

/// Handle to the per-request endpoint slot.
#[derive(Debug, Clone, Default)]
pub struct EndpointFeature {
    slot: Arc<OnceLock<Option<Arc<Endpoint>>>>,
}

impl EndpointFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the selected endpoint.
    pub fn set_endpoint(&self, endpoint: Arc<Endpoint>) -> Result<(), MatchError> {
        self.resolve(Some(endpoint))
    }

    /// Record that no endpoint applies.
    pub fn set_no_match(&self) -> Result<(), MatchError> {
        self.resolve(None)
    }

    fn resolve(&self, value: Option<Arc<Endpoint>>) -> Result<(), MatchError> {
        self.slot
            .set(value)
            .map_err(|_| MatchError::SlotAlreadyResolved)
    }

    /// Mark as `NoMatch` if nothing was written yet. Returns true if it did.
    pub(crate) fn finalize(&self) -> bool {
        self.slot.set(None).is_ok()
    }

    pub fn state(&self) -> FeatureState {
        match self.slot.get() {
            None => FeatureState::Unset,
            Some(Some(endpoint)) => FeatureState::Matched(endpoint.clone()),
            Some(None) => FeatureState::NoMatch,
        }
    }

    /// The selected endpoint, if any.
    pub fn endpoint(&self) -> Option<Arc<Endpoint>> {
        self.slot.get().and_then(|e| e.clone())
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.get().is_some()
    }
}

/// Access the endpoint feature attached by the dispatch stage.
pub trait EndpointFeatureExt {
    fn endpoint_feature(&self) -> Option<&EndpointFeature>;

    /// Shorthand for the selected endpoint.
    fn endpoint(&self) -> Option<Arc<Endpoint>> {
        self.endpoint_feature().and_then(EndpointFeature::endpoint)
    }
}

impl<B> EndpointFeatureExt for Request<B> {
    fn endpoint_feature(&self) -> Option<&EndpointFeature> {
        self.extensions().get::<EndpointFeature>()
    }
}

impl EndpointFeatureExt for Parts {
    fn endpoint_feature(&self) -> Option<&EndpointFeature> {
        self.extensions.get::<EndpointFeature>()
    }
}

impl<S> FromRequestParts<S> for EndpointFeature
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.endpoint_feature().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Endpoint dispatch stage is not installed",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_written_once() {
        let feature = EndpointFeature::new();
        assert_eq!(feature.state(), FeatureState::Unset);
        assert!(!feature.is_resolved());

        feature.set_endpoint(Arc::new(Endpoint::new("Home"))).unwrap();
        assert!(feature.is_resolved());
        assert_eq!(feature.endpoint().unwrap().display_name(), "Home");

        assert!(matches!(
            feature.set_no_match(),
            Err(MatchError::SlotAlreadyResolved)
        ));
        assert!(!feature.finalize());
        assert_eq!(feature.endpoint().unwrap().display_name(), "Home");
    }

    #[test]
    fn test_finalize_unset() {
        let feature = EndpointFeature::new();
        assert!(feature.finalize());
        assert_eq!(feature.state(), FeatureState::NoMatch);
        assert!(feature.endpoint().is_none());
    }

    #[test]
    fn test_clones_share_slot() {
        let feature = EndpointFeature::new();
        let mut request = Request::new(());
        request.extensions_mut().insert(feature.clone());

        feature.set_no_match().unwrap();
        let attached = request.endpoint_feature().unwrap();
        assert_eq!(attached.state(), FeatureState::NoMatch);
        assert!(request.endpoint().is_none());
    }

    #[tokio::test]
    async fn test_extractor() {
        let feature = EndpointFeature::new();
        feature.set_endpoint(Arc::new(Endpoint::new("Api"))).unwrap();

        let mut request = Request::new(());
        request.extensions_mut().insert(feature);
        let (mut parts, _) = request.into_parts();

        let extracted = EndpointFeature::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.endpoint().unwrap().display_name(), "Api");

        let (mut bare, _) = Request::new(()).into_parts();
        let rejection = EndpointFeature::from_request_parts(&mut bare, &()).await.unwrap_err();
        assert_eq!(rejection.0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
