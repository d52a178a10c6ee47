//! Dispatch error types.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::observability::metrics;

/// Failure reported by a matcher builder.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid endpoint '{name}': {reason}")]
    InvalidEndpoint { name: String, reason: String },

    #[error("matcher builder panicked")]
    Panicked,

    #[error("{0}")]
    Other(String),
}

/// The one-time matcher construction failed.
///
/// Cached by the initializer and handed to every caller; clones share the
/// same underlying `BuildError`.
#[derive(Error, Debug, Clone)]
#[error("endpoint matcher construction failed: {source}")]
pub struct MatcherBuildError {
    #[source]
    source: Arc<BuildError>,
}

impl MatcherBuildError {
    pub fn new(source: BuildError) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// The underlying builder failure.
    pub fn build_error(&self) -> &Arc<BuildError> {
        &self.source
    }

    /// True if both errors come from the same build attempt.
    pub fn same_failure(&self, other: &MatcherBuildError) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

/// Matching failed for a single request.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("endpoint feature was already resolved for this request")]
    SlotAlreadyResolved,

    #[error("matcher failed: {0}")]
    Matcher(String),
}

/// Errors surfaced by the dispatch stage to the hosting transport.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Build(#[from] MatcherBuildError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Endpoint dispatch failed");
        metrics::record_request(StatusCode::INTERNAL_SERVER_ERROR.as_u16());
        (StatusCode::INTERNAL_SERVER_ERROR, "Endpoint dispatch failed").into_response()
    }
}
