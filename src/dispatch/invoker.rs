//! Per-request dispatch.
//!
//! # Responsibilities
//! - Attach a fresh `EndpointFeature` to every request
//! - Wait for the shared matcher (suspends only while it is being built)
//! - Run the matcher, report the outcome, then call the next stage
//!
//! # Design Decisions
//! - Strictly sequential per request: attach → match → observe → next
//! - A non-match is not an error; the next stage always runs after a
//!   successful match step
//! - Build and match failures propagate unchanged; the next stage is skipped

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::config::loader::ConfigError;
use crate::dispatch::error::DispatchError;
use crate::dispatch::feature::EndpointFeature;
use crate::dispatch::initializer::MatcherInitializer;
use crate::http::request::RequestIdExt;
use crate::observability::observer::{DispatchObserver, TracingObserver};
use crate::routing::matcher::MatcherBuilder;
use crate::routing::source::EndpointSource;

/// The dispatch stage: selects an endpoint and hands the request on.
#[derive(Debug)]
pub struct EndpointDispatcher {
    initializer: MatcherInitializer,
    observer: Arc<dyn DispatchObserver>,
}

impl EndpointDispatcher {
    pub fn new(initializer: MatcherInitializer, observer: Arc<dyn DispatchObserver>) -> Self {
        Self {
            initializer,
            observer,
        }
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn initializer(&self) -> &MatcherInitializer {
        &self.initializer
    }

    /// Dispatch one request and continue with `next`.
    pub async fn invoke<B, T, F, Fut>(&self, request: Request<B>, next: F) -> Result<T, DispatchError>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = T>,
    {
        let (mut parts, body) = request.into_parts();
        let feature = EndpointFeature::new();
        parts.extensions.insert(feature.clone());

        let matcher = self.initializer.matcher().await?;
        matcher.match_request(&parts, &feature).await?;

        if feature.finalize() {
            tracing::warn!(
                request_id = parts.request_id().unwrap_or("unknown"),
                "Matcher left the endpoint unset, treating as no match"
            );
        }

        match feature.endpoint() {
            Some(endpoint) => self.observer.match_success(endpoint.display_name()),
            None => self.observer.match_failure(),
        }

        Ok(next(Request::from_parts(parts, body)).await)
    }
}

/// Assembles an `EndpointDispatcher` from its collaborators.
#[derive(Default)]
pub struct DispatcherBuilder {
    sources: Vec<Arc<dyn EndpointSource>>,
    matcher_builder: Option<Arc<dyn MatcherBuilder>>,
    observer: Option<Arc<dyn DispatchObserver>>,
}

impl DispatcherBuilder {
    /// Add an endpoint source. Sources keep the order they are added in.
    pub fn source(mut self, source: impl EndpointSource + 'static) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = Arc<dyn EndpointSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Required.
    pub fn matcher_builder(mut self, builder: impl MatcherBuilder + 'static) -> Self {
        self.matcher_builder = Some(Arc::new(builder));
        self
    }

    /// Defaults to `TracingObserver`.
    pub fn observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<EndpointDispatcher, ConfigError> {
        let matcher_builder = self
            .matcher_builder
            .ok_or(ConfigError::MissingCollaborator("matcher builder"))?;
        let observer = self
            .observer
            .unwrap_or_else(|| Arc::new(TracingObserver));

        Ok(EndpointDispatcher::new(
            MatcherInitializer::new(self.sources, matcher_builder),
            observer,
        ))
    }
}

/// Axum middleware running the dispatch stage.
///
/// Errors are returned to axum unchanged and rendered by `DispatchError`'s
/// `IntoResponse` impl.
pub async fn dispatch_middleware(
    State(dispatcher): State<Arc<EndpointDispatcher>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, DispatchError> {
    dispatcher
        .invoke(request, |request| next.run(request))
        .await
}
