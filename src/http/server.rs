//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch stage and the endpoint handler
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve on a listener until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, DispatchConfig};
use crate::dispatch::{dispatch_middleware, EndpointDispatcher, EndpointFeature};
use crate::http::request::{RequestIdExt, UuidRequestId};
use crate::observability::metrics;
use crate::routing::{EndpointSource, RouteTableBuilder, StaticEndpointSource};

/// Body returned for a matched request.
#[derive(Debug, Serialize)]
pub struct EndpointResponse {
    pub endpoint: String,
    pub request_id: Option<String>,
}

/// HTTP server hosting the dispatch stage.
pub struct HttpServer {
    router: Router,
    config: DispatchConfig,
    dispatcher: Arc<EndpointDispatcher>,
}

impl HttpServer {
    /// Create a server whose endpoints come from the configured sources.
    pub fn new(config: DispatchConfig) -> Result<Self, ConfigError> {
        let sources = config.sources.iter().map(|source| {
            tracing::debug!(
                source = %source.name,
                endpoints = source.endpoints.len(),
                "Registering endpoint source"
            );
            Arc::new(StaticEndpointSource::from(source)) as Arc<dyn EndpointSource>
        });

        let dispatcher = EndpointDispatcher::builder()
            .sources(sources)
            .matcher_builder(RouteTableBuilder)
            .build()?;

        Ok(Self::with_dispatcher(config, Arc::new(dispatcher)))
    }

    /// Create a server around an already assembled dispatcher.
    pub fn with_dispatcher(config: DispatchConfig, dispatcher: Arc<EndpointDispatcher>) -> Self {
        let router = Self::build_router(&config, dispatcher.clone());
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &DispatchConfig, dispatcher: Arc<EndpointDispatcher>) -> Router {
        Router::new()
            .route("/", any(endpoint_handler))
            .route("/{*path}", any(endpoint_handler))
            .layer(middleware::from_fn_with_state(dispatcher, dispatch_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            sources = self.config.sources.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Arc<EndpointDispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}

/// Terminal stage: answers with the endpoint chosen by the dispatch stage.
async fn endpoint_handler(feature: EndpointFeature, request: Request<Body>) -> Response {
    let request_id = request.request_id().map(str::to_string);

    match feature.endpoint() {
        Some(endpoint) => {
            metrics::record_request(StatusCode::OK.as_u16());
            Json(EndpointResponse {
                endpoint: endpoint.display_name().to_string(),
                request_id,
            })
            .into_response()
        }
        None => {
            tracing::warn!(
                request_id = request_id.as_deref().unwrap_or("unknown"),
                method = %request.method(),
                path = %request.uri().path(),
                "No endpoint matched"
            );
            metrics::record_request(StatusCode::NOT_FOUND.as_u16());
            (StatusCode::NOT_FOUND, "No matching endpoint found").into_response()
        }
    }
}
