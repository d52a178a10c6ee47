//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::request::Parts;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use endpoint_dispatch::dispatch::{BuildError, MatchError};
use endpoint_dispatch::observability::DispatchObserver;
use endpoint_dispatch::routing::{CompositeSource, RouteTable, RouteTableBuilder};
use endpoint_dispatch::{DispatchConfig, EndpointFeature, HttpServer, Matcher, MatcherBuilder, Shutdown};

/// Records every match event in order. `None` is a failure event.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Option<String>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<Option<String>> {
        self.events.lock().unwrap().clone()
    }
}

impl DispatchObserver for RecordingObserver {
    fn match_success(&self, endpoint: &str) {
        self.events.lock().unwrap().push(Some(endpoint.to_string()));
    }

    fn match_failure(&self) {
        self.events.lock().unwrap().push(None);
    }
}

/// Route table that counts how often it is asked to match.
#[derive(Debug)]
pub struct CountingMatcher {
    table: RouteTable,
    calls: Arc<AtomicUsize>,
}

impl Matcher for CountingMatcher {
    fn match_request<'a>(
        &'a self,
        request: &'a Parts,
        feature: &'a EndpointFeature,
    ) -> BoxFuture<'a, Result<(), MatchError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table.match_request(request, feature)
    }
}

/// A builder that takes `delay` and counts its invocations in `builds`.
/// The matchers it produces count their calls in `matches`.
pub fn slow_builder(
    delay: Duration,
    builds: Arc<AtomicUsize>,
    matches: Arc<AtomicUsize>,
) -> impl MatcherBuilder + 'static {
    move |source: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
        builds.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(delay);
        Ok(Arc::new(CountingMatcher {
            table: RouteTableBuilder.compile(source)?,
            calls: matches.clone(),
        }))
    }
}

/// A builder that fails after `delay`, counting its invocations.
pub fn failing_builder(delay: Duration, builds: Arc<AtomicUsize>) -> impl MatcherBuilder + 'static {
    move |_: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
        builds.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(delay);
        Err(BuildError::Other("endpoint data source unavailable".into()))
    }
}

/// Start an `HttpServer` on an ephemeral port.
pub async fn start_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Start a server from configuration alone.
pub async fn start_configured(config: DispatchConfig) -> (SocketAddr, Shutdown) {
    start_server(HttpServer::new(config).unwrap()).await
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
