//! Single-flight matcher initialization.
//!
//! # States
//! - Uninitialized: no handle installed
//! - InFlight: a pending handle is installed and exactly one caller is building
//! - Ready / Failed: the handle holds the final result forever
//!
//! # State Transitions
//! ```text
//! Uninitialized → InFlight: compare-and-swap from None (at most once)
//! InFlight → Ready | Failed: winner resolves the handle (at most once)
//! ```
//!
//! # Design Decisions
//! - No lock is held while building; losers suspend on the handle instead
//! - The winner builds on its own call stack, never on a spawned task
//! - Nothing awaits between install and resolve, so cancelling the winner's
//!   request cannot strand the handle; a panicking builder resolves it with
//!   `BuildError::Panicked`
//! - Failures are cached and replayed, never retried

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use tokio::sync::Notify;

use crate::dispatch::error::{BuildError, MatcherBuildError};
use crate::observability::metrics;
use crate::routing::matcher::{Matcher, MatcherBuilder};
use crate::routing::source::{CompositeSource, EndpointSource};

/// Outcome of the one-time build.
pub type MatcherResult = Result<Arc<dyn Matcher>, MatcherBuildError>;

/// Initialization phase, as seen by an observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    InFlight,
    Ready,
    Failed,
}

/// Write-once result shared by every caller.
#[derive(Debug, Default)]
pub struct MatcherHandle {
    result: OnceLock<MatcherResult>,
    ready: Notify,
}

impl MatcherHandle {
    fn resolve(&self, result: MatcherResult) {
        if self.result.set(result).is_err() {
            tracing::warn!("Matcher handle resolved twice, keeping first result");
        }
        self.ready.notify_waiters();
    }

    /// The result, if the build has finished.
    pub fn peek(&self) -> Option<&MatcherResult> {
        self.result.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.result.get().is_some()
    }

    /// Suspend until the build has finished.
    pub async fn wait(&self) -> MatcherResult {
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            // Register before checking so a resolve in between is not missed.
            notified.as_mut().enable();

            if let Some(result) = self.result.get() {
                return result.clone();
            }
            notified.await;
        }
    }
}

/// Resolves the handle with a failure if the builder unwinds.
struct ResolveOnUnwind<'a> {
    handle: &'a MatcherHandle,
}

impl Drop for ResolveOnUnwind<'_> {
    fn drop(&mut self) {
        if !self.handle.is_resolved() {
            tracing::error!("Endpoint matcher builder panicked");
            self.handle
                .resolve(Err(MatcherBuildError::new(BuildError::Panicked)));
        }
    }
}

/// Builds the matcher exactly once, on behalf of whichever caller arrives first.
pub struct MatcherInitializer {
    sources: Vec<Arc<dyn EndpointSource>>,
    builder: Arc<dyn MatcherBuilder>,
    state: ArcSwapOption<MatcherHandle>,
}

impl MatcherInitializer {
    pub fn new(sources: Vec<Arc<dyn EndpointSource>>, builder: Arc<dyn MatcherBuilder>) -> Self {
        Self {
            sources,
            builder,
            state: ArcSwapOption::empty(),
        }
    }

    /// Return the shared handle, building the matcher if this call wins the race.
    ///
    /// The winning call blocks for the duration of the build.
    pub fn handle(&self) -> Arc<MatcherHandle> {
        if let Some(handle) = self.state.load_full() {
            return handle;
        }

        let candidate = Arc::new(MatcherHandle::default());
        let previous = self
            .state
            .compare_and_swap(&None::<Arc<MatcherHandle>>, Some(candidate.clone()));

        match &*previous {
            Some(installed) => installed.clone(),
            None => {
                self.build_into(&candidate);
                candidate
            }
        }
    }

    /// The matcher, or the cached build failure.
    pub async fn matcher(&self) -> MatcherResult {
        self.handle().wait().await
    }

    /// The result if already available, without building or suspending.
    pub fn try_matcher(&self) -> Option<MatcherResult> {
        self.state
            .load_full()
            .and_then(|handle| handle.peek().cloned())
    }

    pub fn state(&self) -> InitState {
        match self.state.load().as_deref().map(MatcherHandle::peek) {
            None => InitState::Uninitialized,
            Some(None) => InitState::InFlight,
            Some(Some(Ok(_))) => InitState::Ready,
            Some(Some(Err(_))) => InitState::Failed,
        }
    }

    fn build_into(&self, handle: &MatcherHandle) {
        let _unwind = ResolveOnUnwind { handle };
        let start = Instant::now();

        tracing::info!(sources = self.sources.len(), "Building endpoint matcher");

        let composite = CompositeSource::new(self.sources.clone());
        let result = self
            .builder
            .build(&composite)
            .map_err(MatcherBuildError::new);

        let elapsed = start.elapsed();
        metrics::record_matcher_build(result.is_ok(), elapsed);
        match &result {
            Ok(_) => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "Endpoint matcher ready"
            ),
            Err(e) => tracing::error!(
                error = %e,
                elapsed_ms = elapsed.as_millis() as u64,
                "Endpoint matcher construction failed; every request will fail until restart"
            ),
        }

        handle.resolve(result);
    }
}

impl std::fmt::Debug for MatcherInitializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherInitializer")
            .field("sources", &self.sources)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::endpoint::Endpoint;
    use crate::routing::source::StaticEndpointSource;
    use crate::routing::table::RouteTableBuilder;
    use std::panic::AssertUnwindSafe;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    fn sources() -> Vec<Arc<dyn EndpointSource>> {
        vec![Arc::new(StaticEndpointSource::new("test", [Endpoint::new("Home")]))]
    }

    fn same_matcher(a: &Arc<dyn Matcher>, b: &Arc<dyn Matcher>) -> bool {
        Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
    }

    fn counting_builder(calls: Arc<AtomicUsize>, delay: Duration) -> Arc<dyn MatcherBuilder> {
        Arc::new(move |source: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(delay);
            RouteTableBuilder.build(source)
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = Arc::new(MatcherInitializer::new(
            sources(),
            counting_builder(calls.clone(), Duration::from_millis(50)),
        ));
        assert_eq!(init.state(), InitState::Uninitialized);

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let init = init.clone();
            tasks.push(tokio::spawn(async move { init.matcher().await }));
        }

        let mut matchers = Vec::new();
        for task in tasks {
            matchers.push(task.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matchers.iter().all(|m| same_matcher(m, &matchers[0])));
        assert_eq!(init.state(), InitState::Ready);

        // Late callers take the fast path.
        let late = init.matcher().await.unwrap();
        assert!(same_matcher(&late, &matchers[0]));
        assert!(same_matcher(&init.try_matcher().unwrap().unwrap(), &late));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let builder: Arc<dyn MatcherBuilder> =
            Arc::new(move |_: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(BuildError::Other("bad endpoint data".into()))
            });
        let init = MatcherInitializer::new(sources(), builder);

        let first = init.matcher().await.unwrap_err();
        for _ in 0..10 {
            let again = init.matcher().await.unwrap_err();
            assert!(again.same_failure(&first));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(init.state(), InitState::Failed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_waiters_suspend_while_in_flight() {
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let builder: Arc<dyn MatcherBuilder> = {
            let entered = entered.clone();
            let release = release.clone();
            Arc::new(move |source: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
                entered.wait();
                release.wait();
                RouteTableBuilder.build(source)
            })
        };
        let init = Arc::new(MatcherInitializer::new(sources(), builder));

        let winner = {
            let init = init.clone();
            std::thread::spawn(move || init.handle())
        };
        entered.wait();
        assert_eq!(init.state(), InitState::InFlight);
        assert!(init.try_matcher().is_none());

        let waiter = {
            let init = init.clone();
            tokio::spawn(async move { init.matcher().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        release.wait();
        let handle = winner.join().unwrap();
        let from_waiter = waiter.await.unwrap().unwrap();
        let from_winner = handle.peek().unwrap().clone().unwrap();
        assert!(same_matcher(&from_waiter, &from_winner));
    }

    #[tokio::test]
    async fn test_panicking_builder_resolves_handle() {
        let builder: Arc<dyn MatcherBuilder> =
            Arc::new(|_: &CompositeSource| -> Result<Arc<dyn Matcher>, BuildError> {
                panic!("builder exploded")
            });
        let init = MatcherInitializer::new(sources(), builder);

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| init.handle()));
        assert!(outcome.is_err());

        let err = init.matcher().await.unwrap_err();
        assert!(matches!(**err.build_error(), BuildError::Panicked));
        assert_eq!(init.state(), InitState::Failed);
    }
}
