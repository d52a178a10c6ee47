//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch stage produces:
//!     → observer.rs (match success / failure events)
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Events are fire-and-forget: they never block or fail a request
//! - Request ID flows through log fields
//! - Metrics are cheap (atomic increments); without an installed
//!   recorder they are no-ops

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{DispatchObserver, TracingObserver};
