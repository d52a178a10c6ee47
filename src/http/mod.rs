//! HTTP hosting for the dispatch stage.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, timeout)
//!     → request.rs (request ID, set and propagated)
//!     → dispatch stage (endpoint feature attached)
//!     → endpoint handler (200 with endpoint name, or 404)
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
