//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, CORS)
//!     → request.rs (request ID, client address)
//!     → [routing parses target, security filters it]
//!     → forward.rs (outbound request under deadline)
//!     → response.rs (size-capped relay, header copy, CORS overlay)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::CorsHeaders;
pub use server::{AppState, HttpServer};
