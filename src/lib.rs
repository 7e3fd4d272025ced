//! CORS forwarding proxy library.
//!
//! A caller requests `/<METHOD>/<encoded-target-url>`; the proxy relays the
//! request to the target and answers with permissive CORS headers attached.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
