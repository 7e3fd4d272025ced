//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap the outbound exchange with a single deadline
//! - Cancel the exchange cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry drops the wrapped future, which closes its connection
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Run `exchange` under `deadline`, mapping expiry to `ProxyError::Timeout`.
pub async fn with_deadline<F, T>(deadline: Duration, url: &str, exchange: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, ProxyError>>,
{
    match tokio::time::timeout(deadline, exchange).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(url = %url, timeout_ms = deadline.as_millis() as u64, "Outbound request timed out");
            Err(ProxyError::Timeout { url: url.to_string() })
        }
    }
}
