//! Request pipeline errors.
//!
//! Every variant is terminal for the request that produced it and maps to
//! exactly one caller-visible status code. CORS headers are attached by the
//! handler after conversion, so nothing here needs to know about them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Usage hint returned for paths that do not carry a usable target URL.
pub const USAGE_HINT: &str = "url must be in the form of /<b>GET</b>/{some_url_here}";

/// Errors raised while parsing, filtering, forwarding or relaying a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Path did not match the fetch pattern, or the URL segment failed to decode.
    #[error("invalid target url")]
    InvalidUrl,

    /// Target URL has no host.
    #[error("relative url")]
    RelativeUrl,

    /// Target hostname matched the blacklist pattern.
    #[error("blacklisted host {host}")]
    BlacklistedHost { host: String },

    /// Target scheme is neither http nor https.
    #[error("unsupported scheme {scheme}")]
    UnsupportedScheme { scheme: String },

    /// Body flagged as base64 could not be decoded.
    #[error("request body is not valid base64")]
    InvalidBody(#[source] base64::DecodeError),

    /// Request or response body reached the configured cap.
    #[error("payload reached the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    /// Target host could not be resolved.
    #[error("host for {url} cannot be found")]
    HostNotFound {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Outbound exchange exceeded its deadline.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Any other outbound failure.
    #[error("outbound request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// I/O failure while one of the bodies was in flight.
    #[error("stream error")]
    Stream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ProxyError {
    /// Wrap a body I/O failure.
    pub fn stream<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        ProxyError::Stream(err.into())
    }

    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidUrl | ProxyError::RelativeUrl => StatusCode::NOT_FOUND,
            ProxyError::BlacklistedHost { .. }
            | ProxyError::UnsupportedScheme { .. }
            | ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::HostNotFound { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Transport { .. } | ProxyError::Stream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Body returned to the caller. Transport and stream details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            ProxyError::InvalidUrl => USAGE_HINT.to_string(),
            ProxyError::RelativeUrl => "relative URLS are not supported".to_string(),
            ProxyError::BlacklistedHost { .. } => "naughty, naughty...".to_string(),
            ProxyError::UnsupportedScheme { .. } => {
                "only http and https are supported".to_string()
            }
            ProxyError::InvalidBody(_) => "request body is not valid base64".to_string(),
            ProxyError::PayloadTooLarge { limit } => format!(
                "the content in the request or response cannot exceed {} characters.",
                limit
            ),
            ProxyError::HostNotFound { url, .. } => format!("Host for {} cannot be found.", url),
            ProxyError::Timeout { url } => format!("Request to {} timed out.", url),
            ProxyError::Transport { .. } => "Proxy request error".to_string(),
            ProxyError::Stream(_) => "Stream error".to_string(),
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidUrl => "invalid_url",
            ProxyError::RelativeUrl => "relative_url",
            ProxyError::BlacklistedHost { .. } => "blacklisted_host",
            ProxyError::UnsupportedScheme { .. } => "unsupported_scheme",
            ProxyError::InvalidBody(_) => "invalid_body",
            ProxyError::PayloadTooLarge { .. } => "payload_too_large",
            ProxyError::HostNotFound { .. } => "host_not_found",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::Transport { .. } => "transport",
            ProxyError::Stream(_) => "stream",
        }
    }

    /// Validation failures happen before any outbound call is made.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ProxyError::InvalidUrl
                | ProxyError::RelativeUrl
                | ProxyError::BlacklistedHost { .. }
                | ProxyError::UnsupportedScheme { .. }
                | ProxyError::InvalidBody(_)
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::InvalidUrl.status(), StatusCode::NOT_FOUND);
        assert_eq!(ProxyError::RelativeUrl.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ProxyError::BlacklistedHost { host: "127.0.0.1".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::UnsupportedScheme { scheme: "ftp".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::PayloadTooLarge { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ProxyError::Timeout { url: "http://a/".into() }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ProxyError::stream(std::io::Error::other("reset")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ProxyError::InvalidUrl.message(), USAGE_HINT);
        assert_eq!(
            ProxyError::PayloadTooLarge { limit: 100 }.message(),
            "the content in the request or response cannot exceed 100 characters."
        );
        let blocked = ProxyError::BlacklistedHost { host: "localhost".into() };
        assert_eq!(blocked.message(), "naughty, naughty...");
        assert!(blocked.is_rejection());
        assert!(!ProxyError::Timeout { url: "http://a/".into() }.is_rejection());
    }
}
