//! Response handling and transformation.
//!
//! # Responsibilities
//! - Compute the CORS headers for a caller
//! - Answer preflight requests
//! - Relay a target's response under the size cap
//!
//! # Design Decisions
//! - CORS headers are overlaid on every response, errors included
//! - Framing and hop-by-hop headers stripped automatically
//! - Response body held in memory, bounded by the cap, so an oversized body
//!   can still be answered with 413 instead of a truncated 200

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::Response,
};

use crate::error::ProxyError;
use crate::security::headers::relayed_headers;
use crate::security::limits::collect_limited;

/// CORS headers echoed back to one caller.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_headers: Option<HeaderValue>,
    allow_methods: Option<HeaderValue>,
}

impl CorsHeaders {
    /// `Origin` is echoed when present; preflights also echo the requested
    /// headers and method.
    pub fn from_request(method: &Method, headers: &HeaderMap) -> Self {
        let allow_origin = headers
            .get(header::ORIGIN)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));

        let (allow_headers, allow_methods) = if *method == Method::OPTIONS {
            (
                headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS).cloned(),
                headers.get(header::ACCESS_CONTROL_REQUEST_METHOD).cloned(),
            )
        } else {
            (None, None)
        };

        Self {
            allow_origin,
            allow_headers,
            allow_methods,
        }
    }

    /// Overlay the CORS headers, replacing any the target sent.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        if let Some(value) = &self.allow_headers {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value.clone());
        }
        if let Some(value) = &self.allow_methods {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value.clone());
        }
    }
}

/// Empty 204 answer to a CORS preflight.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

/// Turn a target response into the caller's response.
///
/// Dropping `upstream` on any error path closes the outbound connection.
pub async fn relay_response(upstream: reqwest::Response, limit: usize) -> Result<Response, ProxyError> {
    if let Some(len) = upstream.content_length() {
        if len >= limit as u64 {
            tracing::warn!(content_length = len, limit, "Target response exceeds size limit");
            return Err(ProxyError::PayloadTooLarge { limit });
        }
    }

    let status = upstream.status();
    let headers = relayed_headers(upstream.headers());
    let body = collect_limited(upstream.bytes_stream(), limit).await?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
