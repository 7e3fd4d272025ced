//! Outbound request forwarding.
//!
//! # Responsibilities
//! - Build the outbound request: promoted method, rewritten headers, body
//! - Stream the inbound body through the size counter
//! - Issue exactly one outbound call under the configured deadline
//! - Classify transport failures
//!
//! # Design Decisions
//! - TLS certificate verification is disabled: targets are arbitrary hosts,
//!   self-signed ones included
//! - No connection pooling, so no socket outlives the request that opened it
//! - Redirects are never followed: the 3xx goes back to the caller, so every
//!   accepted request makes exactly one outbound call

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, Method, Request},
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use std::error::Error as StdError;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::response::relay_response;
use crate::resilience::with_deadline;
use crate::routing::ProxyTarget;
use crate::security::headers::HeaderRules;
use crate::security::limits::{
    check_declared_length, collect_limited, limit_stream, reaches_limit, LimitTrip, LimitedBodyError,
};

/// Issues outbound requests on behalf of callers.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    timeout: Duration,
    limit: usize,
    headers: HeaderRules,
}

impl Forwarder {
    /// Build the outbound client from the timeout, limit and ingress settings.
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(config.timeouts.connect())
            .pool_max_idle_per_host(0)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeouts.request(),
            limit: config.limits.max_body_bytes,
            headers: HeaderRules::from_config(&config.ingress),
        })
    }

    /// Relay `request` to `target` and return the caller's response.
    pub async fn forward(&self, request: Request<Body>, target: &ProxyTarget) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();

        let method = target.outbound_method(&parts.method);
        let with_body = matches!(method, Method::POST | Method::PUT | Method::PATCH);

        // Bodies of other methods are dropped, so their size is irrelevant.
        let base64_body = with_body && self.is_base64(&parts.headers);
        if with_body {
            let declared_limit = if base64_body {
                encoded_limit(self.limit)
            } else {
                self.limit
            };
            check_declared_length(&parts.headers, declared_limit)
                .map_err(|_| ProxyError::PayloadTooLarge { limit: self.limit })?;
        }

        let mut headers = self.headers.outbound_headers(&parts.headers, with_body);
        if base64_body {
            // Length of the decoded body is set by the client.
            headers.remove(header::CONTENT_LENGTH);
        }
        let url = target.url().to_string();
        let trip = LimitTrip::new();

        tracing::debug!(
            method = %method,
            inbound_method = %parts.method,
            url = %url,
            with_body,
            "Forwarding request"
        );

        with_deadline(self.timeout, &url, async {
            let mut builder = self
                .client
                .request(method.clone(), target.url().clone())
                .headers(headers);
            if with_body {
                builder = builder.body(self.outbound_body(body, base64_body, trip.clone()).await?);
            }

            let upstream = builder
                .send()
                .await
                .map_err(|e| self.classify(e, &url, &trip))?;
            if trip.is_tripped() {
                return Err(ProxyError::PayloadTooLarge { limit: self.limit });
            }

            tracing::debug!(url = %url, status = %upstream.status(), "Target responded");
            let response = relay_response(upstream, self.limit).await?;
            if trip.is_tripped() {
                return Err(ProxyError::PayloadTooLarge { limit: self.limit });
            }
            Ok(response)
        })
        .await
    }

    fn is_base64(&self, headers: &HeaderMap) -> bool {
        self.headers
            .body_encoding_header()
            .and_then(|name| headers.get(name))
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().eq_ignore_ascii_case("base64"))
            .unwrap_or(false)
    }

    async fn outbound_body(&self, body: Body, base64_body: bool, trip: LimitTrip) -> Result<reqwest::Body, ProxyError> {
        if base64_body {
            let encoded = collect_limited(body.into_data_stream(), encoded_limit(self.limit))
                .await
                .map_err(|e| match e {
                    ProxyError::PayloadTooLarge { .. } => ProxyError::PayloadTooLarge { limit: self.limit },
                    other => other,
                })?;
            let decoded = STANDARD
                .decode(encoded.trim_ascii())
                .map_err(ProxyError::InvalidBody)?;
            if reaches_limit(decoded.len(), self.limit) {
                return Err(ProxyError::PayloadTooLarge { limit: self.limit });
            }
            return Ok(reqwest::Body::from(decoded));
        }

        if body.size_hint().exact() == Some(0) {
            return Ok(reqwest::Body::from(Bytes::new()));
        }

        Ok(reqwest::Body::wrap_stream(limit_stream(
            body.into_data_stream(),
            self.limit,
            trip,
        )))
    }

    fn classify(&self, err: reqwest::Error, url: &str, trip: &LimitTrip) -> ProxyError {
        if trip.is_tripped() || chain_has(&err, |e| matches!(e, LimitedBodyError::TooLarge { .. })) {
            return ProxyError::PayloadTooLarge { limit: self.limit };
        }
        if err.is_timeout() {
            tracing::warn!(url = %url, error = %err, "Outbound connect timed out");
            return ProxyError::Timeout { url: url.to_string() };
        }
        if err.is_connect() && is_dns_failure(&err) {
            tracing::warn!(url = %url, error = %err, "Target host cannot be resolved");
            return ProxyError::HostNotFound {
                url: url.to_string(),
                source: err,
            };
        }
        if err.is_body() || chain_has(&err, |e| matches!(e, LimitedBodyError::Stream(_))) {
            tracing::error!(url = %url, error = %err, "Request body stream failed");
            return ProxyError::stream(err);
        }

        tracing::error!(url = %url, error = %err, "Proxy request error");
        ProxyError::Transport {
            url: url.to_string(),
            source: err,
        }
    }
}

/// Base64 inflates by 4/3; the cap applies to the decoded bytes.
fn encoded_limit(limit: usize) -> usize {
    limit.saturating_mul(4) / 3 + 4
}

fn chain_has<P>(err: &reqwest::Error, predicate: P) -> bool
where
    P: Fn(&LimitedBodyError) -> bool,
{
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        if e.downcast_ref::<LimitedBodyError>().is_some_and(&predicate) {
            return true;
        }
        source = e.source();
    }
    false
}

/// Resolver failures surface as connect errors whose chain mentions DNS.
///
/// There is no typed resolver error to downcast to. hyper-util's legacy
/// `ConnectError` wraps resolver failures with the message `dns error`, and
/// the std `getaddrinfo` resolver reports `failed to lookup address
/// information`. Both are pinned by `test_unresolvable_host_is_dns_failure`.
fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(e) = source {
        let message = e.to_string();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        source = e.source();
    }
    false
}
