//! Header rewriting between hops.
//!
//! # Responsibilities
//! - Derive the outbound header map from the inbound one
//! - Strip hop-by-hop, ingress and browser-identity headers
//! - Strip framing headers from relayed responses
//!
//! # Design Decisions
//! - The inbound map is never mutated; a new map is built by copy + overrides
//! - The inbound `host` is dropped; the client derives it from the target URL
//! - Ingress rules are configurable since every hosting layer adds its own

use axum::http::header::{self, HeaderMap, HeaderName};

use crate::config::IngressConfig;

/// Connection-scoped headers (RFC 9110 §7.6.1) that never cross a hop.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Framing headers tied to the outbound connection.
const FRAMING: [HeaderName; 3] = [
    header::TRANSFER_ENCODING,
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
];

fn is_hop_by_hop(name: &HeaderName, listed: &[HeaderName]) -> bool {
    *name == header::UPGRADE || HOP_BY_HOP.contains(name) || listed.contains(name)
}

/// Header names listed inside `Connection` are hop-by-hop as well.
fn connection_listed(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect()
}

/// Compiled ingress header rules.
#[derive(Debug, Clone)]
pub struct HeaderRules {
    strip_prefixes: Vec<String>,
    strip_exact: Vec<HeaderName>,
    body_encoding: Option<HeaderName>,
}

impl HeaderRules {
    /// Compile the `[ingress]` rules; invalid header names are skipped.
    pub fn from_config(config: &IngressConfig) -> Self {
        let strip_exact = config
            .strip_headers
            .iter()
            .filter_map(|name| parse_name(name))
            .collect();
        let body_encoding = if config.body_encoding_header.is_empty() {
            None
        } else {
            parse_name(&config.body_encoding_header)
        };

        Self {
            strip_prefixes: config
                .strip_header_prefixes
                .iter()
                .map(|p| p.to_ascii_lowercase())
                .collect(),
            strip_exact,
            body_encoding,
        }
    }

    /// Header marking a transport-encoded inbound body, if configured.
    pub fn body_encoding_header(&self) -> Option<&HeaderName> {
        self.body_encoding.as_ref()
    }

    fn is_ingress(&self, name: &HeaderName) -> bool {
        self.strip_exact.contains(name)
            || self.body_encoding.as_ref() == Some(name)
            || self
                .strip_prefixes
                .iter()
                .any(|prefix| name.as_str().starts_with(prefix.as_str()))
    }

    /// Build the header map sent to the target.
    ///
    /// `content-length` survives only when a body is attached.
    pub fn outbound_headers(&self, inbound: &HeaderMap, with_body: bool) -> HeaderMap {
        let listed = connection_listed(inbound);
        let mut outbound = HeaderMap::with_capacity(inbound.len());

        for (name, value) in inbound.iter() {
            if is_hop_by_hop(name, &listed)
                || self.is_ingress(name)
                || *name == header::HOST
                || *name == header::ORIGIN
                || *name == header::REFERER
                || (!with_body && *name == header::CONTENT_LENGTH)
            {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        outbound
    }
}

fn parse_name(name: &str) -> Option<HeaderName> {
    match HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes()) {
        Ok(name) => Some(name),
        Err(_) => {
            tracing::warn!(header = %name, "Ignoring invalid ingress header name");
            None
        }
    }
}

/// Copy a target's response headers, minus framing and hop-by-hop headers.
pub fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let listed = connection_listed(upstream);
    let mut relayed = HeaderMap::with_capacity(upstream.len());

    for (name, value) in upstream.iter() {
        if FRAMING.contains(name) || is_hop_by_hop(name, &listed) {
            continue;
        }
        relayed.append(name.clone(), value.clone());
    }

    relayed
}
