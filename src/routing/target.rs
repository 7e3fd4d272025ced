//! Target descriptor: the destination decoded from the inbound path.

use axum::http::Method;
use percent_encoding::percent_decode_str;
use url::{Host, Url};

use crate::error::ProxyError;
use crate::routing::matcher::PathMatch;

/// Parsed destination of a relayed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    method_hint: String,
    url: Url,
}

impl ProxyTarget {
    /// Decode and parse a matched path.
    pub fn parse(matched: &PathMatch) -> Result<Self, ProxyError> {
        let decoded = decode_segment(&matched.encoded_url)?;
        let url = Url::parse(&decoded).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => ProxyError::RelativeUrl,
            _ => ProxyError::InvalidUrl,
        })?;

        Ok(Self {
            method_hint: matched.method_hint.clone(),
            url,
        })
    }

    /// Absolute target URL, query included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// First path segment as the caller wrote it.
    pub fn method_hint(&self) -> &str {
        &self.method_hint
    }

    /// URL scheme, lowercase.
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Canonical hostname for filtering; `None` for host-less URLs.
    ///
    /// IPv6 is rendered without brackets, IPv4-mapped IPv6 as plain IPv4,
    /// and a fully qualified domain loses its trailing dot.
    pub fn hostname(&self) -> Option<String> {
        url_hostname(&self.url)
    }

    /// Outbound method: GET is promoted to POST when the hint asks for it.
    pub fn outbound_method(&self, inbound: &Method) -> Method {
        if *inbound == Method::GET && self.method_hint.to_ascii_uppercase().starts_with("POST") {
            Method::POST
        } else {
            inbound.clone()
        }
    }
}

fn url_hostname(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.');
            (!domain.is_empty()).then(|| domain.to_string())
        }
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(match addr.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => addr.to_string(),
        }),
    }
}

/// Segments already in plain `scheme://` form are used verbatim so their own
/// escapes survive; everything else is percent-decoded once.
fn decode_segment(segment: &str) -> Result<String, ProxyError> {
    if segment.contains("://") {
        return Ok(segment.to_string());
    }
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ProxyError::InvalidUrl)
}
