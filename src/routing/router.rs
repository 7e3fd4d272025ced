//! Target lookup for an inbound path.
//!
//! # Responsibilities
//! - Run the compiled matcher over the path-and-query
//! - Turn a match into a `ProxyTarget`
//! - Return an explicit error rather than a silent default

use crate::error::ProxyError;
use crate::routing::matcher::PathMatcher;
use crate::routing::target::ProxyTarget;

/// Parse the target descriptor out of an inbound path-and-query.
pub fn resolve_target(matcher: &PathMatcher, path_and_query: &str) -> Result<ProxyTarget, ProxyError> {
    let matched = matcher.extract(path_and_query).ok_or(ProxyError::InvalidUrl)?;
    ProxyTarget::parse(&matched)
}
