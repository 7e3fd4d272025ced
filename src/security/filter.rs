//! Target filtering.
//!
//! # Responsibilities
//! - Reject targets without a host (relative URLs)
//! - Reject hostnames matching the blacklist pattern
//! - Reject schemes other than http and https
//!
//! # Design Decisions
//! - Checks run in that order and stop at the first failure
//! - Pure validation: no I/O, no DNS lookups
//! - The blacklist sees the canonical hostname from `ProxyTarget::hostname`,
//!   so `localhost.` and `[::ffff:127.0.0.1]` match like their plain forms

use regex::Regex;

use crate::config::schema::SecurityConfig;
use crate::config::validation::ValidationError;
use crate::error::ProxyError;
use crate::routing::ProxyTarget;

/// Compiled target filter.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    blacklist: Regex,
}

impl TargetFilter {
    /// Compile the hostname blacklist.
    pub fn new(blacklist_pattern: &str) -> Result<Self, ValidationError> {
        let blacklist = Regex::new(blacklist_pattern).map_err(|e| ValidationError::InvalidPattern {
            field: "security.blacklist_hostname_pattern",
            reason: e.to_string(),
        })?;
        Ok(Self { blacklist })
    }

    /// Build the filter from the `[security]` section.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ValidationError> {
        Self::new(&config.blacklist_hostname_pattern)
    }

    /// Run every check against a parsed target, stopping at the first failure.
    pub fn check(&self, target: &ProxyTarget) -> Result<(), ProxyError> {
        let hostname = target.hostname().ok_or(ProxyError::RelativeUrl)?;

        if self.blacklist.is_match(&hostname) {
            return Err(ProxyError::BlacklistedHost { host: hostname });
        }

        match target.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ProxyError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}
