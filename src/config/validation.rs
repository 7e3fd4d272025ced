//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every pattern compiles
//! - Check that the fetch pattern exposes the hint and url captures
//! - Validate value ranges (limits and timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use regex::Regex;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::routing::matcher::{capture_indices, CaptureIndices};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid pattern: {reason}")]
    InvalidPattern { field: &'static str, reason: String },

    #[error("routing.fetch_pattern must capture the method hint and the url (named `hint`/`url` or two groups)")]
    MissingCaptures,

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Regex::new(&config.routing.fetch_pattern) {
        Ok(re) => {
            if capture_indices(&re) == CaptureIndices::Missing {
                errors.push(ValidationError::MissingCaptures);
            }
        }
        Err(e) => errors.push(ValidationError::InvalidPattern {
            field: "routing.fetch_pattern",
            reason: e.to_string(),
        }),
    }

    if !config.routing.prefix_pattern.is_empty() {
        if let Err(e) = Regex::new(&config.routing.prefix_pattern) {
            errors.push(ValidationError::InvalidPattern {
                field: "routing.prefix_pattern",
                reason: e.to_string(),
            });
        }
    }

    if let Err(e) = Regex::new(&config.security.blacklist_hostname_pattern) {
        errors.push(ValidationError::InvalidPattern {
            field: "security.blacklist_hostname_pattern",
            reason: e.to_string(),
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_bytes" });
    }
    if config.timeouts.request_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_ms" });
    }
    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_ms" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
