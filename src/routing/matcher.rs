//! Path matching logic.
//!
//! # Responsibilities
//! - Strip the hosting-layer prefix (e.g. a function-routing path)
//! - Match the configured fetch pattern
//! - Extract the method hint and the encoded target URL
//!
//! # Design Decisions
//! - Patterns compiled once at startup
//! - Named captures (`hint`, `url`) preferred, positional groups 1/2 otherwise
//! - The whole remainder, query string included, belongs to the target URL

use regex::Regex;
use std::borrow::Cow;

use crate::config::schema::RoutingConfig;
use crate::config::validation::ValidationError;

/// How the fetch pattern exposes its captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureIndices {
    Named,
    Positional,
    Missing,
}

/// Inspect a compiled fetch pattern.
pub fn capture_indices(re: &Regex) -> CaptureIndices {
    if re.capture_names().flatten().any(|name| name == "url") {
        CaptureIndices::Named
    } else if re.captures_len() > 2 {
        CaptureIndices::Positional
    } else {
        CaptureIndices::Missing
    }
}

/// Result of a successful path match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// First path segment, e.g. `GET` or `post`. May be empty.
    pub method_hint: String,
    /// Still-encoded target URL. Never empty.
    pub encoded_url: String,
}

/// Compiled path patterns.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    prefix: Option<Regex>,
    fetch: Regex,
    captures: CaptureIndices,
}

impl PathMatcher {
    /// Compile the fetch pattern and the optional prefix pattern (empty = none).
    pub fn new(fetch_pattern: &str, prefix_pattern: &str) -> Result<Self, ValidationError> {
        let fetch = Regex::new(fetch_pattern).map_err(|e| ValidationError::InvalidPattern {
            field: "routing.fetch_pattern",
            reason: e.to_string(),
        })?;
        let captures = capture_indices(&fetch);
        if captures == CaptureIndices::Missing {
            return Err(ValidationError::MissingCaptures);
        }

        let prefix = if prefix_pattern.is_empty() {
            None
        } else {
            Some(Regex::new(prefix_pattern).map_err(|e| ValidationError::InvalidPattern {
                field: "routing.prefix_pattern",
                reason: e.to_string(),
            })?)
        };

        Ok(Self {
            prefix,
            fetch,
            captures,
        })
    }

    /// Compile the patterns of the `[routing]` section.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, ValidationError> {
        Self::new(&config.fetch_pattern, &config.prefix_pattern)
    }

    /// Remove the hosting prefix, keeping a leading `/`.
    pub fn normalize<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let Some(prefix) = &self.prefix else {
            return Cow::Borrowed(path);
        };
        match prefix.find(path) {
            Some(m) if m.start() == 0 => {
                let rest = &path[m.end()..];
                if rest.starts_with('/') {
                    Cow::Borrowed(rest)
                } else {
                    Cow::Owned(format!("/{}", rest))
                }
            }
            _ => Cow::Borrowed(path),
        }
    }

    /// Match a path-and-query string, returning `None` when no usable URL is captured.
    pub fn extract(&self, path_and_query: &str) -> Option<PathMatch> {
        let path = self.normalize(path_and_query);
        let caps = self.fetch.captures(&path)?;

        let (hint, url) = match self.captures {
            CaptureIndices::Named => (caps.name("hint"), caps.name("url")),
            _ => (caps.get(1), caps.get(2)),
        };

        let encoded_url = url.map(|m| m.as_str()).filter(|s| !s.is_empty())?;
        Some(PathMatch {
            method_hint: hint.map(|m| m.as_str().to_string()).unwrap_or_default(),
            encoded_url: encoded_url.to_string(),
        })
    }
}
