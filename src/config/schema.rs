//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default fetch pattern: `/<method-hint>/<encoded-url>`.
pub const DEFAULT_FETCH_PATTERN: &str = r"^/(?P<hint>[^/]*)/(?P<url>.*)$";

/// Default hosting prefix, as prepended by serverless function routers.
pub const DEFAULT_PREFIX_PATTERN: &str = r"^/\.netlify/functions/[^/]+";

/// Loopback, private, link-local and unspecified hosts.
pub const DEFAULT_BLACKLIST_PATTERN: &str = r"(?i)^(localhost|.*\.localhost|127\.\d+\.\d+\.\d+|10\.\d+\.\d+\.\d+|192\.168\.\d+\.\d+|172\.(1[6-9]|2\d|3[01])\.\d+\.\d+|169\.254\.\d+\.\d+|0\.0\.0\.0|::1?|fe80:.*|f[cd][0-9a-f]{2}:.*)$";

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Path patterns used to extract the target URL.
    pub routing: RoutingConfig,

    /// Target host filtering.
    pub security: SecurityConfig,

    /// Headers and body encodings introduced by the hosting layer.
    pub ingress: IngressConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Listening port.
    pub port: u16,
}

impl ListenerConfig {
    /// `address:port` string suitable for `TcpListener::bind`.
    pub fn socket_address(&self) -> String {
        if self.bind_address.contains(':') {
            format!("[{}]:{}", self.bind_address, self.port)
        } else {
            format!("{}:{}", self.bind_address, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Size caps, applied independently to the request and the response.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes. A body reaching this size is rejected.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100_000,
        }
    }
}

/// Timeout configuration for outbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for the outbound request/response exchange in milliseconds.
    pub request_ms: u64,

    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,
}

impl TimeoutConfig {
    /// Deadline over the whole outbound exchange.
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    /// Deadline for establishing the outbound connection.
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 10_000,
            connect_ms: 5_000,
        }
    }
}

/// Path matching configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Pattern capturing the method hint and the encoded target URL.
    ///
    /// Named groups `hint` and `url` are used when present, otherwise
    /// groups 1 and 2.
    pub fetch_pattern: String,

    /// Prefix stripped from the path before matching. Empty disables it.
    pub prefix_pattern: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fetch_pattern: DEFAULT_FETCH_PATTERN.to_string(),
            prefix_pattern: DEFAULT_PREFIX_PATTERN.to_string(),
        }
    }
}

/// Target filtering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hostnames matching this pattern are never contacted.
    pub blacklist_hostname_pattern: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            blacklist_hostname_pattern: DEFAULT_BLACKLIST_PATTERN.to_string(),
        }
    }
}

/// Artifacts of the hosting/ingress layer that must not reach targets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Header name prefixes to strip (lowercase).
    pub strip_header_prefixes: Vec<String>,

    /// Exact header names to strip (lowercase).
    pub strip_headers: Vec<String>,

    /// Header marking the inbound body as transport-encoded (`base64`).
    pub body_encoding_header: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            strip_header_prefixes: vec!["x-nf-".to_string()],
            strip_headers: vec![
                "x-forwarded-host".to_string(),
                "x-forwarded-proto".to_string(),
            ],
            body_encoding_header: "x-proxy-body-encoding".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
