//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for environment variable {key}")]
    Env { key: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests do not touch process state.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("PORT") {
        config.listener.port = parse_env("PORT", value)?;
    }
    if let Some(value) = lookup("CORS_PROXY_BIND_ADDRESS") {
        config.listener.bind_address = value;
    }
    if let Some(value) = lookup("CORS_PROXY_MAX_BODY_BYTES") {
        config.limits.max_body_bytes = parse_env("CORS_PROXY_MAX_BODY_BYTES", value)?;
    }
    if let Some(value) = lookup("CORS_PROXY_TIMEOUT_MS") {
        config.timeouts.request_ms = parse_env("CORS_PROXY_TIMEOUT_MS", value)?;
    }
    if let Some(value) = lookup("CORS_PROXY_BLACKLIST_PATTERN") {
        config.security.blacklist_hostname_pattern = value;
    }
    if let Some(value) = lookup("CORS_PROXY_FETCH_PATTERN") {
        config.routing.fetch_pattern = value;
    }
    if let Some(value) = lookup("CORS_PROXY_LOG_LEVEL") {
        config.observability.log_level = value;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}
