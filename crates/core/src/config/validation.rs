//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use std::net::IpAddr;

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

/// `host` with IPv6 brackets removed, if it is an IP address or a DNS host name.
pub(crate) fn bind_host(host: &str) -> Result<&str, ConfigError> {
    let host = host.trim();
    let bare = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')).unwrap_or(host);
    if bare.parse::<IpAddr>().is_ok() || is_host_name(bare) {
        return Ok(bare);
    }
    Err(ConfigError::Invalid { field: "host".into(), reason: format!("'{host}' is not an IP address or host name") })
}

fn is_host_name(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    !host.is_empty()
        && host.len() <= 253
        && host.split('.').all(|label| {
            (1..=63).contains(&label.len())
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
                && !label.starts_with('-')
                && !label.ends_with('-')
        })
}

impl AppConfig {
    /// Tracing filter directive for `log_level`.
    ///
    /// Accepts tracing level names and the Python-style `WARNING`, `CRITICAL`
    /// and `FATAL`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for unknown level names.
    pub fn log_directive(&self) -> Result<&'static str, ConfigError> {
        match self.log_level.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok("trace"),
            "debug" => Ok("debug"),
            "info" => Ok("info"),
            "warn" | "warning" => Ok("warn"),
            "error" | "critical" | "fatal" => Ok("error"),
            "off" => Ok("off"),
            other => Err(ConfigError::Invalid { field: "log_level".into(), reason: format!("unknown level '{other}'") }),
        }
    }

    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `host` or `user_agent` is empty, or `port` is 0
    /// - `host` is neither an IP address nor a host name
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `max_depth` or `fetch_concurrency` is outside 1..=32
    /// - `log_level` is not a known level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "host".into(), reason: "must not be empty".into() });
        }
        bind_host(&self.host)?;
        if self.port == 0 {
            return Err(ConfigError::Invalid { field: "port".into(), reason: "must be greater than 0".into() });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_bytes == 0 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must be greater than 0".into() });
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_bytes".into(), reason: "must not exceed 100MB".into() });
        }

        if !(1..=32).contains(&self.max_depth) {
            return Err(ConfigError::Invalid { field: "max_depth".into(), reason: "must be between 1 and 32".into() });
        }
        if !(1..=32).contains(&self.fetch_concurrency) {
            return Err(ConfigError::Invalid {
                field: "fetch_concurrency".into(),
                reason: "must be between 1 and 32".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        self.log_directive()?;

        if self.cache_max_age == 0 {
            tracing::warn!("cache_max_age is 0; every request will refetch sitemaps");
        }

        Ok(())
    }
}
