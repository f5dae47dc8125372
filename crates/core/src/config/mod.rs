//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Bare environment variables (TRANSPORT, HOST, PORT, CACHE_MAX_AGE, LOG_LEVEL, LOG_FILE)
//! 2. Prefixed environment variables (SITEMAP_MCP_*)
//! 3. TOML config file (if SITEMAP_MCP_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variables read without a prefix.
const BARE_ENV_KEYS: &[&str] = &["transport", "host", "port", "cache_max_age", "log_level", "log_file"];

/// How the MCP server talks to its client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    /// JSON-RPC over stdin/stdout.
    Stdio,
    /// Streamable HTTP at `/mcp`. `sse` is accepted for compatibility with older clients' settings.
    #[serde(alias = "sse", alias = "http")]
    StreamableHttp,
}

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Transport used to serve MCP.
    ///
    /// Set via TRANSPORT environment variable (`stdio` or `sse`).
    #[serde(default = "default_transport")]
    pub transport: Transport,

    /// Bind address for the HTTP transport.
    ///
    /// Set via HOST environment variable.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port for the HTTP transport.
    ///
    /// Set via PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a cached sitemap tree stays fresh.
    ///
    /// Set via CACHE_MAX_AGE environment variable.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: u64,

    /// Log level used when RUST_LOG is not set.
    ///
    /// Set via LOG_LEVEL environment variable.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// File that receives a copy of every log line (default
    /// `sitemap_server.log`). An empty value turns the file sink off.
    ///
    /// Set via LOG_FILE environment variable.
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,

    /// Path to SQLite cache database. In-memory when unset.
    ///
    /// Set via SITEMAP_MCP_DB_PATH environment variable.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SITEMAP_MCP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SITEMAP_MCP_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes per sitemap document, after decompression.
    ///
    /// Set via SITEMAP_MCP_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Maximum nesting of index sitemaps below the homepage.
    ///
    /// Set via SITEMAP_MCP_MAX_DEPTH environment variable.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Sub-sitemaps fetched in parallel per index.
    ///
    /// Set via SITEMAP_MCP_FETCH_CONCURRENCY environment variable.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Refuse to fetch from loopback, private and link-local addresses.
    ///
    /// Set via SITEMAP_MCP_BLOCK_PRIVATE_HOSTS environment variable.
    #[serde(default = "default_true")]
    pub block_private_hosts: bool,
}

fn default_transport() -> Transport {
    Transport::StreamableHttp
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8050
}

fn default_cache_max_age() -> u64 {
    86_400
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("sitemap_server.log"))
}

fn default_user_agent() -> String {
    "mcp-sitemap/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    52_428_800 // 50MB, the sitemap protocol's uncompressed limit
}

fn default_max_depth() -> usize {
    10
}

fn default_fetch_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            host: default_host(),
            port: default_port(),
            cache_max_age: default_cache_max_age(),
            log_level: default_log_level(),
            log_file: default_log_file(),
            db_path: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_depth: default_max_depth(),
            fetch_concurrency: default_fetch_concurrency(),
            block_private_hosts: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Log file path, or `None` when the file sink is disabled.
    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file.as_deref().filter(|path| !path.as_os_str().is_empty())
    }

    /// Cache freshness window.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache_max_age)
    }

    /// Host and port for the HTTP transport, in the form
    /// `tokio::net::TcpListener::bind` accepts. Host names such as
    /// `localhost` are resolved when binding.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `host` is neither an IP address nor
    /// a DNS host name.
    pub fn bind_addr(&self) -> Result<(&str, u16), ConfigError> {
        Ok((validation::bind_host(&self.host)?, self.port))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Bare `TRANSPORT`, `HOST`, `PORT`, `CACHE_MAX_AGE`, `LOG_LEVEL`, `LOG_FILE`
    /// 2. Environment variables prefixed with `SITEMAP_MCP_`
    /// 3. TOML file from `SITEMAP_MCP_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SITEMAP_MCP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(
                Env::prefixed("SITEMAP_MCP_")
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            )
            .merge(Env::raw().only(BARE_ENV_KEYS));

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.transport, Transport::StreamableHttp);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8050);
        assert_eq!(config.cache_max_age, 86_400);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file_path(), Some(Path::new("sitemap_server.log")));
        assert!(config.db_path.is_none());
        assert_eq!(config.user_agent, "mcp-sitemap/0.1");
        assert_eq!(config.max_depth, 10);
        assert!(config.block_private_hosts);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.cache_max_age(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_bind_addr() {
        let config = AppConfig { host: "127.0.0.1".into(), port: 9000, ..Default::default() };
        assert_eq!(config.bind_addr().unwrap(), ("127.0.0.1", 9000));

        let config = AppConfig { host: "localhost".into(), ..Default::default() };
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr().unwrap(), ("localhost", 8050));

        let config = AppConfig { host: "[::1]".into(), ..Default::default() };
        assert_eq!(config.bind_addr().unwrap(), ("::1", 8050));

        let config = AppConfig { host: "not a host".into(), ..Default::default() };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_transport_aliases() {
        for raw in ["\"sse\"", "\"http\"", "\"streamable-http\""] {
            let transport: Transport = serde_json::from_str(raw).unwrap();
            assert_eq!(transport, Transport::StreamableHttp);
        }
        let transport: Transport = serde_json::from_str("\"stdio\"").unwrap();
        assert_eq!(transport, Transport::Stdio);
    }

    #[test]
    fn test_load_bare_env() {
        Jail::expect_with(|jail| {
            jail.set_env("TRANSPORT", "stdio");
            jail.set_env("PORT", "9100");
            jail.set_env("CACHE_MAX_AGE", "60");
            jail.set_env("LOG_LEVEL", "DEBUG");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.transport, Transport::Stdio);
            assert_eq!(config.port, 9100);
            assert_eq!(config.cache_max_age, 60);
            assert_eq!(config.log_level, "DEBUG");
            assert_eq!(config.log_file_path(), Some(Path::new("sitemap_server.log")));
            Ok(())
        });
    }

    #[test]
    fn test_log_file_override_and_disable() {
        Jail::expect_with(|jail| {
            jail.set_env("LOG_FILE", "logs/mcp.log");
            let config = AppConfig::load().unwrap();
            assert_eq!(config.log_file_path(), Some(Path::new("logs/mcp.log")));

            let disabled = AppConfig { log_file: Some(PathBuf::new()), ..Default::default() };
            assert!(disabled.log_file_path().is_none());
            let unset = AppConfig { log_file: None, ..Default::default() };
            assert!(unset.log_file_path().is_none());
            Ok(())
        });
    }

    #[test]
    fn test_load_prefixed_env_and_file() {
        Jail::expect_with(|jail| {
            jail.create_file("sitemap.toml", "user_agent = \"from-file/1.0\"\nmax_depth = 4\n")?;
            jail.set_env("SITEMAP_MCP_CONFIG_FILE", "sitemap.toml");
            jail.set_env("SITEMAP_MCP_MAX_DEPTH", "6");

            let config = AppConfig::load().unwrap();
            assert_eq!(config.user_agent, "from-file/1.0");
            assert_eq!(config.max_depth, 6);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "0");
            assert!(AppConfig::load().is_err());
            Ok(())
        });
    }
}
