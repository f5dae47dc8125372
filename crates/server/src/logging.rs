//! Tracing setup.
//!
//! JSON lines go to stderr, never stdout: in stdio mode stdout carries the
//! JSON-RPC stream. A copy goes to `LOG_FILE` (`sitemap_server.log` unless
//! set empty). `RUST_LOG` overrides the configured level.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use sitemap_core::AppConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
pub fn init(config: &AppConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(config.log_directive()?),
    };

    let file_layer = match config.log_file_path() {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(tracing_subscriber::fmt::layer().json().with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(path) = config.log_file_path() {
        tracing::info!("Logging to file: {}", path.display());
    }
    Ok(())
}

/// Open `path` for appending, creating it and its parent directory.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_open_log_file_appends() {
        let dir = std::env::temp_dir().join(format!("mcp-sitemap-log-{}", std::process::id()));
        let path = dir.join("nested").join("server.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_open_log_file_rejects_directory() {
        assert!(open_log_file(&std::env::temp_dir()).is_err());
    }
}
