//! Core types and shared functionality for mcp-sitemap.
//!
//! This crate provides:
//! - Sitemap tree cache with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachedTree};
pub use config::{AppConfig, ConfigError, Transport};
pub use error::Error;
