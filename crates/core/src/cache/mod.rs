//! SQLite-backed cache for parsed sitemap trees.
//!
//! Trees are stored as JSON keyed by the SHA-256 of the site homepage, with
//! async access via tokio-rusqlite. Freshness is decided at read time against
//! the configured maximum age, so changing `CACHE_MAX_AGE` applies to rows
//! written by earlier runs as well.

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod trees;

pub use crate::Error;

pub use connection::CacheDb;
pub use trees::CachedTree;
