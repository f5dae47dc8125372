//! Sitemap tree cache operations.
//!
//! Rows hold the serialized tree for one site. A row is fresh while its age
//! is strictly below the caller's maximum age.

use std::time::Duration;

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

/// A cached sitemap tree row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTree {
    pub homepage: String,
    pub tree_json: String,
    pub page_count: i64,
    pub sitemap_count: i64,
    pub fetched_at: String,
}

/// Fixed-width RFC 3339 so timestamps compare correctly as text.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Oldest `fetched_at` that is still fresh for `max_age`.
fn cutoff(max_age: Duration) -> String {
    let cutoff = TimeDelta::from_std(max_age)
        .ok()
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    timestamp(cutoff)
}

impl CacheDb {
    /// Get the cached tree for `homepage` if it is younger than `max_age`.
    ///
    /// Returns None when there is no row or the row is stale.
    pub async fn get_tree(&self, homepage: &str, max_age: Duration) -> Result<Option<CachedTree>, Error> {
        let key_hash = compute_cache_key(homepage);
        let cutoff = cutoff(max_age);
        self.conn
            .call(move |conn| -> Result<Option<CachedTree>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT homepage, tree_json, page_count, sitemap_count, fetched_at
                     FROM sitemap_cache WHERE key_hash = ?1 AND fetched_at > ?2",
                )?;

                let result = stmt.query_row(params![key_hash, cutoff], |row| {
                    Ok(CachedTree {
                        homepage: row.get(0)?,
                        tree_json: row.get(1)?,
                        page_count: row.get(2)?,
                        sitemap_count: row.get(3)?,
                        fetched_at: row.get(4)?,
                    })
                });

                match result {
                    Ok(tree) => Ok(Some(tree)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the cached tree for `homepage`, stamped with the current time.
    pub async fn put_tree(
        &self, homepage: &str, tree_json: &str, page_count: usize, sitemap_count: usize,
    ) -> Result<(), Error> {
        self.put_tree_at(homepage, tree_json, page_count, sitemap_count, Utc::now())
            .await
    }

    async fn put_tree_at(
        &self, homepage: &str, tree_json: &str, page_count: usize, sitemap_count: usize, fetched_at: DateTime<Utc>,
    ) -> Result<(), Error> {
        let key_hash = compute_cache_key(homepage);
        let homepage = homepage.to_string();
        let tree_json = tree_json.to_string();
        let page_count = i64::try_from(page_count).unwrap_or(i64::MAX);
        let sitemap_count = i64::try_from(sitemap_count).unwrap_or(i64::MAX);
        let fetched_at = timestamp(fetched_at);

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO sitemap_cache (key_hash, homepage, tree_json, page_count, sitemap_count, fetched_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        homepage = excluded.homepage,
                        tree_json = excluded.tree_json,
                        page_count = excluded.page_count,
                        sitemap_count = excluded.sitemap_count,
                        fetched_at = excluded.fetched_at",
                    params![key_hash, homepage, tree_json, page_count, sitemap_count, fetched_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete rows that are no longer fresh for `max_age`.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_stale_trees(&self, max_age: Duration) -> Result<u64, Error> {
        let cutoff = cutoff(max_age);
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM sitemap_cache WHERE fetched_at <= ?1", params![cutoff])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cached tree.
    pub async fn clear_trees(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM sitemap_cache", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of cached trees, fresh or not.
    pub async fn count_trees(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM sitemap_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
