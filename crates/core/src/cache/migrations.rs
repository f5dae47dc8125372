//! Database schema migrations.
//!
//! A `_migrations` table records every applied version; on open, anything
//! newer than the highest recorded version is applied in order inside one
//! transaction.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// A single schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered migration list. Every step uses `IF NOT EXISTS` so a partially
/// applied database can be migrated again.
const MIGRATIONS: &[Migration] =
    &[Migration { version: 1, name: "sitemap_cache", sql: include_str!("../../migrations/001_sitemap_cache.sql") }];

/// Run any pending migrations.
///
/// # Errors
///
/// Returns an error if a migration SQL fails to execute; the transaction is
/// rolled back and no version is recorded.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT '',
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current = current_version(conn)?;
        let tx = conn.transaction()?;

        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {e}", migration.version, migration.name)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version = migration.version, name = migration.name, "applied cache migration");
        }

        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}

fn current_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let has_cache_table: bool = conn
            .call(|conn| {
                conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='sitemap_cache')",
                    [],
                    |row| row.get(0),
                )
            })
            .await
            .unwrap();

        assert!(has_cache_table);
    }

    #[tokio::test]
    async fn test_migrations_version_tracking() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let (count, name): (i64, String) = conn
            .call(|conn| {
                conn.query_row("SELECT COUNT(*), MAX(name) FROM _migrations", [], |row| Ok((row.get(0)?, row.get(1)?)))
            })
            .await
            .unwrap();

        assert_eq!(count, MIGRATIONS.len() as i64);
        assert_eq!(name, "sitemap_cache");
    }
}
