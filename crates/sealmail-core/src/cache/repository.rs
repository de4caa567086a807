//! Cache storage repository.

use std::path::Path;

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::model::{CacheKind, CacheQuery, Cacheable};
use crate::Result;

/// Repository for cached backend records.
#[derive(Debug, Clone)]
pub struct CacheRepository {
    pool: SqlitePool,
}

impl CacheRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: impl AsRef<Path>) -> Result<Self> {
        let url = format!("sqlite:{}?mode=rwc", database_path.as_ref().display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        // a single connection that never expires, or the database goes with it
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_entities (
                kind TEXT NOT NULL,
                id TEXT NOT NULL,
                parent_id TEXT,
                group_id TEXT,
                sort_key TEXT NOT NULL DEFAULT '',
                payload TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY(kind, id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_entities_parent
            ON cached_entities(kind, parent_id, sort_key)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_entities_group
            ON cached_entities(kind, group_id, sort_key)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace a record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails.
    pub async fn put<T: Cacheable + Sync>(&self, record: &T) -> Result<()> {
        let index = record.cache_index();
        let payload = serde_json::to_string(record)?;

        sqlx::query(
            r"
            INSERT INTO cached_entities
                (kind, id, parent_id, group_id, sort_key, payload, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(kind, id) DO UPDATE SET
                parent_id = excluded.parent_id,
                group_id = excluded.group_id,
                sort_key = excluded.sort_key,
                payload = excluded.payload,
                cached_at = excluded.cached_at
            ",
        )
        .bind(T::KIND.as_str())
        .bind(record.cache_id())
        .bind(index.parent_id)
        .bind(index.group_id)
        .bind(index.sort_key)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert or replace several records.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails.
    pub async fn put_all<T: Cacheable + Sync>(&self, records: &[T]) -> Result<()> {
        for record in records {
            self.put(record).await?;
        }
        debug!(kind = T::KIND.as_str(), count = records.len(), "Cached records");
        Ok(())
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the payload is corrupt.
    pub async fn get<T: Cacheable>(&self, id: &str) -> Result<Option<T>> {
        let row = sqlx::query(r"SELECT payload FROM cached_entities WHERE kind = ? AND id = ?")
            .bind(T::KIND.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let payload: String = row.get("payload");
            serde_json::from_str(&payload).map_err(Into::into)
        })
        .transpose()
    }

    /// List records matching `query`, ordered by sort key then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a payload is corrupt.
    pub async fn list<T: Cacheable>(&self, query: &CacheQuery) -> Result<Vec<T>> {
        let direction = if query.descending { "DESC" } else { "ASC" };
        let sql = format!(
            r"
            SELECT payload FROM cached_entities
            WHERE kind = ?
              AND (? IS NULL OR parent_id = ?)
              AND (? IS NULL OR group_id = ?)
              AND (? IS NULL OR sort_key >= ?)
              AND (? IS NULL OR sort_key <= ?)
            ORDER BY sort_key {direction}, id {direction}
            LIMIT ? OFFSET ?
            "
        );

        let rows = sqlx::query(&sql)
            .bind(T::KIND.as_str())
            .bind(&query.parent_id)
            .bind(&query.parent_id)
            .bind(&query.group_id)
            .bind(&query.group_id)
            .bind(&query.sort_from)
            .bind(&query.sort_from)
            .bind(&query.sort_to)
            .bind(&query.sort_to)
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let payload: String = row.get("payload");
                serde_json::from_str(&payload).map_err(Into::into)
            })
            .collect()
    }

    /// Remove a record. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove(&self, kind: CacheKind, id: &str) -> Result<bool> {
        let result = sqlx::query(r"DELETE FROM cached_entities WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every record of `kind` belonging to `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove_by_parent(&self, kind: CacheKind, parent_id: &str) -> Result<u64> {
        let result = sqlx::query(r"DELETE FROM cached_entities WHERE kind = ? AND parent_id = ?")
            .bind(kind.as_str())
            .bind(parent_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every record of `kind` in `group_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn remove_by_group(&self, kind: CacheKind, group_id: &str) -> Result<u64> {
        let result = sqlx::query(r"DELETE FROM cached_entities WHERE kind = ? AND group_id = ?")
            .bind(kind.as_str())
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query(r"DELETE FROM cached_entities")
            .execute(&self.pool)
            .await?;
        debug!("Cleared local cache");
        Ok(())
    }

    /// Number of cached records of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self, kind: CacheKind) -> Result<u64> {
        let row = sqlx::query(r"SELECT COUNT(*) as count FROM cached_entities WHERE kind = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;

        let count: i64 = row.get("count");
        Ok(u64::try_from(count).unwrap_or_default())
    }

}
