//! `SQLite`-backed progress store.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::{ProgressError, ProgressStore, Result};
use crate::db::Database;

/// Progress store persisted in the crawl database.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SqliteProgressStore {
    db: Database,
}

impl SqliteProgressStore {
    /// Creates a store over an opened, migrated database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn index_param(index: usize) -> Result<i64> {
    i64::try_from(index).map_err(|_| ProgressError::IndexOutOfRange(index))
}

fn count_result(count: i64) -> usize {
    usize::try_from(count).unwrap_or_default()
}

#[async_trait]
impl ProgressStore for SqliteProgressStore {
    #[instrument(level = "trace", skip(self))]
    async fn is_image_done(&self, chapter_key: &str, index: usize) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM image_progress WHERE chapter_key = ? AND image_index = ?",
        )
        .bind(chapter_key)
        .bind(index_param(index)?)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.is_some())
    }

    #[instrument(level = "trace", skip(self))]
    async fn mark_image_done(&self, chapter_key: &str, index: usize) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO image_progress (chapter_key, image_index) VALUES (?, ?)")
            .bind(chapter_key)
            .bind(index_param(index)?)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn count_done(&self, chapter_key: &str) -> Result<usize> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM image_progress WHERE chapter_key = ?")
                .bind(chapter_key)
                .fetch_one(self.db.pool())
                .await?;
        Ok(count_result(count))
    }

    #[instrument(level = "trace", skip(self))]
    async fn is_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT done FROM chapter_progress WHERE comic_key = ? AND chapter_key = ?",
        )
        .bind(comic_key)
        .bind(chapter_key)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.is_some_and(|(done,)| done == 1))
    }

    #[instrument(level = "trace", skip(self))]
    async fn mark_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO chapter_progress (comic_key, chapter_key, done) VALUES (?, ?, 1) \
             ON CONFLICT (comic_key, chapter_key) DO UPDATE SET done = 1",
        )
        .bind(comic_key)
        .bind(chapter_key)
        .execute(self.db.pool())
        .await?;
        debug!(comic = comic_key, chapter = chapter_key, "chapter recorded complete");
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    async fn count_chapters_done(&self, comic_key: &str) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM chapter_progress WHERE comic_key = ? AND done = 1",
        )
        .bind(comic_key)
        .fetch_one(self.db.pool())
        .await?;
        Ok(count_result(count))
    }

    #[instrument(level = "trace", skip(self))]
    async fn is_comic_done(&self, comic_key: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM comic_progress WHERE comic_key = ?")
            .bind(comic_key)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    #[instrument(level = "trace", skip(self))]
    async fn mark_comic_done(&self, comic_key: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO comic_progress (comic_key) VALUES (?) \
             ON CONFLICT (comic_key) DO UPDATE SET archived_at = datetime('now')",
        )
        .bind(comic_key)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}
