//! Persistent record of which images, chapters and comics are already done.
//!
//! The store is the only source of truth for "skip this unit on re-run".
//! It is shared by every concurrent task, so all operations take `&self`
//! and are safe to call in parallel.
//!
//! Keys:
//! - comic key: the comic title
//! - chapter key: [`chapter_key`] of comic and chapter titles, so two comics
//!   with a chapter of the same name never share image records
//!
//! # Example
//!
//! ```
//! use comic_crawler::progress::{MemoryProgressStore, ProgressStore, chapter_key};
//!
//! # async fn example() -> Result<(), comic_crawler::progress::ProgressError> {
//! let store = MemoryProgressStore::new();
//! let key = chapter_key("Some Comic", "Chapter 1");
//! store.mark_image_done(&key, 0).await?;
//! assert!(store.is_image_done(&key, 0).await?);
//! assert_eq!(store.count_done(&key).await?, 1);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod sqlite;

pub use error::{ProgressError, StoreErrorKind};
pub use memory::MemoryProgressStore;
pub use sqlite::SqliteProgressStore;

use async_trait::async_trait;

/// Result type for progress store operations.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Builds the key under which a chapter's image records are stored.
///
/// `%` and `/` in the comic title are percent-escaped, so the first `/` in a
/// key always ends the comic part and distinct title pairs never share a key.
#[must_use]
pub fn chapter_key(comic: &str, chapter: &str) -> String {
    let comic = comic.replace('%', "%25").replace('/', "%2F");
    format!("{comic}/{chapter}")
}

/// Completion tracking contract.
///
/// Missing keys read as `false` / `0`. Marks are idempotent and monotonic:
/// nothing in this trait un-marks a unit.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Whether image `index` of the chapter was confirmed written.
    async fn is_image_done(&self, chapter_key: &str, index: usize) -> Result<bool>;

    /// Records image `index` of the chapter as written.
    async fn mark_image_done(&self, chapter_key: &str, index: usize) -> Result<()>;

    /// Number of distinct images recorded for the chapter.
    async fn count_done(&self, chapter_key: &str) -> Result<usize>;

    /// Whether the chapter was marked complete for the comic.
    async fn is_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<bool>;

    /// Marks the chapter complete for the comic.
    async fn mark_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<()>;

    /// Number of chapters marked complete for the comic.
    async fn count_chapters_done(&self, comic_key: &str) -> Result<usize>;

    /// Whether the comic was archived.
    async fn is_comic_done(&self, comic_key: &str) -> Result<bool>;

    /// Records the comic as archived.
    async fn mark_comic_done(&self, comic_key: &str) -> Result<()>;
}
