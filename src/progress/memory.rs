//! In-process progress store for dry runs and tests.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use super::{ProgressStore, Result};

/// Progress store that lives only as long as the process.
///
/// Backs `--no-persist` runs. Each key maps to its own entry, so concurrent
/// marks on different chapters never contend.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    images: DashMap<String, HashSet<usize>>,
    chapters: DashMap<String, HashSet<String>>,
    comics: DashSet<String>,
}

impl MemoryProgressStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn is_image_done(&self, chapter_key: &str, index: usize) -> Result<bool> {
        Ok(self
            .images
            .get(chapter_key)
            .is_some_and(|done| done.contains(&index)))
    }

    async fn mark_image_done(&self, chapter_key: &str, index: usize) -> Result<()> {
        self.images
            .entry(chapter_key.to_string())
            .or_default()
            .insert(index);
        Ok(())
    }

    async fn count_done(&self, chapter_key: &str) -> Result<usize> {
        Ok(self.images.get(chapter_key).map_or(0, |done| done.len()))
    }

    async fn is_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<bool> {
        Ok(self
            .chapters
            .get(comic_key)
            .is_some_and(|done| done.contains(chapter_key)))
    }

    async fn mark_chapter_done(&self, comic_key: &str, chapter_key: &str) -> Result<()> {
        self.chapters
            .entry(comic_key.to_string())
            .or_default()
            .insert(chapter_key.to_string());
        Ok(())
    }

    async fn count_chapters_done(&self, comic_key: &str) -> Result<usize> {
        Ok(self.chapters.get(comic_key).map_or(0, |done| done.len()))
    }

    async fn is_comic_done(&self, comic_key: &str) -> Result<bool> {
        Ok(self.comics.contains(comic_key))
    }

    async fn mark_comic_done(&self, comic_key: &str) -> Result<()> {
        self.comics.insert(comic_key.to_string());
        Ok(())
    }
}
