//! Shared state handed to every crawl task.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::comic::PageParser;
use crate::download::constants::DEFAULT_CONCURRENCY;
use crate::download::{BoundedRunner, HttpClient, RunnerError};
use crate::progress::ProgressStore;

/// Filesystem roots and fan-out bounds for a crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Comics are written to `<download_dir>/<title>/`.
    pub download_dir: PathBuf,
    /// Archives are written to `<archive_dir>/<title>.zip`.
    pub archive_dir: PathBuf,
    /// Chapters downloaded in parallel per comic.
    pub chapter_concurrency: usize,
    /// Images downloaded in parallel per chapter.
    pub image_concurrency: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("comics"),
            archive_dir: PathBuf::from("archives"),
            chapter_concurrency: DEFAULT_CONCURRENCY,
            image_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Everything a crawl task needs, built once at start-up.
///
/// Cloning is cheap: the client shares its pool and the store and parser
/// are reference counted. Clones are moved into spawned tasks.
#[derive(Clone)]
pub struct CrawlContext {
    client: HttpClient,
    store: Arc<dyn ProgressStore>,
    parser: Arc<dyn PageParser>,
    settings: Arc<CrawlSettings>,
    chapter_runner: BoundedRunner,
    image_runner: BoundedRunner,
}

impl CrawlContext {
    /// Assembles a context.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidConcurrency`] if either bound in
    /// `settings` is outside 1..=100.
    pub fn new(
        client: HttpClient,
        store: Arc<dyn ProgressStore>,
        parser: Arc<dyn PageParser>,
        settings: CrawlSettings,
    ) -> Result<Self, RunnerError> {
        let chapter_runner = BoundedRunner::new(settings.chapter_concurrency)?;
        let image_runner = BoundedRunner::new(settings.image_concurrency)?;
        Ok(Self {
            client,
            store,
            parser,
            settings: Arc::new(settings),
            chapter_runner,
            image_runner,
        })
    }

    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    #[must_use]
    pub fn store(&self) -> &dyn ProgressStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn parser(&self) -> &dyn PageParser {
        self.parser.as_ref()
    }

    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.settings.download_dir
    }

    #[must_use]
    pub fn archive_dir(&self) -> &Path {
        &self.settings.archive_dir
    }

    pub(crate) fn chapter_runner(&self) -> &BoundedRunner {
        &self.chapter_runner
    }

    pub(crate) fn image_runner(&self) -> &BoundedRunner {
        &self.image_runner
    }
}

impl std::fmt::Debug for CrawlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlContext")
            .field("client", &self.client)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
