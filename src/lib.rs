//! Comic Crawler Library
//!
//! Crawls a comic-hosting site, downloads every chapter's images with
//! bounded parallelism and retrying fetches, records progress so an
//! interrupted run resumes where it stopped, and zips each finished comic.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - Retrying HTTP client and bounded task runner
//! - [`progress`] - Image/chapter/comic completion records
//! - [`db`] - `SQLite` connection and schema management
//! - [`comic`] - Comic model and HTML page parsing
//! - [`crawl`] - Chapter and comic downloaders
//! - [`sidecar`] - `meta.json` writer
//! - [`archive`] - Zip packaging of finished comics

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod comic;
pub mod crawl;
pub mod db;
pub mod download;
pub mod progress;
pub mod sidecar;
pub mod user_agent;

// Re-export commonly used types
pub use archive::{ArchiveError, archive};
pub use comic::{Chapter, Comic, Meta, PageParser, ParseError, SitePageParser};
pub use crawl::{
    ChapterOutcome, ComicOutcome, CrawlContext, CrawlError, CrawlSettings, crawl_comic,
    download_chapter, download_comic,
};
pub use db::Database;
pub use download::{
    BoundedRunner, FetchError, HttpClient, HttpClientOptions, RetryDecision, RetryPolicy,
    RunReport, RunnerError, Task,
};
pub use progress::{MemoryProgressStore, ProgressError, ProgressStore, SqliteProgressStore};
pub use user_agent::{DEFAULT_USER_AGENT, resolve_user_agent};
