//! The resumable crawl pipeline: comic → chapters → images → archive.
//!
//! ```text
//! crawl_comic
//!   └─ download_comic      (chapter runner, bound = chapter_concurrency)
//!        └─ download_chapter  (image runner, bound = image_concurrency)
//!             └─ HttpClient::download_to_file + ProgressStore::mark_image_done
//! ```
//!
//! Peak parallel image fetches are bounded by the product of the two bounds.

mod chapter;
mod comic;
mod context;
mod error;

pub use chapter::{
    ChapterOutcome, DownloadTarget, dir_name, download_chapter, plan_chapter_dirs, plan_targets,
};
pub use comic::{COVER_FILENAME, ComicOutcome, download_comic};
pub use context::{CrawlContext, CrawlSettings};
pub use error::CrawlError;

use tracing::{info, instrument};

/// Fetches and parses the comic page at `url`, then downloads the comic.
///
/// # Errors
///
/// Returns [`CrawlError`] if the page cannot be fetched or parsed, or if
/// [`download_comic`] fails.
#[instrument(skip(ctx))]
pub async fn crawl_comic(ctx: &CrawlContext, url: &str) -> Result<ComicOutcome, CrawlError> {
    let html = ctx.client().fetch_text(url).await?;
    let comic = ctx.parser().parse_comic(&html)?;
    info!(
        title = %comic.title,
        chapters = comic.chapters.len(),
        "comic page parsed"
    );
    download_comic(ctx, &comic).await
}
