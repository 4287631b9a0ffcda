//! Downloads the images of one chapter, skipping those already recorded.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::context::CrawlContext;
use super::error::CrawlError;
use crate::comic::Chapter;
use crate::download::{RunReport, Task, image_filename, sanitize_filename};
use crate::progress::chapter_key;

/// One image to fetch: where it comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub dir: PathBuf,
    pub filename: String,
    /// Position of the image in the chapter; its progress bit.
    pub index: usize,
}

/// Result of one [`download_chapter`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterOutcome {
    /// Images listed on the chapter page this run.
    pub images: usize,
    /// Images skipped because they were already recorded.
    pub skipped: usize,
    /// Outcome of the image downloads that were dispatched.
    pub report: RunReport,
    /// Whether the chapter is now recorded complete.
    pub complete: bool,
}

/// Directory name used for a chapter or comic title.
///
/// # Errors
///
/// Returns [`CrawlError::UnusableTitle`] if nothing is left after
/// sanitizing.
pub fn dir_name(title: &str) -> Result<String, CrawlError> {
    let name = sanitize_filename(title);
    if name.is_empty() {
        return Err(CrawlError::UnusableTitle(title.to_string()));
    }
    Ok(name)
}

/// Directory names for every chapter of a comic, in chapter order.
///
/// Titles that sanitize to the same name (`a/b` and `a_b`) would share a
/// directory, so later ones get a ` (n)` suffix. A title with nothing left
/// after sanitizing yields [`CrawlError::UnusableTitle`] for that chapter
/// only.
#[must_use]
pub fn plan_chapter_dirs(chapters: &[Chapter]) -> Vec<Result<String, CrawlError>> {
    let mut used = HashSet::with_capacity(chapters.len());
    chapters
        .iter()
        .map(|chapter| -> Result<String, CrawlError> {
            let base = dir_name(&chapter.title)?;
            let mut name = base.clone();
            let mut n = 2usize;
            while !used.insert(name.clone()) {
                name = format!("{base} ({n})");
                n += 1;
            }
            Ok(name)
        })
        .collect()
}

/// Builds one target per image URL.
///
/// Filenames come from the URL; a name that is already taken is prefixed
/// with the image index until it is free, so every target writes a
/// distinct file.
#[must_use]
pub fn plan_targets(urls: &[String], dir: &Path) -> Vec<DownloadTarget> {
    let mut used = HashSet::with_capacity(urls.len());
    urls.iter()
        .enumerate()
        .map(|(index, url)| {
            let mut filename = image_filename(url, index);
            while !used.insert(filename.clone()) {
                filename = format!("{index}_{filename}");
            }
            DownloadTarget {
                url: url.clone(),
                dir: dir.to_path_buf(),
                filename,
                index,
            }
        })
        .collect()
}

/// Downloads every not-yet-recorded image of `chapter` into `chapter_dir`.
///
/// Each image is recorded in the progress store as soon as its file is
/// written. Image failures are logged and left for the next run. The chapter
/// is marked complete only when the recorded count equals the number of
/// images listed on the page this run.
///
/// # Errors
///
/// Fails the chapter if `chapter_dir` cannot be created, its page cannot be
/// fetched or parsed, or the progress store fails.
#[instrument(skip_all, fields(comic = %comic_title, chapter = %chapter.title))]
pub async fn download_chapter(
    ctx: &CrawlContext,
    comic_title: &str,
    chapter: &Chapter,
    chapter_dir: &Path,
) -> Result<ChapterOutcome, CrawlError> {
    tokio::fs::create_dir_all(chapter_dir)
        .await
        .map_err(|e| CrawlError::create_dir(chapter_dir, e))?;

    let html = ctx.client().fetch_text(&chapter.url).await?;
    let urls = ctx.parser().parse_chapter(&html)?;
    if urls.is_empty() {
        warn!(url = %chapter.url, "chapter page lists no images");
    }

    let key = chapter_key(comic_title, &chapter.title);
    let mut tasks = Vec::new();
    let mut skipped = 0usize;

    for target in plan_targets(&urls, chapter_dir) {
        if ctx.store().is_image_done(&key, target.index).await? {
            skipped += 1;
            continue;
        }

        let task_ctx = ctx.clone();
        let task_key = key.clone();
        let label = format!("{}#{}", chapter.title, target.index);
        tasks.push(Task::new(label, async move {
            task_ctx
                .client()
                .download_to_file(&target.url, &target.dir, &target.filename)
                .await?;
            task_ctx
                .store()
                .mark_image_done(&task_key, target.index)
                .await?;
            Ok::<(), CrawlError>(())
        }));
    }

    debug!(
        images = urls.len(),
        skipped,
        pending = tasks.len(),
        max_parallel = ctx.image_runner().max_parallel(),
        "dispatching image downloads"
    );
    let report = ctx.image_runner().run_all(tasks).await?;

    let done = ctx.store().count_done(&key).await?;
    let complete = done == urls.len();
    if complete {
        ctx.store().mark_chapter_done(comic_title, &key).await?;
        info!(images = urls.len(), "chapter complete");
    } else {
        warn!(
            done,
            images = urls.len(),
            failed = report.failed() + report.panicked(),
            "chapter incomplete, will resume on next run"
        );
    }

    Ok(ChapterOutcome {
        images: urls.len(),
        skipped,
        report,
        complete,
    })
}
