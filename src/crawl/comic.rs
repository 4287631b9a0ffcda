//! Downloads a whole comic and archives it once every chapter is complete.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use super::chapter::{dir_name, download_chapter, plan_chapter_dirs};
use super::context::CrawlContext;
use super::error::CrawlError;
use crate::archive::archive_blocking;
use crate::comic::Comic;
use crate::download::{RunReport, Task};
use crate::progress::chapter_key;
use crate::sidecar::write_meta_blocking;

/// Cover image filename inside the comic directory.
pub const COVER_FILENAME: &str = "cover.jpg";

/// Result of one [`download_comic`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicOutcome {
    /// Directory the comic was written to.
    pub comic_dir: PathBuf,
    /// Chapters listed on the detail page.
    pub chapters: usize,
    /// Chapters skipped because they were already complete.
    pub skipped: usize,
    /// Outcome of the chapter downloads that were dispatched.
    pub report: RunReport,
    /// Archive written this run, if every chapter is complete.
    pub archive: Option<PathBuf>,
}

/// Downloads `comic` into `<download_dir>/<title>/`.
///
/// Set-up (directory, cover, `meta.json`) must succeed before any chapter is
/// attempted. Chapter failures are logged and left for the next run. When the
/// store records every chapter as complete, the comic directory is zipped to
/// `<archive_dir>/<title>.zip` and the comic is marked done.
///
/// # Errors
///
/// Returns [`CrawlError`] if set-up fails, the progress store fails, or the
/// archive cannot be written.
#[instrument(skip_all, fields(comic = %comic.title))]
pub async fn download_comic(ctx: &CrawlContext, comic: &Comic) -> Result<ComicOutcome, CrawlError> {
    let name = dir_name(&comic.title)?;
    let comic_dir = ctx.download_dir().join(&name);
    tokio::fs::create_dir_all(&comic_dir)
        .await
        .map_err(|e| CrawlError::create_dir(&comic_dir, e))?;

    ctx.client()
        .download_to_file(&comic.cover, &comic_dir, COVER_FILENAME)
        .await?;
    write_meta_blocking(comic_dir.clone(), comic.meta.clone()).await?;

    let mut tasks = Vec::new();
    let mut skipped = 0usize;
    let dirs = plan_chapter_dirs(&comic.chapters);
    for (chapter, dir) in comic.chapters.iter().zip(dirs) {
        let key = chapter_key(&comic.title, &chapter.title);
        if ctx.store().is_chapter_done(&comic.title, &key).await? {
            debug!(chapter = %chapter.title, "chapter already complete");
            skipped += 1;
            continue;
        }

        let task_ctx = ctx.clone();
        let title = comic.title.clone();
        let chapter = chapter.clone();
        let comic_dir = comic_dir.clone();
        tasks.push(Task::new(chapter.title.clone(), async move {
            let chapter_dir = comic_dir.join(dir?);
            download_chapter(&task_ctx, &title, &chapter, &chapter_dir)
                .await
                .map(|_| ())
        }));
    }

    info!(
        chapters = comic.chapters.len(),
        skipped,
        pending = tasks.len(),
        max_parallel = ctx.chapter_runner().max_parallel(),
        "dispatching chapter downloads"
    );
    let report = ctx.chapter_runner().run_all(tasks).await?;

    let done = ctx.store().count_chapters_done(&comic.title).await?;
    let archive = if done == comic.chapters.len() {
        if ctx.store().is_comic_done(&comic.title).await? {
            debug!("comic was archived before, refreshing archive");
        }
        let dest = ctx.archive_dir().join(format!("{name}.zip"));
        archive_blocking(comic_dir.clone(), dest.clone()).await?;
        ctx.store().mark_comic_done(&comic.title).await?;
        info!(archive = %dest.display(), "comic complete");
        Some(dest)
    } else {
        warn!(
            done,
            chapters = comic.chapters.len(),
            "comic incomplete, will resume on next run"
        );
        None
    };

    Ok(ComicOutcome {
        comic_dir,
        chapters: comic.chapters.len(),
        skipped,
        report,
        archive,
    })
}
