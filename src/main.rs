//! CLI entry point for the comic crawler.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use comic_crawler::{
    CrawlContext, CrawlError, CrawlSettings, Database, HttpClient, HttpClientOptions,
    MemoryProgressStore, PageParser, ProgressStore, RetryPolicy, SitePageParser,
    SqliteProgressStore, crawl_comic, resolve_user_agent,
};
use tracing::{debug, info, warn};

mod app_config;
mod cli;

use app_config::{load_file_config, resolve_run_config};
use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let loaded = load_file_config(args.config.as_deref())?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "config file loaded");
    }
    let config = resolve_run_config(&args, loaded.config)?;
    debug!(?config, "run configuration resolved");

    info!(comic = %config.comic_url, "comic crawler starting");

    let client = HttpClient::with_options(HttpClientOptions {
        user_agent: resolve_user_agent(config.user_agent.as_deref()),
        http1_only: config.http1_only,
        connect_timeout_secs: config.connect_timeout_secs,
        read_timeout_secs: config.read_timeout_secs,
        retry_policy: RetryPolicy::new(config.max_attempts, config.backoff_base),
    })
    .context("Failed to build HTTP client")?;

    let store: Arc<dyn ProgressStore> = if config.persist {
        let db = Database::new(&config.database).await.with_context(|| {
            format!("Failed to open progress database {}", config.database.display())
        })?;
        Arc::new(SqliteProgressStore::new(db))
    } else {
        warn!("progress is kept in memory only; the next run starts from scratch");
        Arc::new(MemoryProgressStore::new())
    };

    let parser: Arc<dyn PageParser> = Arc::new(SitePageParser::new(&config.base_url)?);

    let ctx = CrawlContext::new(
        client,
        store,
        parser,
        CrawlSettings {
            download_dir: config.download_dir.clone(),
            archive_dir: config.archive_dir.clone(),
            chapter_concurrency: config.chapter_concurrency,
            image_concurrency: config.image_concurrency,
        },
    )?;

    let outcome = match crawl_comic(&ctx, &config.comic_url).await {
        Ok(outcome) => outcome,
        Err(CrawlError::Progress(err)) if err.is_busy_or_locked() => {
            return Err(err).with_context(|| {
                format!(
                    "Progress database {} is locked; is another crawl using it?",
                    config.database.display()
                )
            });
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Crawl of {} failed", config.comic_url));
        }
    };

    if !outcome.report.all_succeeded() {
        warn!(
            failed = outcome.report.failed(),
            panicked = outcome.report.panicked(),
            "some chapter downloads failed"
        );
    }

    match &outcome.archive {
        Some(archive) => info!(
            dir = %outcome.comic_dir.display(),
            archive = %archive.display(),
            chapters = outcome.chapters,
            "crawl complete"
        ),
        None => info!(
            dir = %outcome.comic_dir.display(),
            chapters = outcome.chapters,
            skipped = outcome.skipped,
            failed = outcome.report.failed() + outcome.report.panicked(),
            "crawl finished with incomplete chapters; run again to resume"
        ),
    }

    Ok(())
}
