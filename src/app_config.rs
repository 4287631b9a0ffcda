//! Configuration loading: built-in defaults, then the TOML file, then CLI flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use comic_crawler::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_BASE, DEFAULT_CONCURRENCY, DEFAULT_MAX_ATTEMPTS,
    READ_TIMEOUT_SECS,
};
use serde::Deserialize;
use url::Url;

use crate::cli::Args;

/// Site the crawler targets unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "https://www.mxs13.cc";

const DEFAULT_DATABASE: &str = "comic-crawler.db";
const DEFAULT_DOWNLOAD_DIR: &str = "comics";
const DEFAULT_ARCHIVE_DIR: &str = "archives";

/// TOML-backed file configuration. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Site root that relative links are resolved against.
    pub base_url: Option<String>,
    /// Comic to crawl: a path under `base_url` or an absolute URL.
    pub comic: Option<String>,
    /// Progress database file.
    pub database: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
    /// Parallel chapters per comic (1..=100).
    pub chapter_concurrency: Option<usize>,
    /// Parallel images per chapter (1..=100).
    pub image_concurrency: Option<usize>,
    /// Attempts per fetch, initial one included (1..=10).
    pub max_attempts: Option<u32>,
    /// Backoff base in milliseconds (0..=60000).
    pub backoff_base_ms: Option<u64>,
    /// Disable HTTP/2.
    pub http1_only: Option<bool>,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        validate_concurrency("chapter_concurrency", self.chapter_concurrency)?;
        validate_concurrency("image_concurrency", self.image_concurrency)?;

        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            bail!("Invalid config value for `max_attempts`: {max_attempts}. Expected range: 1..=10");
        }

        if let Some(backoff) = self.backoff_base_ms
            && backoff > 60_000
        {
            bail!("Invalid config value for `backoff_base_ms`: {backoff}. Expected range: 0..=60000");
        }

        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;

        if let Some(base_url) = &self.base_url {
            Url::parse(base_url)
                .with_context(|| format!("Invalid config value for `base_url`: {base_url}"))?;
        }

        Ok(())
    }
}

fn validate_concurrency(field: &str, value: Option<usize>) -> Result<()> {
    if let Some(value) = value
        && !(1..=100).contains(&value)
    {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=100");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    if let Some(value) = value
        && !(1..=3600).contains(&value)
    {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Config file that was read, if any.
pub struct LoadedConfig {
    /// Path that was consulted.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/comic-crawler/config.toml`
/// 2. `$HOME/.config/comic-crawler/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("comic-crawler")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("comic-crawler")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is skipped when absent.
pub fn load_file_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = read_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(read_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config_str(&raw).with_context(|| format!("Invalid config file {}", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub base_url: String,
    /// Absolute URL of the comic detail page.
    pub comic_url: String,
    pub database: PathBuf,
    pub persist: bool,
    pub download_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub chapter_concurrency: usize,
    pub image_concurrency: usize,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub http1_only: bool,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

/// Layers CLI flags over the file config over built-in defaults.
pub fn resolve_run_config(args: &Args, file: Option<FileConfig>) -> Result<RunConfig> {
    let file = file.unwrap_or_default();

    let base_url = args
        .base_url
        .clone()
        .or(file.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base = Url::parse(&base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;

    let Some(comic) = args.comic.clone().or(file.comic) else {
        bail!("No comic given. Pass it as an argument (e.g. `/book/499`) or set `comic` in the config file");
    };
    let comic_url = base
        .join(&comic)
        .with_context(|| format!("Invalid comic path or URL: {comic}"))?
        .to_string();

    Ok(RunConfig {
        base_url,
        comic_url,
        database: args
            .database
            .clone()
            .or(file.database)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
        persist: !args.no_persist,
        download_dir: args
            .download_dir
            .clone()
            .or(file.download_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
        archive_dir: args
            .archive_dir
            .clone()
            .or(file.archive_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_DIR)),
        chapter_concurrency: file.chapter_concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        image_concurrency: file.image_concurrency.unwrap_or(DEFAULT_CONCURRENCY),
        max_attempts: file.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        backoff_base: file
            .backoff_base_ms
            .map_or(DEFAULT_BACKOFF_BASE, Duration::from_millis),
        http1_only: file.http1_only.unwrap_or(true),
        user_agent: file.user_agent,
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    })
}
