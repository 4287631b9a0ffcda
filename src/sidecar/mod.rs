//! `meta.json` sidecar written into each comic directory.
//!
//! The file is rewritten on every run so it always reflects the latest parse.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::comic::Meta;

/// Sidecar filename inside the comic directory.
pub const META_FILENAME: &str = "meta.json";

/// Errors produced by sidecar generation.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// I/O error writing the sidecar file to disk.
    #[error("I/O error writing sidecar {path}: {source}")]
    Io {
        /// Sidecar path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// JSON serialization error (shouldn't occur for well-formed structs).
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The blocking write task panicked or was cancelled.
    #[error("sidecar task aborted: {0}")]
    Aborted(String),
}

/// Writes `meta` as pretty JSON to `<comic_dir>/meta.json`, replacing any
/// previous file.
///
/// # Errors
///
/// Returns [`SidecarError`] on I/O or serialization failure.
#[instrument(skip(meta), fields(dir = %comic_dir.display()))]
pub fn write_meta(comic_dir: &Path, meta: &Meta) -> Result<PathBuf, SidecarError> {
    let path = comic_dir.join(META_FILENAME);
    let io_error = |source| SidecarError::Io {
        path: path.clone(),
        source,
    };

    let file = fs::File::create(&path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let write_result = serde_json::to_writer_pretty(&mut writer, meta);
    if let Err(err) = write_result {
        // Best-effort cleanup so a half-written sidecar is not left behind.
        drop(writer);
        let _ = fs::remove_file(&path);
        return Err(err.into());
    }
    writer.flush().map_err(io_error)?;

    debug!(path = %path.display(), "sidecar written");
    Ok(path)
}

/// [`write_meta`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the write error, or [`SidecarError::Aborted`] if the blocking
/// task panicked or was cancelled.
pub async fn write_meta_blocking(comic_dir: PathBuf, meta: Meta) -> Result<PathBuf, SidecarError> {
    tokio::task::spawn_blocking(move || write_meta(&comic_dir, &meta))
        .await
        .map_err(|e| SidecarError::Aborted(e.to_string()))?
}
