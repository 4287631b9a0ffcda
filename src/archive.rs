//! Packs a finished comic directory into a single deflate-compressed zip.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors raised while building an archive.
///
/// A failure part-way through leaves a truncated archive at the destination.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Reading a source entry or writing the archive failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Directory traversal failed.
    #[error("failed to walk {root}: {source}")]
    Walk {
        /// Directory being archived.
        root: PathBuf,
        /// Underlying error.
        #[source]
        source: walkdir::Error,
    },

    /// The zip writer rejected an entry.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking archive task did not complete.
    #[error("archive task aborted: {0}")]
    Aborted(String),
}

impl ArchiveError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Zips `source_dir` recursively into `dest_path`.
///
/// Entries are stored relative to `source_dir` with `/` separators;
/// directories become `name/` entries and files are deflated. The parent of
/// `dest_path` is created if missing. Returns the number of files written.
///
/// # Errors
///
/// Returns [`ArchiveError`] on the first entry that cannot be read or written.
#[instrument(fields(source = %source_dir.display(), dest = %dest_path.display()))]
pub fn archive(source_dir: &Path, dest_path: &Path) -> Result<usize, ArchiveError> {
    if let Some(parent) = dest_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
    }

    let out = File::create(dest_path).map_err(|e| ArchiveError::io(dest_path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut files = 0usize;

    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            root: source_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(source_dir) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name.as_str(), options)?;
            let mut file = File::open(path).map_err(|e| ArchiveError::io(path, e))?;
            io::copy(&mut file, &mut zip).map_err(|e| ArchiveError::io(path, e))?;
            files += 1;
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
        }
    }

    let mut writer = zip.finish()?;
    writer.flush().map_err(|e| ArchiveError::io(dest_path, e))?;

    info!(files, "archive written");
    Ok(files)
}

/// Runs [`archive`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the archive error, or [`ArchiveError::Aborted`] if the blocking
/// task panicked or was cancelled.
pub async fn archive_blocking(source_dir: PathBuf, dest_path: PathBuf) -> Result<usize, ArchiveError> {
    tokio::task::spawn_blocking(move || archive(&source_dir, &dest_path))
        .await
        .map_err(|e| ArchiveError::Aborted(e.to_string()))?
}
