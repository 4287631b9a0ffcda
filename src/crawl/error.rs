//! Error type for chapter and comic downloads.

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::comic::ParseError;
use crate::download::{FetchError, RunnerError};
use crate::progress::ProgressError;
use crate::sidecar::SidecarError;

/// Failure of one crawl unit (image, chapter or comic).
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A page or image could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fetched page did not have the expected structure.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The progress store failed.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// A directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata sidecar could not be written.
    #[error(transparent)]
    Sidecar(#[from] SidecarError),

    /// Archiving the comic directory failed.
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),

    /// The task runner could not dispatch work.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// A title reduces to nothing once unsafe characters are removed.
    #[error("title '{0}' cannot be used as a directory name")]
    UnusableTitle(String),
}

impl CrawlError {
    /// Creates a `CreateDir` error.
    #[must_use]
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_is_transparent() {
        let err = CrawlError::from(FetchError::http_status("https://x/1.jpg", 503));
        assert_eq!(
            err.to_string(),
            FetchError::http_status("https://x/1.jpg", 503).to_string()
        );
    }

    #[test]
    fn test_unusable_title_message() {
        let err = CrawlError::UnusableTitle("..".into());
        assert!(err.to_string().contains("'..'"));
    }
}
