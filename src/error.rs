//! Run-level error taxonomy.
//!
//! A [`FetchError`] aborts the whole run. Configuration errors are raised
//! before any network activity; resolution errors mean the catalog could not
//! produce a product list. Per-file transfer failures are not here: they are
//! [`DownloadError`](crate::download::DownloadError)s recorded in the report.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::download::EngineError;
use crate::pattern::PatternError;

/// Errors that abort a fetch run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The identifier pattern was rejected.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    /// The output directory cannot be created or is not a directory.
    #[error("cannot use output directory {path}: {source}\n  Suggestion: check the path and its permissions")]
    OutputDir {
        /// The configured output directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The worker count is out of range.
    #[error(transparent)]
    InvalidWorkers(#[from] EngineError),

    /// The catalog lookup failed.
    #[error("catalog lookup failed: {0}")]
    Resolution(#[from] CatalogError),
}

impl FetchError {
    /// Creates an output directory error.
    pub fn output_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// True for errors detected before any network activity.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Resolution(_))
    }
}
