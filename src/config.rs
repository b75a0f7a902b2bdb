//! Run configuration for a single fetch invocation.
//!
//! A [`RunConfig`] is built once (by the CLI or an embedding program) and is
//! never mutated while the run is in progress.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of concurrent download workers.
pub const DEFAULT_MAX_WORKERS: usize = 3;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 100;

/// File types downloaded when no extension filter is configured.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["lbl", "img"];

/// Log severity accepted by `--level`.
///
/// The names mirror the classic severity ladder. `tracing` has no level above
/// `ERROR`, so `CRITICAL` filters the same as `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// All levels, in increasing severity.
    pub const ALL: [Self; 6] = [
        Self::Trace,
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Returns the upper-case name used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Returns the `tracing_subscriber::EnvFilter` directive for this level.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown log level '{value}' (expected one of TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL)"
                )
            })
    }
}

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Download again and replace the existing file.
    #[default]
    Overwrite,
    /// Keep the existing file and mark the job skipped.
    SkipExisting,
}

/// Directory layout of downloaded files under the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLayout {
    /// Every file directly under the output directory.
    #[default]
    Flat,
    /// CRISM volume tree: `<TYPE><sub>/<TYPE><subsub>/{DATA|DDR}`.
    Volume,
}

/// Immutable configuration for one fetch run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Raw identifier pattern, validated by the orchestrator.
    pub pattern: String,
    /// Directory receiving the downloaded files (created when absent).
    pub output_dir: PathBuf,
    /// Log severity for the run.
    pub log_level: LogLevel,
    /// Whether a progress bar is drawn.
    pub show_progress: bool,
    /// Maximum concurrent downloads.
    pub max_workers: usize,
    /// Behaviour for existing destination files.
    pub overwrite: OverwritePolicy,
    /// Output directory layout.
    pub layout: OutputLayout,
    /// Lower-case file extensions (without dot) to download.
    pub extensions: Vec<String>,
    /// Write the matched products' catalog records to `products.json`.
    pub save_metadata: bool,
}

impl RunConfig {
    /// Creates a configuration with defaults for everything but the pattern
    /// and output directory.
    #[must_use]
    pub fn new(pattern: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            output_dir: output_dir.into(),
            log_level: LogLevel::default(),
            show_progress: true,
            max_workers: DEFAULT_MAX_WORKERS,
            overwrite: OverwritePolicy::default(),
            layout: OutputLayout::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            save_metadata: false,
        }
    }

    /// Returns true when a file name passes the extension filter.
    ///
    /// An empty filter accepts every file.
    #[must_use]
    pub fn accepts_file(&self, file_name: &str) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let lower = file_name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            lower
                .rsplit_once('.')
                .is_some_and(|(_, file_ext)| file_ext == ext)
        })
    }
}
