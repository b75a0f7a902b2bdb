//! Download engine for concurrent product file downloads.
//!
//! The engine runs a fixed list of [`DownloadJob`]s through a
//! semaphore-bounded pool of Tokio tasks. Each job succeeds, is skipped, or
//! fails on its own; a failure never stops sibling jobs. With a pool size of
//! one the jobs run strictly one after another.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use planetary_fetch::HttpTimeouts;
//! use planetary_fetch::config::OverwritePolicy;
//! use planetary_fetch::download::{DownloadEngine, HttpClient};
//! use planetary_fetch::progress::Progress;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(3, OverwritePolicy::Overwrite)?;
//! let client = HttpClient::new(HttpTimeouts::default())?;
//! let report = engine
//!     .run_jobs(Vec::new(), &client, &Progress::hidden(), Arc::new(AtomicBool::new(false)))
//!     .await;
//! println!("Completed: {}, Failed: {}", report.completed(), report.failed());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tracing::{Instrument, Span, debug, info, instrument, warn};

use super::{DownloadError, HttpClient};
use crate::catalog::ProductFile;
use crate::config::{MAX_WORKERS, MIN_WORKERS, OverwritePolicy};
use crate::progress::Progress;

/// Error type for download engine construction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },
}

/// One product file paired with its local destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Identifier of the product the file belongs to.
    pub pds_id: String,
    /// The remote file.
    pub file: ProductFile,
    /// Where the file is written.
    pub destination: PathBuf,
}

impl DownloadJob {
    /// Creates a job.
    #[must_use]
    pub fn new(pds_id: impl Into<String>, file: ProductFile, destination: PathBuf) -> Self {
        Self {
            pds_id: pds_id.into(),
            file,
            destination,
        }
    }
}

/// Terminal state of a job.
#[derive(Debug)]
pub enum JobStatus {
    /// The file was downloaded and verified.
    Completed {
        /// Bytes written.
        bytes: u64,
    },
    /// The destination already existed and the overwrite policy kept it.
    Skipped,
    /// The transfer failed.
    Failed(DownloadError),
}

/// A job together with what happened to it.
#[derive(Debug)]
pub struct JobOutcome {
    /// The job.
    pub job: DownloadJob,
    /// Its terminal state.
    pub status: JobStatus,
}

impl JobOutcome {
    /// Returns the error when the job failed.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match &self.status {
            JobStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Outcomes of one batch, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per job that was started or rejected.
    pub outcomes: Vec<JobOutcome>,
    /// True when scheduling stopped early on interrupt.
    pub interrupted: bool,
}

impl BatchReport {
    /// Number of completed downloads.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Completed { .. }))
    }

    /// Number of skipped jobs.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Skipped))
    }

    /// Number of failed jobs.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, JobStatus::Failed(_)))
    }

    /// Total bytes written by completed jobs.
    #[must_use]
    pub fn bytes_downloaded(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|outcome| match outcome.status {
                JobStatus::Completed { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&JobStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

/// Download engine for concurrent file downloads.
///
/// # Concurrency Model
///
/// - Each download runs in its own Tokio task
/// - A semaphore permit is acquired before starting each download
/// - Permits are released automatically when downloads complete (RAII)
/// - The interrupt flag is checked before every new job is scheduled
#[derive(Debug)]
pub struct DownloadEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    overwrite: OverwritePolicy,
}

impl DownloadEngine {
    /// Creates a new engine with `concurrency` workers.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    ///
    /// # Example
    ///
    /// ```
    /// use planetary_fetch::config::OverwritePolicy;
    /// use planetary_fetch::download::DownloadEngine;
    ///
    /// let engine = DownloadEngine::new(3, OverwritePolicy::Overwrite).unwrap();
    /// assert_eq!(engine.concurrency(), 3);
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize, overwrite: OverwritePolicy) -> Result<Self, EngineError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, ?overwrite, "creating download engine");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            overwrite,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every job, returning outcomes in job order.
    ///
    /// Individual download failures do NOT cause this method to fail; they
    /// are logged and recorded in the report. When `interrupt` becomes true
    /// no further jobs are started, in-flight jobs run to completion and the
    /// report is marked interrupted.
    #[instrument(skip_all, fields(jobs = jobs.len()))]
    pub async fn run_jobs(
        &self,
        jobs: Vec<DownloadJob>,
        client: &HttpClient,
        progress: &Progress,
        interrupt: Arc<AtomicBool>,
    ) -> BatchReport {
        let mut handles = Vec::with_capacity(jobs.len());
        let mut interrupted = false;

        info!(workers = self.concurrency, "starting downloads");

        for job in jobs {
            if interrupt.load(Ordering::SeqCst) {
                interrupted = true;
                break;
            }

            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                warn!("download pool closed unexpectedly");
                interrupted = true;
                break;
            };

            // A slot may free up long after the interrupt arrived.
            if interrupt.load(Ordering::SeqCst) {
                interrupted = true;
                break;
            }

            let client = client.clone();
            let progress = progress.clone();
            let overwrite = self.overwrite;
            let task_job = job.clone();

            let handle = tokio::spawn(
                async move {
                    let _permit = permit;
                    let status = run_one(&client, &task_job, overwrite).await;
                    progress.inc();
                    JobOutcome {
                        job: task_job,
                        status,
                    }
                }
                .instrument(Span::current()),
            );
            handles.push((job, handle));
        }

        if interrupted {
            warn!(
                started = handles.len(),
                "interrupted, waiting for in-flight downloads"
            );
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (job, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(url = %job.file.url, error = %e, "download task panicked");
                    let url = job.file.url.clone();
                    outcomes.push(JobOutcome {
                        job,
                        status: JobStatus::Failed(DownloadError::Aborted { url }),
                    });
                }
            }
        }

        // Ctrl-C during the last jobs still counts even though nothing was left to skip.
        interrupted = interrupted || interrupt.load(Ordering::SeqCst);

        let report = BatchReport {
            outcomes,
            interrupted,
        };
        info!(
            completed = report.completed(),
            skipped = report.skipped(),
            failed = report.failed(),
            interrupted,
            "downloads finished"
        );
        report
    }
}

async fn run_one(client: &HttpClient, job: &DownloadJob, overwrite: OverwritePolicy) -> JobStatus {
    if overwrite == OverwritePolicy::SkipExisting
        && existing_matches(&job.destination, job.file.size).await
    {
        info!(
            pds_id = %job.pds_id,
            path = %job.destination.display(),
            "already present, skipping"
        );
        return JobStatus::Skipped;
    }

    match client
        .download_to_path(&job.file.url, &job.destination, job.file.size)
        .await
    {
        Ok(result) => {
            info!(
                pds_id = %job.pds_id,
                path = %result.path.display(),
                bytes = result.bytes_downloaded,
                "downloaded"
            );
            JobStatus::Completed {
                bytes: result.bytes_downloaded,
            }
        }
        Err(e) => {
            warn!(
                pds_id = %job.pds_id,
                url = %job.file.url,
                error = %e,
                "download failed"
            );
            JobStatus::Failed(e)
        }
    }
}

/// True when `path` is a file and, if a size is known, has that size.
async fn existing_matches(path: &Path, expected_size: Option<u64>) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => expected_size.is_none_or(|size| size == meta.len()),
        _ => false,
    }
}
