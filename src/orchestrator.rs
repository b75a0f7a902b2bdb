//! The fetch pipeline: pattern, catalog lookup, download jobs, report.
//!
//! [`run`] is the single entry point used by the CLI. It validates the whole
//! configuration before touching the network, resolves the pattern through a
//! [`Catalog`], turns every accepted product file into a [`DownloadJob`] and
//! hands the batch to the [`DownloadEngine`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, Product};
use crate::config::RunConfig;
use crate::download::{
    BatchReport, DownloadEngine, DownloadJob, HttpClient, JobOutcome, JobStatus, destination_for,
};
use crate::error::FetchError;
use crate::metadata;
use crate::pattern::IdPattern;
use crate::progress::Progress;

/// Result of one fetch run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of products the catalog matched.
    pub matched_products: usize,
    /// Per-job outcomes. Files the output layout could not place are listed
    /// after the transferred ones.
    pub batch: BatchReport,
}

impl RunReport {
    /// True when the catalog matched nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matched_products == 0
    }

    /// Number of files downloaded.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.batch.completed()
    }

    /// Number of files kept from a previous run.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.batch.skipped()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.batch.failed()
    }

    /// True when Ctrl-C stopped the run early.
    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.batch.interrupted
    }

    /// Failed jobs, in report order.
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.batch
            .outcomes
            .iter()
            .filter(|outcome| outcome.error().is_some())
    }
}

/// Runs one fetch: resolve `config.pattern` through `catalog` and download
/// every accepted file into `config.output_dir`.
///
/// Zero matches is an empty report, not an error. Individual transfer
/// failures are recorded in the report and never abort the run.
///
/// # Errors
///
/// - [`FetchError::InvalidPattern`], [`FetchError::InvalidWorkers`] and
///   [`FetchError::OutputDir`] before any network activity
/// - [`FetchError::Resolution`] when the catalog lookup fails
#[instrument(skip_all, fields(pattern = %config.pattern, output_dir = %config.output_dir.display()))]
pub async fn run(
    config: &RunConfig,
    catalog: &dyn Catalog,
    client: &HttpClient,
    interrupt: Arc<AtomicBool>,
) -> Result<RunReport, FetchError> {
    let pattern = IdPattern::parse(&config.pattern)?;
    let engine = DownloadEngine::new(config.max_workers, config.overwrite)?;

    prepare_output_dir(&config.output_dir).await?;

    info!(catalog = catalog.name(), pattern = %pattern, "querying catalog");
    let products = catalog.resolve(&pattern).await?;

    if products.is_empty() {
        info!(pattern = %pattern, "no matches");
        return Ok(RunReport::default());
    }
    info!(products = products.len(), "products matched");

    if config.save_metadata
        && let Err(e) = metadata::save_products(&config.output_dir, &products).await
    {
        warn!(error = %e, "could not save product metadata");
    }

    let (jobs, rejected) = build_jobs(config, &products);
    info!(files = jobs.len(), "files to download");

    let progress = Progress::new(jobs.len(), config.show_progress);
    let mut batch = engine.run_jobs(jobs, client, &progress, interrupt).await;
    progress.finish();
    batch.outcomes.extend(rejected);

    let report = RunReport {
        matched_products: products.len(),
        batch,
    };
    info!(
        completed = report.completed(),
        skipped = report.skipped(),
        failed = report.failed(),
        "Total number of downloaded files: {}",
        report.completed()
    );
    Ok(report)
}

/// Creates `dir` when absent and checks that files can be created in it.
async fn prepare_output_dir(dir: &Path) -> Result<(), FetchError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FetchError::output_dir(dir, e))?;

    // The file is removed again on drop.
    tempfile::Builder::new()
        .prefix(".planetary-fetch-")
        .tempfile_in(dir)
        .map(drop)
        .map_err(|e| FetchError::output_dir(dir, e))
}

/// Pairs every accepted file with its destination.
///
/// Returns the jobs to run plus already-failed outcomes for files the output
/// layout cannot place. When two files map to the same destination the first
/// one wins.
fn build_jobs(config: &RunConfig, products: &[Product]) -> (Vec<DownloadJob>, Vec<JobOutcome>) {
    let mut jobs = Vec::new();
    let mut rejected = Vec::new();
    let mut seen = HashSet::new();

    for product in products {
        for file in &product.files {
            if !config.accepts_file(&file.name) {
                debug!(file = %file.name, "file type not requested");
                continue;
            }

            match destination_for(&config.output_dir, config.layout, &file.name) {
                Ok(destination) => {
                    if !seen.insert(destination.clone()) {
                        debug!(path = %destination.display(), "duplicate destination, keeping first");
                        continue;
                    }
                    jobs.push(DownloadJob::new(&product.pds_id, file.clone(), destination));
                }
                Err(e) => {
                    warn!(pds_id = %product.pds_id, error = %e, "cannot place file");
                    rejected.push(JobOutcome {
                        job: DownloadJob::new(&product.pds_id, file.clone(), config.output_dir.clone()),
                        status: JobStatus::Failed(e),
                    });
                }
            }
        }
    }

    (jobs, rejected)
}
