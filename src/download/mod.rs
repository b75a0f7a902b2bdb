//! Streaming downloads of product files to disk.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for multi-gigabyte images)
//! - Writes go to `<name>.part` and are renamed only after size verification
//! - Bounded worker pool; a failing job never blocks its siblings
//! - Flat or CRISM volume output layout
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use planetary_fetch::HttpTimeouts;
//! use planetary_fetch::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(HttpTimeouts::default())?;
//! let result = client
//!     .download_to_path("https://pds.example/a.lbl", Path::new("./data/a.lbl"), None)
//!     .await?;
//! println!("Downloaded: {}", result.path.display());
//! # Ok(())
//! # }
//! ```

mod client;
mod engine;
mod error;
mod layout;

pub use client::{DownloadFileResult, HttpClient};
pub use engine::{BatchReport, DownloadEngine, DownloadJob, EngineError, JobOutcome, JobStatus};
pub use error::DownloadError;
pub use layout::{destination_for, safe_file_name};

// No module-local Result alias: signatures spell out `Result<T, DownloadError>`.
