//! planetary-fetch core library
//!
//! Downloads Planetary Data System (PDS) product files matching a partial,
//! optionally wildcarded, product identifier.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`pattern`] - Identifier pattern validation and glob matching
//! - [`catalog`] - Catalog trait and the ODE REST backend
//! - [`download`] - Streaming HTTP downloads and the bounded job engine
//! - [`orchestrator`] - The end-to-end fetch run and its report
//! - [`config`] - Immutable run configuration
//! - [`progress`] - Terminal progress bar
//! - [`metadata`] - Optional JSON dump of catalog records
//! - [`error`] - Run-level error taxonomy

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod config;
pub mod download;
pub mod error;
mod http;
pub mod metadata;
pub mod orchestrator;
pub mod pattern;
pub mod progress;
mod user_agent;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, OdeCatalog, Product, ProductFile, StaticCatalog};
pub use config::{LogLevel, OutputLayout, OverwritePolicy, RunConfig};
pub use download::{DownloadEngine, DownloadError, HttpClient};
pub use error::FetchError;
pub use http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, HttpTimeouts};
pub use orchestrator::{RunReport, run};
pub use pattern::{IdPattern, PatternError};
