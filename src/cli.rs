//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use planetary_fetch::config::{DEFAULT_EXTENSIONS, DEFAULT_MAX_WORKERS};
use planetary_fetch::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_READ_TIMEOUT_SECS, LogLevel, OutputLayout,
};

/// Environment variable overriding the catalog endpoint.
pub const CATALOG_URL_ENV: &str = "PLANETARY_FETCH_CATALOG_URL";

/// Download PDS planetary surface data files by (partial) product ID.
///
/// The ID pattern is looked up in the PDS Orbital Data Explorer and every
/// matching label and image file is downloaded into the output directory.
#[derive(Parser, Debug)]
#[command(name = "planetary-fetch")]
#[command(author, version, about, disable_version_flag = true)]
pub struct Args {
    /// PDS product ID or pattern, e.g. 'HRL0000CA5C*' (`*` and `?` wildcards)
    #[arg(long = "ids", value_name = "PATTERN")]
    pub ids: String,

    /// Directory receiving the downloaded files (created when absent)
    #[arg(long = "output_dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Log level: TRACE, DEBUG, INFO, WARNING, ERROR or CRITICAL
    #[arg(long, value_name = "SEVERITY", default_value_t = LogLevel::Info)]
    pub level: LogLevel,

    /// Do not draw the progress bar
    #[arg(long = "disable_tqdm")]
    pub disable_tqdm: bool,

    /// Maximum concurrent downloads (1-100)
    #[arg(
        long = "max_workers",
        value_name = "N",
        default_value_t = DEFAULT_MAX_WORKERS as u8,
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub max_workers: u8,

    /// Keep files that already exist in the output directory
    #[arg(long)]
    pub skip_existing: bool,

    /// Directory layout of downloaded files
    #[arg(long, value_enum, default_value_t = LayoutArg::Flat)]
    pub layout: LayoutArg,

    /// File extension to download (repeatable)
    #[arg(long = "extension", value_name = "EXT", default_values = DEFAULT_EXTENSIONS)]
    pub extensions: Vec<String>,

    /// Write the catalog records of matched products to products.json
    #[arg(long)]
    pub save_metadata: bool,

    /// Catalog REST endpoint
    #[arg(long, value_name = "URL", env = CATALOG_URL_ENV)]
    pub catalog_url: Option<String>,

    /// HTTP connect timeout in seconds (1-300)
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=300)
    )]
    pub connect_timeout: u64,

    /// Seconds without receiving data before a request fails (1-86400)
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_READ_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..=86_400)
    )]
    pub read_timeout: u64,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    pub version: Option<bool>,
}

/// `--layout` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// Every file directly in the output directory
    Flat,
    /// CRISM volume tree (FRT/HRL/HRS only)
    Volume,
}

impl From<LayoutArg> for OutputLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Flat => Self::Flat,
            LayoutArg::Volume => Self::Volume,
        }
    }
}
