//! Catalog metadata dump for matched products.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::catalog::Product;

/// File written under the output directory by `--save-metadata`.
pub const METADATA_FILE_NAME: &str = "products.json";

/// Writes the catalog records of `products` to `<output_dir>/products.json`
/// as a pretty-printed JSON array, replacing any previous dump.
///
/// # Errors
///
/// Returns an IO error when the file cannot be written.
pub async fn save_products(output_dir: &Path, products: &[Product]) -> std::io::Result<PathBuf> {
    let records: Vec<&serde_json::Value> = products.iter().map(|p| &p.metadata).collect();
    let json = serde_json::to_vec_pretty(&records).map_err(std::io::Error::other)?;

    let path = output_dir.join(METADATA_FILE_NAME);
    tokio::fs::write(&path, json).await?;
    info!(path = %path.display(), products = products.len(), "saved product metadata");
    Ok(path)
}
