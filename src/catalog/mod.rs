//! Product catalogs: turning an identifier pattern into product references.
//!
//! # Architecture
//!
//! - [`Catalog`] - Async trait implemented by every catalog backend
//! - [`Product`] / [`ProductFile`] - Read-only product references
//! - [`OdeCatalog`] - PDS Orbital Data Explorer REST backend (default)
//! - [`StaticCatalog`] - In-memory backend over a fixed product list
//!
//! # Example
//!
//! ```no_run
//! use planetary_fetch::catalog::{Catalog, OdeCatalog};
//! use planetary_fetch::{HttpTimeouts, IdPattern};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = OdeCatalog::new(HttpTimeouts::default())?;
//! let pattern = IdPattern::parse("HRL0000CA5C*")?;
//! for product in catalog.resolve(&pattern).await? {
//!     println!("{} ({} files)", product.pds_id, product.files.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod ode;

pub use error::CatalogError;
pub use ode::{DEFAULT_ODE_ENDPOINT, OdeCatalog};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::pattern::IdPattern;

/// A single downloadable file belonging to a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFile {
    /// File name used as the local identifier (no path separators).
    pub name: String,
    /// Absolute download URL.
    pub url: String,
    /// Exact size in bytes, when the catalog reports one.
    pub size: Option<u64>,
}

impl ProductFile {
    /// Creates a file reference without a known size.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            size: None,
        }
    }

    /// Sets the catalog-reported size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// A catalog entry matched by an identifier pattern.
#[derive(Debug, Clone)]
pub struct Product {
    /// The PDS product identifier.
    pub pds_id: String,
    /// Downloadable files, in catalog order.
    pub files: Vec<ProductFile>,
    /// The raw catalog record, kept for the metadata dump.
    pub metadata: Value,
}

impl Product {
    /// Creates a product with an empty metadata record.
    #[must_use]
    pub fn new(pds_id: impl Into<String>, files: Vec<ProductFile>) -> Self {
        Self {
            pds_id: pds_id.into(),
            files,
            metadata: Value::Null,
        }
    }

    /// Attaches the raw catalog record.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Lookup-by-pattern capability of a remote (or local) product catalog.
///
/// This trait uses `async_trait` so the orchestrator can hold a
/// `&dyn Catalog` and tests can swap in [`StaticCatalog`].
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Returns the catalog name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns the products matching `pattern`, in catalog order.
    ///
    /// Zero matches is `Ok(vec![])`, not an error.
    async fn resolve(&self, pattern: &IdPattern) -> Result<Vec<Product>, CatalogError>;
}

/// Catalog over a fixed list of products.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    products: Vec<Product>,
}

impl StaticCatalog {
    /// Creates a catalog serving `products`.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve(&self, pattern: &IdPattern) -> Result<Vec<Product>, CatalogError> {
        let matched: Vec<Product> = self
            .products
            .iter()
            .filter(|product| pattern.matches(&product.pds_id))
            .cloned()
            .collect();
        debug!(pattern = %pattern, matched = matched.len(), "static catalog lookup");
        Ok(matched)
    }
}
