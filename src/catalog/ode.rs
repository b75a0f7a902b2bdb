//! PDS Orbital Data Explorer (ODE) REST catalog.
//!
//! The [`OdeCatalog`] sends one product query per run:
//!
//! ```text
//! GET <endpoint>?query=product&results=copmf&output=json&pdsid=<pattern>
//! ```
//!
//! ODE answers with `ODEResults.Products`, which is either the literal string
//! `"No Products Found"` or `{ "Product": ... }`. Like most XML-to-JSON
//! services, ODE collapses single-element lists into bare objects, so every
//! list in the response is decoded as one-or-many.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::download::safe_file_name;
use crate::http::{HttpTimeouts, build_http_client};
use crate::pattern::IdPattern;

use super::{Catalog, CatalogError, Product, ProductFile};

/// Default ODE REST endpoint.
pub const DEFAULT_ODE_ENDPOINT: &str = "https://oderest.rsl.wustl.edu/live2/default.aspx";

/// ODE marker for an empty result set.
const NO_PRODUCTS_FOUND: &str = "No Products Found";

const CATALOG_NAME: &str = "ode";

// ==================== ODE Response Types ====================

#[derive(Debug, Deserialize)]
struct OdeEnvelope {
    #[serde(rename = "ODEResults")]
    results: OdeResults,
}

#[derive(Debug, Deserialize)]
struct OdeResults {
    #[serde(rename = "Status", default)]
    status: Option<String>,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Products", default)]
    products: Option<OdeProducts>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OdeProducts {
    Message(String),
    Found {
        #[serde(rename = "Product")]
        product: OneOrMany<Value>,
    },
}

/// A list that the service may flatten to a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct OdeProduct {
    pdsid: String,
    #[serde(rename = "Product_files", default)]
    product_files: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OdeProductFiles {
    #[serde(rename = "Product_file")]
    product_file: OneOrMany<Value>,
}

#[derive(Debug, Deserialize)]
struct OdeProductFile {
    #[serde(rename = "FileName", default)]
    file_name: Option<String>,
    #[serde(rename = "URL")]
    url: String,
}

// ==================== OdeCatalog ====================

/// Resolves identifier patterns through the ODE REST API.
///
/// ODE performs the wildcard expansion server side; results are checked
/// again locally against the pattern so a lenient server match never leaks
/// unrelated products into the download set.
pub struct OdeCatalog {
    client: Client,
    endpoint: Url,
}

impl OdeCatalog {
    /// Creates a catalog for the public ODE endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Client`] if HTTP client construction fails.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, CatalogError> {
        Self::with_endpoint(DEFAULT_ODE_ENDPOINT, timeouts)
    }

    /// Creates a catalog for a custom endpoint (mirrors, tests).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Client`] if the endpoint is not an absolute
    /// http(s) URL or HTTP client construction fails.
    #[tracing::instrument(skip(timeouts))]
    pub fn with_endpoint(endpoint: &str, timeouts: HttpTimeouts) -> Result<Self, CatalogError> {
        let endpoint = Url::parse(endpoint)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| {
                CatalogError::client(
                    CATALOG_NAME,
                    format!("invalid catalog endpoint '{endpoint}' (expected an http(s) URL)"),
                )
            })?;
        let client = build_http_client(timeouts)
            .map_err(|reason| CatalogError::client(CATALOG_NAME, reason))?;
        Ok(Self { client, endpoint })
    }

    fn query_url(&self, pattern: &IdPattern) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("query", "product")
            .append_pair("results", "copmf")
            .append_pair("output", "json")
            .append_pair("pdsid", pattern.as_str());
        url
    }
}

impl std::fmt::Debug for OdeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdeCatalog")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Catalog for OdeCatalog {
    fn name(&self) -> &str {
        CATALOG_NAME
    }

    #[instrument(skip(self), fields(pattern = %pattern))]
    async fn resolve(&self, pattern: &IdPattern) -> Result<Vec<Product>, CatalogError> {
        let url = self.query_url(pattern);
        let endpoint = self.endpoint.as_str();
        debug!(url = %url, "querying ODE");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::request(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::http_status(endpoint, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::request(endpoint, e))?;

        let products = parse_ode_response(endpoint, &body)?;
        let total = products.len();
        let matched: Vec<Product> = products
            .into_iter()
            .filter(|product| {
                let keep = pattern.matches(&product.pds_id);
                if !keep {
                    debug!(pds_id = %product.pds_id, "dropping product not matching pattern");
                }
                keep
            })
            .collect();

        info!(
            found = total,
            matched = matched.len(),
            "{} products found",
            matched.len()
        );
        Ok(matched)
    }
}

/// Decodes an ODE JSON body into product references.
fn parse_ode_response(endpoint: &str, body: &str) -> Result<Vec<Product>, CatalogError> {
    let envelope: OdeEnvelope =
        serde_json::from_str(body).map_err(|e| CatalogError::decode(endpoint, e.to_string()))?;
    let results = envelope.results;

    if results
        .status
        .as_deref()
        .is_some_and(|status| status.eq_ignore_ascii_case("error"))
    {
        let message = results
            .error
            .unwrap_or_else(|| "unspecified ODE error".to_string());
        return Err(CatalogError::service(CATALOG_NAME, message));
    }

    let raw_products = match results.products {
        None => {
            return Err(CatalogError::decode(
                endpoint,
                "missing ODEResults.Products",
            ));
        }
        Some(OdeProducts::Message(message)) => {
            if message.trim().eq_ignore_ascii_case(NO_PRODUCTS_FOUND) {
                return Ok(Vec::new());
            }
            return Err(CatalogError::service(CATALOG_NAME, message));
        }
        Some(OdeProducts::Found { product }) => product.into_vec(),
    };

    raw_products
        .into_iter()
        .map(|raw| product_from_value(endpoint, raw))
        .collect()
}

fn product_from_value(endpoint: &str, raw: Value) -> Result<Product, CatalogError> {
    let decoded: OdeProduct = serde_json::from_value(raw.clone())
        .map_err(|e| CatalogError::decode(endpoint, format!("invalid product record: {e}")))?;

    let files = decoded
        .product_files
        .and_then(|value| serde_json::from_value::<OdeProductFiles>(value).ok())
        .map(|files| files.product_file.into_vec())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|raw_file| decode_product_file(&decoded.pdsid, raw_file))
        .filter_map(|file| product_file(&decoded.pdsid, file))
        .collect();

    Ok(Product::new(decoded.pdsid, files).with_metadata(raw))
}

/// Malformed entries are skipped on their own; siblings still download.
fn decode_product_file(pds_id: &str, raw: Value) -> Option<OdeProductFile> {
    match serde_json::from_value(raw) {
        Ok(file) => Some(file),
        Err(error) => {
            warn!(pds_id, %error, "skipping malformed product file entry");
            None
        }
    }
}

fn product_file(pds_id: &str, file: OdeProductFile) -> Option<ProductFile> {
    let Ok(url) = Url::parse(&file.url) else {
        warn!(pds_id, url = %file.url, "skipping product file with invalid URL");
        return None;
    };

    let name = file
        .file_name
        .as_deref()
        .and_then(safe_file_name)
        .or_else(|| file_name_from_url(&url));

    match name {
        Some(name) => Some(ProductFile::new(name, url.as_str())),
        None => {
            warn!(pds_id, url = %url, "skipping product file without a usable file name");
            None
        }
    }
}

fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(last).ok()?;
    safe_file_name(&decoded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "https://ode.example/live2/default.aspx";

    fn two_products() -> Value {
        json!({
            "ODEResults": {
                "Status": "Success",
                "Count": "2",
                "Products": {
                    "Product": [
                        {
                            "pdsid": "HRL0000CA5C_07_IF183L_TRR3",
                            "ihid": "MRO",
                            "Product_files": {
                                "Product_file": [
                                    {"FileName": "HRL0000CA5C_07_IF183L_TRR3.IMG", "Type": "Product", "KBytes": "10.5", "URL": "https://pds.example/crism/hrl0000ca5c_07_if183l_trr3.img"},
                                    {"FileName": "HRL0000CA5C_07_IF183L_TRR3.LBL", "Type": "Label", "KBytes": "1", "URL": "https://pds.example/crism/hrl0000ca5c_07_if183l_trr3.lbl"}
                                ]
                            }
                        },
                        {
                            "pdsid": "HRL0000CA5C_07_DE183L_DDR1",
                            "Product_files": {
                                "Product_file": {"FileName": "HRL0000CA5C_07_DE183L_DDR1.IMG", "URL": "https://pds.example/crism/hrl0000ca5c_07_de183l_ddr1.img"}
                            }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_parse_no_products_found() {
        let body = json!({"ODEResults": {"Status": "Success", "Products": "No Products Found"}});
        let products = parse_ode_response(ENDPOINT, &body.to_string()).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_parse_products_in_catalog_order() {
        let products = parse_ode_response(ENDPOINT, &two_products().to_string()).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].pds_id, "HRL0000CA5C_07_IF183L_TRR3");
        assert_eq!(products[0].files.len(), 2);
        assert_eq!(products[0].files[0].name, "HRL0000CA5C_07_IF183L_TRR3.IMG");
        assert_eq!(products[0].files[0].size, None);
        assert_eq!(products[1].files.len(), 1, "single Product_file object must decode");
        assert_eq!(products[0].metadata["ihid"], "MRO");
    }

    #[test]
    fn test_parse_single_product_object() {
        let body = json!({
            "ODEResults": {
                "Products": {
                    "Product": {
                        "pdsid": "FRT00012345_07_IF166L_TRR3",
                        "Product_files": {"Product_file": {"URL": "https://pds.example/a/frt00012345_07_if166l_trr3.lbl"}}
                    }
                }
            }
        });
        let products = parse_ode_response(ENDPOINT, &body.to_string()).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(
            products[0].files[0].name, "frt00012345_07_if166l_trr3.lbl",
            "missing FileName falls back to the URL path"
        );
    }

    #[test]
    fn test_parse_product_without_files() {
        let body = json!({
            "ODEResults": {"Products": {"Product": {"pdsid": "X_1", "Product_files": ""}}}
        });
        let products = parse_ode_response(ENDPOINT, &body.to_string()).unwrap();
        assert_eq!(products.len(), 1);
        assert!(products[0].files.is_empty());
    }

    #[test]
    fn test_parse_skips_file_entry_without_url_and_keeps_siblings() {
        let body = json!({
            "ODEResults": {"Products": {"Product": {
                "pdsid": "HRL0000CA5C_07_IF183L_TRR3",
                "Product_files": {"Product_file": [
                    {"FileName": "HRL0000CA5C_07_IF183L_TRR3.IMG", "URL": "https://pds.example/a.img"},
                    {"FileName": "HRL0000CA5C_07_IF183L_TRR3.LBL", "URL": "https://pds.example/a.lbl"},
                    {"FileName": "HRL0000CA5C_07_IF183L_TRR3_BROWSE.PNG", "Type": "Browse"}
                ]}
            }}}
        });
        let products = parse_ode_response(ENDPOINT, &body.to_string()).unwrap();
        let names: Vec<&str> = products[0].files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["HRL0000CA5C_07_IF183L_TRR3.IMG", "HRL0000CA5C_07_IF183L_TRR3.LBL"]
        );
    }

    #[test]
    fn test_parse_rejects_path_traversal_file_name() {
        let body = json!({
            "ODEResults": {"Products": {"Product": {
                "pdsid": "X_1",
                "Product_files": {"Product_file": {"FileName": "../../etc/passwd", "URL": "https://pds.example/x_1.img"}}
            }}}
        });
        let products = parse_ode_response(ENDPOINT, &body.to_string()).unwrap();
        assert_eq!(products[0].files[0].name, "passwd");
    }

    #[test]
    fn test_parse_error_status_is_service_error() {
        let body = json!({"ODEResults": {"Status": "ERROR", "Error": "Invalid pdsid"}});
        let err = parse_ode_response(ENDPOINT, &body.to_string()).unwrap_err();
        assert!(matches!(err, CatalogError::Service { .. }));
        assert!(err.to_string().contains("Invalid pdsid"));
    }

    #[test]
    fn test_parse_invalid_json_is_decode_error() {
        let err = parse_ode_response(ENDPOINT, "<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, CatalogError::Decode { .. }));
    }

    #[test]
    fn test_with_endpoint_rejects_non_http_url() {
        let err = OdeCatalog::with_endpoint("ftp://ode.example/", HttpTimeouts::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Client { .. }));
    }

    #[test]
    fn test_query_url_carries_pattern() {
        let catalog = OdeCatalog::with_endpoint(ENDPOINT, HttpTimeouts::default()).unwrap();
        let url = catalog.query_url(&IdPattern::parse("HRL0000CA5C*").unwrap());
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("query".to_string(), "product".to_string())));
        assert!(pairs.contains(&("results".to_string(), "copmf".to_string())));
        assert!(pairs.contains(&("output".to_string(), "json".to_string())));
        assert!(pairs.contains(&("pdsid".to_string(), "HRL0000CA5C*".to_string())));
    }

    #[tokio::test]
    async fn test_resolve_against_mock_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live2/default.aspx"))
            .and(query_param("pdsid", "HRL0000CA5C*"))
            .and(query_param("output", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_products()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let endpoint = format!("{}/live2/default.aspx", mock_server.uri());
        let catalog = OdeCatalog::with_endpoint(&endpoint, HttpTimeouts::default()).unwrap();
        let products = catalog
            .resolve(&IdPattern::parse("HRL0000CA5C*").unwrap())
            .await
            .unwrap();
        assert_eq!(products.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_drops_products_not_matching_pattern() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(two_products()))
            .mount(&mock_server)
            .await;

        let catalog =
            OdeCatalog::with_endpoint(&mock_server.uri(), HttpTimeouts::default()).unwrap();
        let products = catalog
            .resolve(&IdPattern::parse("HRL0000CA5C_07_IF*").unwrap())
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].pds_id, "HRL0000CA5C_07_IF183L_TRR3");
    }

    #[tokio::test]
    async fn test_resolve_http_error_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let catalog =
            OdeCatalog::with_endpoint(&mock_server.uri(), HttpTimeouts::default()).unwrap();
        let err = catalog
            .resolve(&IdPattern::parse("HRL*").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus { status: 503, .. }));
    }
}
