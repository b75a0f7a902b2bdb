//! Error types for catalog resolution.
//!
//! A catalog failure aborts the whole run: without a product list there is
//! nothing to download.

use thiserror::Error;

/// Errors that can occur while resolving a pattern against a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog could not be reached (DNS, connection refused, TLS, ...).
    #[error("catalog unreachable at {endpoint}: {source}\n  Suggestion: check your network connection or --catalog-url")]
    Unreachable {
        /// The endpoint that was queried.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The catalog did not answer in time.
    #[error("catalog request to {endpoint} timed out\n  Suggestion: retry later or raise --read-timeout")]
    Timeout {
        /// The endpoint that was queried.
        endpoint: String,
    },

    /// The catalog answered with a non-success HTTP status.
    #[error("catalog returned HTTP {status} for {endpoint}")]
    HttpStatus {
        /// The endpoint that was queried.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The catalog response could not be decoded.
    #[error("unexpected catalog response from {endpoint}: {reason}")]
    Decode {
        /// The endpoint that was queried.
        endpoint: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The catalog reported an error of its own.
    #[error("catalog '{catalog}' reported an error: {message}")]
    Service {
        /// Catalog name.
        catalog: String,
        /// Message returned by the service.
        message: String,
    },

    /// The catalog client could not be constructed.
    #[error("cannot initialise catalog '{catalog}': {reason}")]
    Client {
        /// Catalog name.
        catalog: String,
        /// Why construction failed.
        reason: String,
    },
}

impl CatalogError {
    /// Creates an error from a failed request, separating timeouts.
    pub fn request(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else {
            Self::Unreachable { endpoint, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates a service-reported error.
    pub fn service(catalog: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            catalog: catalog.into(),
            message: message.into(),
        }
    }

    /// Creates a client construction error.
    pub fn client(catalog: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Client {
            catalog: catalog.into(),
            reason: reason.into(),
        }
    }
}
