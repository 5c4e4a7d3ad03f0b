//! Error types for the collection store and configuration layers.
//!
//! Store failures are always recoverable: a view that receives one keeps its
//! previously loaded records and reports the failure for display or logging.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Collection;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or backend failure while listing or fetching.
    #[error("failed to fetch from {collection}: {message}")]
    Fetch {
        collection: Collection,
        message: String,
    },

    /// The backend refused the request in a way retrying will not change.
    #[error("request to {collection} rejected with HTTP {status}: {message}")]
    Rejected {
        collection: Collection,
        status: u16,
        message: String,
    },

    /// A detail lookup for an id the backend does not know.
    #[error("record {id} not found in {collection}")]
    NotFound { collection: Collection, id: String },

    /// The backend answered, but the body was not a valid page or record.
    #[error("failed to decode response from {collection}: {source}")]
    Decode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown collection: {name}")]
    UnknownCollection { name: String },
}

impl StoreError {
    pub fn fetch(collection: Collection, message: impl Into<String>) -> Self {
        StoreError::Fetch {
            collection,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Only transport failures, 5xx and 429/408 responses map to `Fetch`.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Fetch { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid API url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("no store configured: pass --api-url, set api_url in the config file, or use --fixtures")]
    NoStore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let fetch = StoreError::fetch(Collection::Articles, "connection reset");
        let missing = StoreError::NotFound {
            collection: Collection::Articles,
            id: "missing-id".to_string(),
        };

        assert!(fetch.is_transient());
        assert!(!fetch.is_not_found());
        assert!(missing.is_not_found());
        let rejected = StoreError::Rejected {
            collection: Collection::Articles,
            status: 403,
            message: "forbidden".to_string(),
        };
        assert!(!rejected.is_transient());
        assert!(!rejected.is_not_found());
        assert!(!missing.is_transient());
        assert_eq!(
            missing.to_string(),
            "record missing-id not found in articles"
        );
    }
}
