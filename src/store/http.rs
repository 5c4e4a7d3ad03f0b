//! REST client for a live collection backend.
//!
//! # Endpoints
//!
//! | Operation | Request | Response |
//! |-----------|---------|----------|
//! | list page | `GET {base}/collections/{name}/items?skip={offset}&limit={limit}` | `{"items": [...], "hasNext": bool}` |
//! | get by id | `GET {base}/collections/{name}/items/{id}` | the record, or HTTP 404 |
//!
//! Transport errors, 5xx, 408 and 429 become [`StoreError::Fetch`] and are
//! retried by [`crate::store::RetryStore`]. A 404 on a detail lookup becomes
//! [`StoreError::NotFound`]. Other statuses become [`StoreError::Rejected`].
//! Bodies that do not decode become [`StoreError::Decode`].

use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{ConfigError, StoreError};
use crate::models::{Collection, PageRequest, PageResult, Record};
use crate::store::CollectionStore;
use crate::utils::truncate_for_log;

#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
}

impl HttpStore {
    /// Build a client for the backend rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|source| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("campus_press/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ConfigError::HttpClientBuild { source })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for one listing page.
    pub fn list_url(&self, request: &PageRequest) -> Url {
        let mut url = self.items_url(request.collection);
        url.query_pairs_mut()
            .append_pair("skip", &request.offset.to_string())
            .append_pair("limit", &request.limit.to_string());
        url
    }

    /// URL for a single record; the id is percent-encoded as one path segment.
    pub fn item_url(&self, collection: Collection, id: &str) -> Url {
        let mut url = self.items_url(collection);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    fn items_url(&self, collection: Collection) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["collections", collection.as_str(), "items"]);
        }
        url
    }

    async fn get_text(&self, collection: Collection, url: Url) -> Result<(StatusCode, String), StoreError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| StoreError::fetch(collection, e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::fetch(collection, e.to_string()))?;
        debug!(
            %url,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "Backend responded"
        );
        Ok((status, body))
    }
}

/// Decode a listing body.
pub fn parse_page(collection: Collection, body: &str) -> Result<PageResult, StoreError> {
    serde_json::from_str(body).map_err(|source| {
        warn!(
            %collection,
            body_preview = %truncate_for_log(body, 300),
            "Listing body did not decode"
        );
        StoreError::Decode { collection, source }
    })
}

/// Decode a single-record body.
pub fn parse_record(collection: Collection, body: &str) -> Result<Record, StoreError> {
    serde_json::from_str(body).map_err(|source| StoreError::Decode { collection, source })
}

/// Map a non-success status to a store error.
///
/// `id` is set for single-record lookups, where a 404 means the record does
/// not exist. Server errors, 408 and 429 are transient; every other status
/// is a rejection that retrying will not fix.
pub fn status_error(
    collection: Collection,
    id: Option<&str>,
    status: StatusCode,
    body: &str,
) -> StoreError {
    let message = truncate_for_log(body, 200);
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => StoreError::NotFound {
            collection,
            id: id.to_string(),
        },
        (s, _)
            if s.is_server_error()
                || s == StatusCode::TOO_MANY_REQUESTS
                || s == StatusCode::REQUEST_TIMEOUT =>
        {
            StoreError::fetch(collection, format!("HTTP {}: {message}", s.as_u16()))
        }
        (s, _) => StoreError::Rejected {
            collection,
            status: s.as_u16(),
            message,
        },
    }
}

impl CollectionStore for HttpStore {
    #[instrument(level = "info", skip_all, fields(collection = %request.collection, offset = request.offset, limit = request.limit))]
    async fn list_page(&self, request: PageRequest) -> Result<PageResult, StoreError> {
        let url = self.list_url(&request);
        let (status, body) = self.get_text(request.collection, url).await?;
        if !status.is_success() {
            return Err(status_error(request.collection, None, status, &body));
        }

        let page = parse_page(request.collection, &body)?;
        info!(
            count = page.items.len(),
            has_more = page.has_more,
            "Fetched page"
        );
        Ok(page)
    }

    #[instrument(level = "info", skip_all, fields(%collection, %id))]
    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        let url = self.item_url(collection, id);
        let (status, body) = self.get_text(collection, url).await?;

        if !status.is_success() {
            return Err(status_error(collection, Some(id), status, &body));
        }
        parse_record(collection, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(base: &str) -> HttpStore {
        HttpStore::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_list_url() {
        let s = store("https://cms.example.edu/api");
        let url = s.list_url(&PageRequest {
            collection: Collection::PrintIssues,
            offset: 24,
            limit: 12,
        });
        assert_eq!(
            url.as_str(),
            "https://cms.example.edu/api/collections/printissues/items?skip=24&limit=12"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_equivalent() {
        let a = store("https://cms.example.edu/api");
        let b = store("https://cms.example.edu/api/");
        assert_eq!(
            a.item_url(Collection::Articles, "a-1"),
            b.item_url(Collection::Articles, "a-1")
        );
    }

    #[test]
    fn test_item_url_encodes_id() {
        let s = store("http://localhost:8080");
        let url = s.item_url(Collection::Articles, "a b/c");
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/collections/articles/items/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpStore::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_parse_page() {
        let body = r#"{"items":[{"_id":"n-1","newsletterTitle":"Week 1"}],"hasNext":true,"totalCount":99}"#;
        let page = parse_page(Collection::Newsletters, body).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].text("newsletterTitle"), Some("Week 1"));
        assert!(page.has_more);
    }

    #[test]
    fn test_parse_page_rejects_garbage() {
        let err = parse_page(Collection::Articles, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_record_requires_id() {
        assert!(parse_record(Collection::Articles, r#"{"articleTitle":"x"}"#).is_err());
        let record = parse_record(Collection::Articles, r#"{"_id":"a-9"}"#).unwrap();
        assert_eq!(record.id, "a-9");
    }

    #[test]
    fn test_status_error_classification() {
        let missing = status_error(Collection::Articles, Some("a-404"), StatusCode::NOT_FOUND, "");
        assert!(missing.is_not_found());
        assert!(!missing.is_transient());

        let server = status_error(Collection::Articles, None, StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(server, StoreError::Fetch { .. }));
        assert!(server.is_transient());

        let throttled = status_error(Collection::Articles, None, StatusCode::TOO_MANY_REQUESTS, "");
        assert!(throttled.is_transient());

        let bad = status_error(Collection::Articles, None, StatusCode::BAD_REQUEST, "bad skip");
        assert!(matches!(bad, StoreError::Rejected { status: 400, .. }));
        assert!(!bad.is_transient());

        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN, StatusCode::UNPROCESSABLE_ENTITY] {
            assert!(!status_error(Collection::Newsletters, None, status, "").is_transient());
        }
    }

    #[test]
    fn test_listing_404_is_rejection_not_missing_record() {
        let err = status_error(Collection::PrintIssues, None, StatusCode::NOT_FOUND, "no such collection");
        assert!(matches!(err, StoreError::Rejected { status: 404, .. }));
        assert!(!err.is_not_found());
    }
}
