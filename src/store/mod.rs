//! Collection store interface and retry decorator.
//!
//! A collection store is the CRUD backend the site reads from. It is
//! injected into every loader and view rather than reached through a
//! process-wide client, so tests can swap in [`memory::MemoryStore`].
//!
//! # Architecture
//!
//! - [`CollectionStore`]: Core trait with the two read operations the site uses
//! - [`http::HttpStore`]: REST client for a live backend
//! - [`memory::MemoryStore`]: In-process store for fixtures and tests
//! - [`RetryStore`]: Decorator that adds retry logic to any store
//!
//! # Retry Strategy
//!
//! Retry belongs to the store, never to the loader. [`RetryStore`] retries
//! only transient [`StoreError::Fetch`] failures:
//! - Exponential backoff starting at `base_delay`
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms by default) added to each delay

pub mod http;
pub mod memory;

use rand::{Rng, rng};
use std::fmt;
use std::future::Future;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

use crate::error::StoreError;
use crate::models::{Collection, PageRequest, PageResult, Record};

/// Read access to a CRUD-style collection backend.
#[allow(async_fn_in_trait)]
pub trait CollectionStore {
    /// Fetch `request.limit` records starting at `request.offset`.
    ///
    /// The returned `has_more` says whether a further page exists; it is
    /// not a total count.
    async fn list_page(&self, request: PageRequest) -> Result<PageResult, StoreError>;

    /// Fetch a single record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when the id does not exist, or any other
    /// variant when the lookup itself failed.
    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Record, StoreError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`CollectionStore`].
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..max_jitter)
/// ```
pub struct RetryStore<S> {
    /// The underlying store to wrap.
    inner: S,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
    /// Upper bound of the random jitter added to each delay.
    max_jitter: StdDuration,
}

impl<S> RetryStore<S>
where
    S: CollectionStore,
{
    /// Create a new retry wrapper around an existing store.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = HttpStore::new(base_url, Duration::from_secs(10))?;
    /// let store = RetryStore::new(store, 3, Duration::from_millis(500));
    /// ```
    pub fn new(inner: S, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
            max_jitter: StdDuration::from_millis(250),
        }
    }

    pub fn with_max_jitter(mut self, max_jitter: StdDuration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            operation,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "store call exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let shift = (attempt - 1).min(16) as u32;
                    let delay = self
                        .base_delay
                        .saturating_mul(1u32 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 =
                        rng().random_range(0..=self.max_jitter.as_millis() as u64);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        operation,
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "store call failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl<S> fmt::Debug for RetryStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryStore")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

impl<S> CollectionStore for RetryStore<S>
where
    S: CollectionStore,
{
    #[instrument(level = "debug", skip_all, fields(collection = %request.collection, offset = request.offset))]
    async fn list_page(&self, request: PageRequest) -> Result<PageResult, StoreError> {
        self.with_retry("list_page", || self.inner.list_page(request))
            .await
    }

    #[instrument(level = "debug", skip_all, fields(%collection, %id))]
    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        self.with_retry("get_by_id", || self.inner.get_by_id(collection, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn fast_retry(store: MemoryStore, max_retries: usize) -> RetryStore<MemoryStore> {
        RetryStore::new(store, max_retries, StdDuration::ZERO).with_max_jitter(StdDuration::ZERO)
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(Collection::Articles, Record::new("a-1"));
        store.insert(Collection::Articles, Record::new("a-2"));
        store
    }

    fn first_page() -> PageRequest {
        PageRequest {
            collection: Collection::Articles,
            offset: 0,
            limit: 12,
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let store = seeded();
        store.fail_next(2);
        let retry = fast_retry(store, 3);

        let page = retry.list_page(first_page()).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(retry.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let store = seeded();
        store.fail_next(10);
        let retry = fast_retry(store, 2);

        let err = retry.list_page(first_page()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(retry.inner().call_count(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let retry = fast_retry(seeded(), 5);

        let err = retry
            .get_by_id(Collection::Articles, "missing-id")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(retry.inner().call_count(), 1);
    }

    /// Refuses every call the way a backend answering 403 would.
    #[derive(Default)]
    struct RejectingStore {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl CollectionStore for RejectingStore {
        async fn list_page(&self, request: PageRequest) -> Result<PageResult, StoreError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(StoreError::Rejected {
                collection: request.collection,
                status: 403,
                message: "forbidden".to_string(),
            })
        }

        async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
            Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let retry = RetryStore::new(RejectingStore::default(), 5, StdDuration::ZERO)
            .with_max_jitter(StdDuration::ZERO);

        let err = retry.list_page(first_page()).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 403, .. }));
        assert_eq!(
            retry.inner().calls.load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }
}
