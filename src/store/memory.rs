//! In-process collection store.
//!
//! Serves offset pages by slicing an ordered `Vec<Record>` per collection.
//! Used for offline browsing from a fixture file (`--fixtures`) and as the
//! store double throughout the test suite, where [`MemoryStore::fail_next`]
//! injects transient failures.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument, warn};

use crate::error::{ConfigError, StoreError};
use crate::models::{Collection, PageRequest, PageResult, Record};
use crate::store::CollectionStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Record>>>,
    failures_pending: AtomicUsize,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load collections from a YAML (or JSON) document mapping collection
    /// names to record lists.
    ///
    /// ```yaml
    /// articles:
    ///   - _id: a-1
    ///     articleTitle: Quad renovation delayed
    ///     sectionCategory: News
    /// teammembers:
    ///   - _id: t-1
    ///     name: Ada Park
    /// ```
    ///
    /// Unknown collection names are skipped with a warning.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_fixture_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: HashMap<String, Vec<Record>> =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self::new();
        for (name, records) in raw {
            match name.parse::<Collection>() {
                Ok(collection) => {
                    info!(%collection, count = records.len(), "Loaded fixture collection");
                    store.extend(collection, records);
                }
                Err(e) => warn!(error = %e, "Skipping fixture collection"),
            }
        }
        Ok(store)
    }

    pub fn insert(&self, collection: Collection, record: Record) {
        self.extend(collection, [record]);
    }

    pub fn extend(&self, collection: Collection, records: impl IntoIterator<Item = Record>) {
        let mut collections = self.lock();
        collections.entry(collection).or_default().extend(records);
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.lock().get(&collection).map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Make the next `n` calls fail with [`StoreError::Fetch`].
    pub fn fail_next(&self, n: usize) {
        self.failures_pending.store(n, Ordering::SeqCst);
    }

    /// Number of store calls made so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, Vec<Record>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self, collection: Collection) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            debug!(%collection, "Injected store failure");
            return Err(StoreError::fetch(collection, "injected failure"));
        }
        Ok(())
    }
}

impl CollectionStore for MemoryStore {
    async fn list_page(&self, request: PageRequest) -> Result<PageResult, StoreError> {
        self.take_failure(request.collection)?;

        let collections = self.lock();
        let records = collections
            .get(&request.collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let start = request.offset.min(records.len());
        let end = request.offset.saturating_add(request.limit).min(records.len());

        Ok(PageResult {
            items: records[start..end].to_vec(),
            has_more: end < records.len(),
        })
    }

    async fn get_by_id(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        self.take_failure(collection)?;

        self.lock()
            .get(&collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }
}
