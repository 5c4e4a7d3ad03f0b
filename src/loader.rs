//! Paginated collection loading with client-side filtering.
//!
//! A [`PaginatedLoader`] fetches fixed-size pages from one collection,
//! narrows each fetched page with an optional [`FieldFilter`], and appends
//! the survivors to an accumulating list that "load more" keeps growing.
//!
//! # Semantics
//!
//! - Filtering is page-local. A page whose records are all filtered out still
//!   advances the offset by the full page size, and `has_more` is whatever
//!   the store reported, never inferred from how many records survived.
//! - At most one fetch is in flight. Asking for the next page while one is
//!   loading is a no-op rather than a queued request.
//! - [`PaginatedLoader::begin_reset`] starts a new configuration. A fetch
//!   issued under an older configuration is discarded when it completes.
//! - The loader never retries. Retry and timeout belong to the store.
//!
//! # State machine
//!
//! ```text
//!            begin_next / begin_reset
//!   Idle ─────────────────────────────▶ Loading ──ok──▶ Loaded { has_more }
//!                                        ▲   └──err──▶ Failed
//!                                        │                │
//!                                        └── begin_next ──┘ (and from Loaded while has_more)
//! ```
//!
//! # Split-phase API
//!
//! Views on a single event loop can issue a fetch, keep handling other
//! events, and feed the result back later:
//!
//! ```ignore
//! if let Some(ticket) = loader.begin_next() {
//!     let result = ticket.fetch(store.as_ref()).await;
//!     loader.complete(ticket, result)?;
//! }
//! ```
//!
//! [`PaginatedLoader::load_next`] and [`PaginatedLoader::reset`] do all three
//! steps in one call.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::filter::FieldFilter;
use crate::models::{Collection, PageRequest, PageResult, Record};
use crate::store::CollectionStore;

/// Observable state of a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderPhase {
    /// Nothing requested yet.
    Idle,
    /// Exactly one fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Loaded { has_more: bool },
    /// The last fetch failed; earlier results are untouched.
    Failed,
}

/// What a load call did to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The call was not allowed (already loading, or nothing more to load).
    Skipped,
    /// The result belonged to a configuration that has since been reset,
    /// or to a fetch that is no longer in flight.
    Stale,
    /// A page arrived; `kept` of its `fetched` records passed the filter.
    Appended { fetched: usize, kept: usize },
}

/// Permission to run one page fetch, issued by the loader.
///
/// The ticket remembers which configuration it was issued under so the
/// loader can recognize and drop late results after a reset. Tickets are
/// not `Clone`: each one is consumed by exactly one [`PaginatedLoader::complete`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket holds the loader in Loading until it is completed"]
pub struct PageTicket {
    generation: u64,
    request: PageRequest,
}

impl PageTicket {
    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn offset(&self) -> usize {
        self.request.offset
    }

    /// Run the fetch this ticket stands for.
    pub async fn fetch<S: CollectionStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<PageResult, StoreError> {
        store.list_page(self.request).await
    }
}

/// Accumulating, "load more"-driven view over one collection.
pub struct PaginatedLoader<S> {
    store: Arc<S>,
    collection: Collection,
    page_size: usize,
    filter: Option<FieldFilter>,
    accumulated: Vec<Record>,
    next_offset: usize,
    has_more: bool,
    phase: LoaderPhase,
    generation: u64,
}

impl<S> std::fmt::Debug for PaginatedLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedLoader")
            .field("collection", &self.collection)
            .field("page_size", &self.page_size)
            .field("filter", &self.filter)
            .field("accumulated", &self.accumulated.len())
            .field("next_offset", &self.next_offset)
            .field("has_more", &self.has_more)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<S: CollectionStore> PaginatedLoader<S> {
    /// Create an idle loader. A `page_size` of zero is raised to one.
    pub fn new(store: Arc<S>, collection: Collection, page_size: usize) -> Self {
        if page_size == 0 {
            warn!(%collection, "page_size 0 is not allowed; using 1");
        }
        Self {
            store,
            collection,
            page_size: page_size.max(1),
            filter: None,
            accumulated: Vec::new(),
            next_offset: 0,
            has_more: false,
            phase: LoaderPhase::Idle,
            generation: 0,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filter(&self) -> Option<&FieldFilter> {
        self.filter.as_ref()
    }

    /// Records accumulated so far, in fetch order.
    pub fn accumulated(&self) -> &[Record] {
        &self.accumulated
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    /// The store's "more pages" signal from the most recent successful fetch.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoaderPhase::Loading
    }

    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    /// Whether a "load more" affordance should be offered right now.
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading()
    }

    /// Issue a ticket for the next page, or `None` if the call must be a no-op.
    ///
    /// No-op when a fetch is in flight, or when the last successful fetch
    /// reported that there is nothing more to load.
    pub fn begin_next(&mut self) -> Option<PageTicket> {
        match self.phase {
            LoaderPhase::Loading => {
                debug!(collection = %self.collection, "Fetch already in flight; ignoring");
                return None;
            }
            LoaderPhase::Loaded { has_more: false } => {
                debug!(collection = %self.collection, "No more pages; ignoring");
                return None;
            }
            LoaderPhase::Idle | LoaderPhase::Failed | LoaderPhase::Loaded { has_more: true } => {}
        }
        Some(self.issue_ticket())
    }

    fn issue_ticket(&mut self) -> PageTicket {
        self.phase = LoaderPhase::Loading;
        PageTicket {
            generation: self.generation,
            request: PageRequest {
                collection: self.collection,
                offset: self.next_offset,
                limit: self.page_size,
            },
        }
    }

    /// Start over under a new filter configuration and issue the first ticket.
    ///
    /// Any fetch still in flight from before the reset becomes stale: it no
    /// longer blocks new fetches and its result will be discarded.
    pub fn begin_reset(&mut self, filter: Option<FieldFilter>) -> PageTicket {
        if self.is_loading() {
            debug!(
                collection = %self.collection,
                generation = self.generation,
                "Reset while loading; in-flight result will be discarded"
            );
        }
        self.generation += 1;
        self.filter = filter;
        self.accumulated.clear();
        self.next_offset = 0;
        self.has_more = false;
        self.issue_ticket()
    }

    /// Apply the result of a ticket's fetch.
    ///
    /// # Errors
    ///
    /// Returns the store error when a current fetch failed. Accumulated
    /// records, offset and `has_more` are left as they were.
    ///
    /// A ticket from an earlier generation, or one that does not match the
    /// fetch currently in flight, yields [`LoadOutcome::Stale`] and changes
    /// nothing.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        result: Result<PageResult, StoreError>,
    ) -> Result<LoadOutcome, StoreError> {
        if ticket.generation != self.generation {
            match &result {
                Ok(page) => debug!(
                    collection = %self.collection,
                    ticket_generation = ticket.generation,
                    current_generation = self.generation,
                    discarded = page.items.len(),
                    "Discarding stale page"
                ),
                Err(e) => debug!(
                    collection = %self.collection,
                    ticket_generation = ticket.generation,
                    error = %e,
                    "Discarding stale failure"
                ),
            }
            return Ok(LoadOutcome::Stale);
        }

        if self.phase != LoaderPhase::Loading || ticket.request.offset != self.next_offset {
            debug!(
                collection = %self.collection,
                offset = ticket.request.offset,
                next_offset = self.next_offset,
                phase = ?self.phase,
                "No matching fetch in flight; discarding result"
            );
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(page) => {
                let fetched = page.items.len();
                let survivors = match &self.filter {
                    Some(filter) => filter.apply(page.items),
                    None => page.items,
                };
                let kept = survivors.len();

                self.accumulated.extend(survivors);
                self.next_offset += self.page_size;
                self.has_more = page.has_more;
                self.phase = LoaderPhase::Loaded {
                    has_more: page.has_more,
                };

                info!(
                    collection = %self.collection,
                    offset = ticket.request.offset,
                    fetched,
                    kept,
                    total = self.accumulated.len(),
                    has_more = self.has_more,
                    "Loaded page"
                );
                Ok(LoadOutcome::Appended { fetched, kept })
            }
            Err(e) => {
                warn!(
                    collection = %self.collection,
                    offset = ticket.request.offset,
                    error = %e,
                    "Page fetch failed"
                );
                self.phase = LoaderPhase::Failed;
                Err(e)
            }
        }
    }

    /// Fetch and append the next page.
    #[instrument(level = "debug", skip_all, fields(collection = %self.collection, offset = self.next_offset))]
    pub async fn load_next(&mut self) -> Result<LoadOutcome, StoreError> {
        let Some(ticket) = self.begin_next() else {
            return Ok(LoadOutcome::Skipped);
        };
        let result = ticket.fetch(self.store.as_ref()).await;
        self.complete(ticket, result)
    }

    /// Clear everything, install `filter`, and fetch the first page.
    #[instrument(level = "debug", skip_all, fields(collection = %self.collection))]
    pub async fn reset(&mut self, filter: Option<FieldFilter>) -> Result<LoadOutcome, StoreError> {
        let ticket = self.begin_reset(filter);
        let result = ticket.fetch(self.store.as_ref()).await;
        self.complete(ticket, result)
    }
}
