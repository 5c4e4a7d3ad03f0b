//! # campus_press
//!
//! Browse a student newspaper's articles, newsletters, print issues and
//! masthead from a generic CRUD collection backend.
//!
//! ## Architecture
//!
//! 1. **Store**: [`store::CollectionStore`] is the injected backend seam,
//!    with an HTTP client, an in-memory store and a retry decorator
//! 2. **Loader**: [`loader::PaginatedLoader`] fetches fixed-size pages,
//!    filters each page client-side and accumulates results for "load more"
//! 3. **Views**: [`views::Route`] maps site paths to listing or detail views
//!    that own their loaders
//! 4. **Output**: [`outputs`] renders views as Markdown or JSON
//!
//! ## Usage
//!
//! ```ignore
//! let store = Arc::new(MemoryStore::from_fixture_file(Path::new("fixtures.yml"))?);
//! let View::Listing(spec) = Route::parse("/sports").view() else { unreachable!() };
//! let mut view = ListingView::new(store, spec);
//! view.mount().await?;
//! while view.can_load_more() {
//!     view.on_load_more_requested().await?;
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod models;
pub mod outputs;
pub mod store;
pub mod utils;
pub mod views;
