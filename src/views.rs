//! Site routes and the views that drive loaders.
//!
//! A [`Route`] is parsed from a site path such as `/sports` or
//! `/author/Sam%20Ortiz`. Listing routes resolve to a [`ViewSpec`] (which
//! collection, page size, filter, whether "load more" is offered) and are
//! driven through a [`ListingView`]. Article pages resolve to a single-record
//! [`DetailView`].
//!
//! # Routes
//!
//! | Path | View |
//! |------|------|
//! | `/` | Home: six latest articles, no "load more" |
//! | `/news`, `/features`, `/forum`, `/arts`, `/sports` | Articles filtered by section |
//! | `/article/:id` | Article detail |
//! | `/author/:authorName` | Articles filtered by author |
//! | `/newsletters` | Newsletter archive |
//! | `/print-issues` | Print issue archive |
//! | `/about` | Team members, one page of up to 50 |
//! | anything else | Redirect to `/` |
//!
//! Section listings honor a `section` query parameter that overrides the
//! path's section; `section=All` lists every article.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::StoreError;
use crate::filter::FieldFilter;
use crate::loader::{LoadOutcome, LoaderPhase, PaginatedLoader};
use crate::models::{
    Collection, FEATURED_PAGE_SIZE, LISTING_PAGE_SIZE, REFERENCE_PAGE_SIZE, Record,
};
use crate::store::CollectionStore;

/// Newspaper sections as `(path slug, section name)`.
pub const SECTIONS: [(&str, &str); 5] = [
    ("news", "News"),
    ("features", "Features"),
    ("forum", "Forum"),
    ("arts", "Arts & Leisure"),
    ("sports", "Sports"),
];

static ARTICLE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/article/([^/]+)$").expect("valid article route pattern"));
static AUTHOR_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/author/([^/]+)$").expect("valid author route pattern"));

/// Base used to parse bare site paths with the `url` crate.
static SITE_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse("http://site.invalid/").expect("valid site base url"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// Article listing; `section` is `None` for "All".
    Section { slug: String, section: Option<String> },
    Article { id: String },
    Author { name: String },
    Newsletters,
    PrintIssues,
    About,
    /// Unmatched path; the site sends these to the home page.
    Redirect { from: String },
}

impl Route {
    /// Parse a site path, with or without a query string.
    ///
    /// Only absolute site paths are routed. Relative and scheme-relative
    /// inputs (`news`, `//host/news`) redirect home.
    pub fn parse(input: &str) -> Route {
        let trimmed = input.trim();
        let site_absolute = trimmed.starts_with('/')
            && !matches!(trimmed.chars().nth(1), Some('/') | Some('\\'));
        if !site_absolute {
            debug!(input, "Not a site-absolute path");
            return Route::Redirect {
                from: input.to_string(),
            };
        }
        let Ok(url) = SITE_BASE.join(trimmed) else {
            return Route::Redirect {
                from: input.to_string(),
            };
        };
        let path = match url.path().trim_end_matches('/') {
            "" => "/",
            p => p,
        };

        let route = match path {
            "/" => Route::Home,
            "/newsletters" => Route::Newsletters,
            "/print-issues" => Route::PrintIssues,
            "/about" => Route::About,
            _ => {
                if let Some((slug, name)) =
                    SECTIONS.iter().find(|(slug, _)| path == format!("/{slug}"))
                {
                    let override_section = url
                        .query_pairs()
                        .find(|(key, _)| key == "section")
                        .map(|(_, value)| value.into_owned());
                    let section = match override_section.as_deref() {
                        Some(value) if value.eq_ignore_ascii_case("all") => None,
                        Some(value) if !value.trim().is_empty() => Some(value.to_string()),
                        _ => Some(name.to_string()),
                    };
                    Route::Section {
                        slug: slug.to_string(),
                        section,
                    }
                } else if let Some(caps) = ARTICLE_PATH.captures(path) {
                    Route::Article {
                        id: decode_segment(&caps[1]).into_owned(),
                    }
                } else if let Some(caps) = AUTHOR_PATH.captures(path) {
                    Route::Author {
                        name: decode_segment(&caps[1]).into_owned(),
                    }
                } else {
                    Route::Redirect {
                        from: input.to_string(),
                    }
                }
            }
        };
        debug!(input, ?route, "Parsed route");
        route
    }

    /// The route a redirect lands on; every other route is its own target.
    pub fn resolve(self) -> Route {
        match self {
            Route::Redirect { from } => {
                info!(%from, "Unknown path; redirecting to /");
                Route::Home
            }
            other => other,
        }
    }

    /// Canonical site path for this route.
    pub fn path(&self) -> String {
        match self {
            Route::Home | Route::Redirect { .. } => "/".to_string(),
            Route::Section { slug, section } => {
                let default = SECTIONS
                    .iter()
                    .find(|(s, _)| *s == slug.as_str())
                    .map(|(_, name)| *name);
                match section.as_deref() {
                    Some(name) if Some(name) == default => format!("/{slug}"),
                    Some(name) => format!("/{slug}?section={}", urlencoding::encode(name)),
                    None => format!("/{slug}?section=All"),
                }
            }
            Route::Article { id } => format!("/article/{}", urlencoding::encode(id)),
            Route::Author { name } => author_path(name),
            Route::Newsletters => "/newsletters".to_string(),
            Route::PrintIssues => "/print-issues".to_string(),
            Route::About => "/about".to_string(),
        }
    }

    /// What to show for this route. Redirects are resolved first.
    pub fn view(&self) -> View {
        let listing = |collection: Collection,
                       page_size: usize,
                       filter: Option<FieldFilter>,
                       load_more: bool,
                       heading: String,
                       empty_message: &'static str| {
            View::Listing(ViewSpec {
                collection,
                page_size,
                filter,
                load_more,
                heading,
                empty_message,
            })
        };

        match self {
            Route::Home | Route::Redirect { .. } => listing(
                Collection::Articles,
                FEATURED_PAGE_SIZE,
                None,
                false,
                "Latest Stories".to_string(),
                "No featured stories yet.",
            ),
            Route::Section { section, .. } => listing(
                Collection::Articles,
                LISTING_PAGE_SIZE,
                section.as_deref().map(FieldFilter::section),
                true,
                section.clone().unwrap_or_else(|| "All Articles".to_string()),
                "No articles found in this section.",
            ),
            Route::Author { name } => listing(
                Collection::Articles,
                LISTING_PAGE_SIZE,
                Some(FieldFilter::author(name)),
                true,
                name.clone(),
                "No articles found for this author.",
            ),
            Route::Newsletters => listing(
                Collection::Newsletters,
                LISTING_PAGE_SIZE,
                None,
                true,
                "Newsletter Archive".to_string(),
                "No newsletters available yet.",
            ),
            Route::PrintIssues => listing(
                Collection::PrintIssues,
                LISTING_PAGE_SIZE,
                None,
                true,
                "Print Issues Archive".to_string(),
                "No print issues available yet.",
            ),
            Route::About => listing(
                Collection::TeamMembers,
                REFERENCE_PAGE_SIZE,
                None,
                false,
                "Our Team".to_string(),
                "No team members listed yet.",
            ),
            Route::Article { id } => View::Detail {
                collection: Collection::Articles,
                id: id.clone(),
            },
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Site path of an author's archive.
pub fn author_path(name: &str) -> String {
    format!("/author/{}", urlencoding::encode(name))
}

fn decode_segment(segment: &str) -> Cow<'_, str> {
    urlencoding::decode(segment).unwrap_or_else(|e| {
        warn!(segment, error = %e, "Path segment is not valid UTF-8 after decoding");
        Cow::Borrowed(segment)
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Listing(ViewSpec),
    Detail { collection: Collection, id: String },
}

/// Configuration of one listing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSpec {
    pub collection: Collection,
    pub page_size: usize,
    /// Filter installed when the view mounts.
    pub filter: Option<FieldFilter>,
    /// Whether the view offers "load more" at all.
    pub load_more: bool,
    pub heading: String,
    /// Shown when the view has loaded and holds no records.
    pub empty_message: &'static str,
}

impl ViewSpec {
    /// Label of the "load more" affordance.
    pub fn load_more_label(&self) -> &'static str {
        match self.collection {
            Collection::Articles => "Load More Articles",
            Collection::Newsletters => "Load More Newsletters",
            Collection::PrintIssues => "Load More Issues",
            Collection::TeamMembers => "Load More",
        }
    }
}

/// A listing page bound to its own loader.
///
/// The view is the only owner of its loader. Filter changes reset the loader
/// explicitly instead of building a new one, which has the same effect.
pub struct ListingView<S> {
    spec: ViewSpec,
    loader: PaginatedLoader<S>,
    last_error: Option<String>,
}

impl<S> fmt::Debug for ListingView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingView")
            .field("spec", &self.spec)
            .field("loader", &self.loader)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl<S: CollectionStore> ListingView<S> {
    pub fn new(store: Arc<S>, spec: ViewSpec) -> Self {
        let loader = PaginatedLoader::new(store, spec.collection, spec.page_size);
        Self {
            spec,
            loader,
            last_error: None,
        }
    }

    /// Activate the view with the given filter and fetch the first page.
    #[instrument(level = "info", skip_all, fields(collection = %self.spec.collection, heading = %self.spec.heading))]
    pub async fn on_mount(&mut self, filter: Option<FieldFilter>) -> Result<LoadOutcome, StoreError> {
        let result = self.loader.reset(filter).await;
        self.record(result)
    }

    /// Activate the view with the filter from its spec.
    pub async fn mount(&mut self) -> Result<LoadOutcome, StoreError> {
        let filter = self.spec.filter.clone();
        self.on_mount(filter).await
    }

    /// Switch to a different filter, starting over from the first page.
    ///
    /// Passing the filter that is already active does nothing once the view
    /// has loaded at least once.
    #[instrument(level = "info", skip_all, fields(collection = %self.spec.collection))]
    pub async fn on_filter_change(
        &mut self,
        filter: Option<FieldFilter>,
    ) -> Result<LoadOutcome, StoreError> {
        if self.loader.phase() != LoaderPhase::Idle && self.loader.filter() == filter.as_ref() {
            debug!("Filter unchanged; keeping loaded records");
            return Ok(LoadOutcome::Skipped);
        }
        let result = self.loader.reset(filter).await;
        self.record(result)
    }

    /// Fetch the next page if the view offers "load more".
    #[instrument(level = "info", skip_all, fields(collection = %self.spec.collection, offset = self.loader.next_offset()))]
    pub async fn on_load_more_requested(&mut self) -> Result<LoadOutcome, StoreError> {
        if !self.spec.load_more {
            debug!("View does not offer load more");
            return Ok(LoadOutcome::Skipped);
        }
        let result = self.loader.load_next().await;
        self.record(result)
    }

    fn record(
        &mut self,
        result: Result<LoadOutcome, StoreError>,
    ) -> Result<LoadOutcome, StoreError> {
        match &result {
            Ok(LoadOutcome::Appended { .. }) => self.last_error = None,
            Ok(_) => {}
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    pub fn loader(&self) -> &PaginatedLoader<S> {
        &self.loader
    }

    /// Mutable access for callers driving the split-phase loader API.
    pub fn loader_mut(&mut self) -> &mut PaginatedLoader<S> {
        &mut self.loader
    }

    pub fn records(&self) -> &[Record] {
        self.loader.accumulated()
    }

    pub fn has_more(&self) -> bool {
        self.loader.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Whether the "load more" affordance is shown.
    pub fn can_load_more(&self) -> bool {
        self.spec.load_more && self.loader.can_load_more()
    }

    /// The most recent failure, cleared by the next successful page.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Outcome of a detail lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum DetailState {
    Found(Record),
    /// The id does not exist; rendered as a "not found" page, never as an empty record.
    NotFound,
    Failed(String),
}

/// A single-record page such as `/article/:id`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub collection: Collection,
    pub id: String,
    pub state: DetailState,
}

impl DetailView {
    #[instrument(level = "info", skip(store))]
    pub async fn load<S: CollectionStore + ?Sized>(
        store: &S,
        collection: Collection,
        id: &str,
    ) -> DetailView {
        let state = match store.get_by_id(collection, id).await {
            Ok(record) => DetailState::Found(record),
            Err(e) if e.is_not_found() => {
                info!("Record not found");
                DetailState::NotFound
            }
            Err(e) => {
                warn!(error = %e, "Detail fetch failed");
                DetailState::Failed(e.to_string())
            }
        };
        DetailView {
            collection,
            id: id.to_string(),
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn test_parse_fixed_routes() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/newsletters"), Route::Newsletters);
        assert_eq!(Route::parse("/print-issues/"), Route::PrintIssues);
        assert_eq!(Route::parse("/about"), Route::About);
    }

    #[test]
    fn test_parse_sections() {
        assert_eq!(
            Route::parse("/arts"),
            Route::Section {
                slug: "arts".to_string(),
                section: Some("Arts & Leisure".to_string())
            }
        );
        assert_eq!(
            Route::parse("/news?section=Sports"),
            Route::Section {
                slug: "news".to_string(),
                section: Some("Sports".to_string())
            }
        );
        assert_eq!(
            Route::parse("/news?section=All"),
            Route::Section {
                slug: "news".to_string(),
                section: None
            }
        );
    }

    #[test]
    fn test_parse_article_and_author() {
        assert_eq!(
            Route::parse("/article/abc-123"),
            Route::Article {
                id: "abc-123".to_string()
            }
        );
        assert_eq!(
            Route::parse("/author/Sam%20Ortiz"),
            Route::Author {
                name: "Sam Ortiz".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_paths_redirect_home() {
        for path in ["/nope", "/article", "/article/a/b", "/author/", "/sports/extra"] {
            let route = Route::parse(path);
            assert!(matches!(route, Route::Redirect { .. }), "{path} -> {route:?}");
            assert_eq!(route.resolve(), Route::Home);
        }
    }

    #[test]
    fn test_relative_and_scheme_relative_paths_redirect_home() {
        for path in ["//evil.example/news", "news", "/\\evil.example/news", "sports?section=All", ""] {
            let route = Route::parse(path);
            assert_eq!(
                route,
                Route::Redirect {
                    from: path.to_string()
                },
                "{path:?}"
            );
            assert_eq!(route.resolve(), Route::Home);
        }
        assert_eq!(Route::parse(" /news ").path(), "/news");
    }

    #[test]
    fn test_route_paths_round_trip() {
        for path in [
            "/",
            "/sports",
            "/news?section=Forum",
            "/features?section=All",
            "/article/a-1",
            "/author/Sam%20Ortiz",
            "/newsletters",
            "/print-issues",
            "/about",
        ] {
            assert_eq!(Route::parse(path).path(), path);
        }
    }

    #[test]
    fn test_view_specs() {
        let View::Listing(home) = Route::Home.view() else {
            panic!("home is a listing");
        };
        assert_eq!(home.page_size, 6);
        assert!(!home.load_more);

        let View::Listing(sports) = Route::parse("/sports").view() else {
            panic!("sports is a listing");
        };
        assert_eq!(sports.page_size, 12);
        assert_eq!(sports.filter, Some(FieldFilter::section("Sports")));
        assert_eq!(sports.load_more_label(), "Load More Articles");

        let View::Listing(about) = Route::About.view() else {
            panic!("about is a listing");
        };
        assert_eq!(about.collection, Collection::TeamMembers);
        assert_eq!(about.page_size, 50);

        assert_eq!(
            Route::parse("/article/x").view(),
            View::Detail {
                collection: Collection::Articles,
                id: "x".to_string()
            }
        );
    }

    fn newsroom() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.extend(
            Collection::Articles,
            (0..16).map(|i| {
                let section = if i % 2 == 0 { "News" } else { "Sports" };
                let author = if i % 4 == 0 { "Sam Ortiz" } else { "Lee Chen" };
                Record::new(format!("a-{i}"))
                    .with("sectionCategory", section)
                    .with("authorName", author)
            }),
        );
        Arc::new(store)
    }

    fn listing(route: &str, store: Arc<MemoryStore>) -> ListingView<MemoryStore> {
        match Route::parse(route).resolve().view() {
            View::Listing(spec) => ListingView::new(store, spec),
            View::Detail { .. } => panic!("{route} is not a listing"),
        }
    }

    #[tokio::test]
    async fn test_section_view_mount_and_load_more() {
        let mut view = listing("/news", newsroom());
        view.mount().await.unwrap();
        assert_eq!(view.records().len(), 6);
        assert!(view.can_load_more());

        view.on_load_more_requested().await.unwrap();
        assert_eq!(view.records().len(), 8);
        assert!(!view.can_load_more());
    }

    #[tokio::test]
    async fn test_author_view_matches_case_insensitively() {
        let mut view = listing("/author/sam%20ortiz", newsroom());
        view.mount().await.unwrap();
        let ids: Vec<_> = view.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a-0", "a-4", "a-8"]);
    }

    #[tokio::test]
    async fn test_home_view_never_loads_more() {
        let store = newsroom();
        let mut view = listing("/", Arc::clone(&store));
        view.mount().await.unwrap();
        assert_eq!(view.records().len(), 6);
        assert!(view.has_more());
        assert!(!view.can_load_more());

        assert_eq!(
            view.on_load_more_requested().await.unwrap(),
            LoadOutcome::Skipped
        );
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn test_filter_change_resets_and_same_filter_is_noop() {
        let store = newsroom();
        let mut view = listing("/news", Arc::clone(&store));
        view.mount().await.unwrap();
        view.on_load_more_requested().await.unwrap();
        assert_eq!(view.records().len(), 8);

        let outcome = view
            .on_filter_change(Some(FieldFilter::section("News")))
            .await
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Skipped);
        assert_eq!(view.records().len(), 8);

        view.on_filter_change(Some(FieldFilter::section("Sports")))
            .await
            .unwrap();
        assert_eq!(view.records().len(), 6);
        assert!(view.records().iter().all(|r| r.text("sectionCategory") == Some("Sports")));
        assert_eq!(view.loader().next_offset(), 12);

        view.on_filter_change(None).await.unwrap();
        assert_eq!(view.records().len(), 12);
    }

    #[tokio::test]
    async fn test_listing_failure_is_reported_and_cleared() {
        let store = newsroom();
        let mut view = listing("/news", Arc::clone(&store));
        store.fail_next(1);

        assert!(view.mount().await.is_err());
        assert!(view.last_error().is_some());
        assert!(view.records().is_empty());
        assert!(!view.is_loading());

        view.on_load_more_requested().await.unwrap();
        assert_eq!(view.records().len(), 6);
        assert_eq!(view.last_error(), None);
    }

    #[tokio::test]
    async fn test_detail_view_states() {
        let store = newsroom();

        let found = DetailView::load(store.as_ref(), Collection::Articles, "a-3").await;
        assert!(matches!(found.state, DetailState::Found(ref r) if r.id == "a-3"));

        let missing = DetailView::load(store.as_ref(), Collection::Articles, "missing-id").await;
        assert_eq!(missing.state, DetailState::NotFound);

        store.fail_next(1);
        let failed = DetailView::load(store.as_ref(), Collection::Articles, "a-3").await;
        assert!(matches!(failed.state, DetailState::Failed(_)));
    }
}
