//! Output generation for rendered site pages.
//!
//! A view is first captured into a [`RenderedPage`], a plain serializable
//! snapshot, and then written in one of two formats:
//!
//! - [`markdown`]: Human-readable cards, article pages and empty states
//! - [`json`]: The snapshot itself, for piping into other tools
//!
//! Output goes to stdout unless a file path is given.

pub mod json;
pub mod markdown;

use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::filter::FieldFilter;
use crate::models::{Collection, Record};
use crate::store::CollectionStore;
use crate::utils::ensure_writable_parent;
use crate::views::{DetailState, DetailView, ListingView, Route};

/// One page, ready to render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedPage {
    Listing(ListingSnapshot),
    Detail(DetailSnapshot),
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingSnapshot {
    pub path: String,
    /// Original path when the request was redirected here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected_from: Option<String>,
    pub heading: String,
    pub collection: Collection,
    pub filter: Option<FieldFilter>,
    pub records: Vec<Record>,
    pub has_more: bool,
    pub can_load_more: bool,
    pub next_offset: usize,
    pub error: Option<String>,
    #[serde(skip)]
    pub empty_message: &'static str,
    #[serde(skip)]
    pub load_more_label: &'static str,
    /// Set on author archives, which show a publication count.
    #[serde(skip)]
    pub author: Option<String>,
}

impl ListingSnapshot {
    pub fn capture<S: CollectionStore>(
        route: &Route,
        redirected_from: Option<String>,
        view: &ListingView<S>,
    ) -> Self {
        let spec = view.spec();
        Self {
            path: route.path(),
            redirected_from,
            heading: spec.heading.clone(),
            collection: spec.collection,
            filter: view.loader().filter().cloned(),
            records: view.records().to_vec(),
            has_more: view.has_more(),
            can_load_more: view.can_load_more(),
            next_offset: view.loader().next_offset(),
            error: view.last_error().map(str::to_string),
            empty_message: spec.empty_message,
            load_more_label: spec.load_more_label(),
            author: match route {
                Route::Author { name } => Some(name.clone()),
                _ => None,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailSnapshot {
    pub path: String,
    pub collection: Collection,
    pub id: String,
    pub state: DetailState,
}

impl DetailSnapshot {
    pub fn capture(route: &Route, detail: DetailView) -> Self {
        Self {
            path: route.path(),
            collection: detail.collection,
            id: detail.id,
            state: detail.state,
        }
    }
}

/// Write rendered output to `path`, or to stdout when no path is given.
#[instrument(level = "info", skip_all, fields(bytes = content.len()))]
pub async fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => {
            ensure_writable_parent(path).await?;
            fs::write(path, content).await?;
            info!(path = %path.display(), "Wrote output file");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(content.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::views::View;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_capture_listing_snapshot() {
        let store = MemoryStore::new();
        store.extend(
            Collection::Articles,
            (0..3).map(|i| Record::new(format!("a-{i}")).with("authorName", "Sam Ortiz")),
        );
        let route = Route::parse("/author/Sam%20Ortiz");
        let View::Listing(spec) = route.view() else {
            panic!("author archive is a listing");
        };
        let mut view = ListingView::new(Arc::new(store), spec);
        view.mount().await.unwrap();

        let snapshot = ListingSnapshot::capture(&route, None, &view);
        assert_eq!(snapshot.path, "/author/Sam%20Ortiz");
        assert_eq!(snapshot.records.len(), 3);
        assert_eq!(snapshot.author.as_deref(), Some("Sam Ortiz"));
        assert!(!snapshot.can_load_more);
        assert_eq!(snapshot.next_offset, 12);
    }

    #[tokio::test]
    async fn test_write_output_to_file() {
        let path = std::env::temp_dir()
            .join(format!("campus_press_write_{}", std::process::id()))
            .join("out.md");
        write_output("# Hello\n", Some(&path)).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Hello\n");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
