//! JSON rendering of site pages.
//!
//! The output is an array of page snapshots, one per requested path:
//!
//! ```text
//! [
//!   { "kind": "listing", "path": "/sports", "collection": "articles",
//!     "records": [...], "has_more": true, "next_offset": 12, ... },
//!   { "kind": "detail", "path": "/article/a-1",
//!     "state": { "status": "found", "value": { "_id": "a-1", ... } } }
//! ]
//! ```

use tracing::{error, instrument};

use crate::outputs::RenderedPage;

/// Serialize pages as pretty-printed JSON.
#[instrument(level = "debug", skip_all, fields(pages = pages.len()))]
pub fn render_pages(pages: &[RenderedPage]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(pages)
        .map(|mut json| {
            json.push('\n');
            json
        })
        .inspect_err(|e| error!(error = %e, "Failed to serialize pages"))
}
