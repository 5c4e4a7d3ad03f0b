//! # campus_press
//!
//! Render student newspaper pages from a CRUD collection backend.
//!
//! ## Usage
//!
//! ```sh
//! campus_press --api-url https://cms.example.edu/api /sports /article/abc123
//! ```
//!
//! ## Pipeline
//!
//! 1. **Configure**: Merge CLI flags, environment and `config.yml`
//! 2. **Connect**: Build the store (HTTP with retry, or a fixture file)
//! 3. **Load**: Resolve each path to a view, mount it, request "load more"
//! 4. **Output**: Render all pages as Markdown or JSON

use clap::Parser;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use campus_press::cli::{Cli, OutputFormat};
use campus_press::config::{Settings, load_for_cli};
use campus_press::error::ConfigError;
use campus_press::outputs::{self, DetailSnapshot, ListingSnapshot, RenderedPage, json, markdown};
use campus_press::store::http::HttpStore;
use campus_press::store::memory::MemoryStore;
use campus_press::store::{CollectionStore, RetryStore};
use campus_press::views::{DetailView, ListingView, Route, View};

/// Views rendered at the same time; each owns its own loader.
const PARALLEL_VIEWS: usize = 4;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("campus_press starting up");

    let args = Cli::parse();
    debug!(paths = ?args.paths, pages = args.pages, format = ?args.format, "Parsed CLI arguments");

    let file = load_for_cli(&args)?;
    let settings = Settings::merge(&args, file);
    let pages_per_view = args.pages.max(1);

    let pages = if let Some(fixtures) = &settings.fixtures {
        info!(path = %fixtures.display(), "Serving collections from fixture file");
        let store = Arc::new(MemoryStore::from_fixture_file(fixtures)?);
        render_all(store, &args.paths, pages_per_view).await
    } else if let Some(api_url) = &settings.api_url {
        info!(%api_url, max_retries = settings.max_retries, "Using HTTP collection backend");
        let http = HttpStore::new(api_url, settings.timeout)?;
        let store = Arc::new(RetryStore::new(
            http,
            settings.max_retries,
            settings.retry_base_delay,
        ));
        render_all(store, &args.paths, pages_per_view).await
    } else {
        error!("No collection backend configured");
        return Err(ConfigError::NoStore.into());
    };

    let rendered = match args.format {
        OutputFormat::Markdown => markdown::render_pages(&pages),
        OutputFormat::Json => json::render_pages(&pages)?,
    };
    outputs::write_output(&rendered, args.output.as_deref()).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        pages = pages.len(),
        "Execution complete"
    );
    Ok(())
}

/// Render every path, a few at a time, keeping the order they were given in.
async fn render_all<S: CollectionStore>(
    store: Arc<S>,
    paths: &[String],
    pages_per_view: usize,
) -> Vec<RenderedPage> {
    stream::iter(paths.iter().cloned())
        .map(|path| render_path(Arc::clone(&store), path, pages_per_view))
        .buffered(PARALLEL_VIEWS)
        .collect()
        .await
}

#[instrument(level = "info", skip(store))]
async fn render_path<S: CollectionStore>(
    store: Arc<S>,
    path: String,
    pages_per_view: usize,
) -> RenderedPage {
    let parsed = Route::parse(&path);
    let redirected_from = match &parsed {
        Route::Redirect { from } => Some(from.clone()),
        _ => None,
    };
    let route = parsed.resolve();

    match route.view() {
        View::Detail { collection, id } => {
            let detail = DetailView::load(store.as_ref(), collection, &id).await;
            RenderedPage::Detail(DetailSnapshot::capture(&route, detail))
        }
        View::Listing(spec) => {
            let mut view = ListingView::new(store, spec);
            if let Err(e) = view.mount().await {
                warn!(%route, error = %e, "Initial load failed");
            }

            let mut fetched = 1;
            while fetched < pages_per_view && view.can_load_more() {
                match view.on_load_more_requested().await {
                    Ok(_) => fetched += 1,
                    Err(e) => {
                        warn!(%route, error = %e, "Load more failed; rendering what we have");
                        break;
                    }
                }
            }

            info!(
                %route,
                records = view.records().len(),
                has_more = view.has_more(),
                "View ready"
            );
            RenderedPage::Listing(ListingSnapshot::capture(&route, redirected_from, &view))
        }
    }
}
