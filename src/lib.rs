// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod blocklist;
pub mod chat;
pub mod clock;
pub mod config;
pub mod engine;
pub mod feed;
pub mod filter;
pub mod letters;
pub mod metrics;
pub mod rolling;
pub mod runtime;
pub mod snapshot;
pub mod telemetry;
pub mod terms;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::engine::{AggregationState, Controller, Outcome};
pub use crate::feed::{Event, FeedSource};
pub use crate::snapshot::Snapshot;

use std::sync::Arc;

use crate::blocklist::Blocklist;
use crate::clock::SystemClock;
use crate::config::{AggregationParams, Settings};
use crate::feed::JetstreamFeed;

/// Build the full application (controller task + router) from settings.
/// The blocklist is loaded once here; failures leave it empty. The
/// controller task is supervised so its end is always logged.
pub async fn app(settings: &Settings) -> (axum::Router, runtime::AppHandle) {
    let blocklist = Blocklist::load_or_empty(&settings.blocklist).await;
    let controller = Controller::new(
        settings.policy,
        blocklist,
        Arc::new(SystemClock),
        AggregationParams::default(),
    );
    let feed = Arc::new(JetstreamFeed::new(settings.feed_url.clone()));
    let (handle, task) = runtime::spawn(controller, feed);
    tokio::spawn(runtime::supervise(task));
    let router = api::router(api::AppState {
        handle: handle.clone(),
    });
    (router, handle)
}
