//! skypulse — binary entrypoint.
//! Boots the controller task and the Axum HTTP server.

use anyhow::{Context, Result};
use tracing::info;

use skypulse::config::Settings;
use skypulse::metrics::Metrics;
use skypulse::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let settings = Settings::from_env()?;
    init_tracing(settings.json_logs);

    let metrics = Metrics::init()?;
    let (router, _handle) = skypulse::app(&settings).await;
    let router = router.merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("binding {}", settings.bind))?;
    info!(
        bind = %settings.bind,
        policy = %settings.policy,
        feed = %settings.feed_url,
        "skypulse listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .context("http server")?;
    Ok(())
}
