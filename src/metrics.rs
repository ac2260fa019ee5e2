use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe every series we emit.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("feed_frames_total", "Frames received from the feed.");
        describe_counter!(
            "feed_frames_dropped_total",
            "Frames dropped as unparseable or without post text."
        );
        describe_counter!("events_matched_total", "Posts matching a tracked term.");
        describe_counter!("events_unmatched_total", "Posts matching no tracked term.");
        describe_counter!(
            "hashtags_recorded_total",
            "Hashtags added to the sliding window (after blocklist)."
        );
        describe_counter!("rolling_ticks_total", "Rolling buckets sealed.");
        describe_gauge!("window_distinct_tags", "Distinct hashtags inside the window.");
        describe_gauge!("rolling_bucket_width_secs", "Current rolling bucket width.");

        Ok(Self { handle })
    }

    /// `GET /metrics` in the Prometheus text format, meant to be merged into
    /// the API router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use http::{Request, StatusCode};
    use tower::ServiceExt as _;

    #[tokio::test]
    async fn metrics_route_serves_exposition_text() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let m = Metrics {
            handle: recorder.handle(),
        };
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("rolling_ticks_total").increment(3);
        });

        let resp = m
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let bytes = body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("rolling_ticks_total 3"));
    }
}
