use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. The recorder is process-global, so
    /// repeated calls (several routers in one test binary) share one handle.
    pub fn init() -> anyhow::Result<Self> {
        static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
        let handle = HANDLE
            .get_or_try_init(|| {
                PrometheusBuilder::new()
                    .install_recorder()
                    .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))
            })?
            .clone();

        describe_all();
        gauge!("app_start_ts").set(chrono::Utc::now().timestamp() as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time descriptions so series show up on /metrics with help text.
pub fn describe_all() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feeds_fetched_total", "Feeds fetched and parsed successfully.");
        describe_counter!("feed_errors_total", "Feeds that failed to fetch or parse.");
        describe_counter!("feed_entries_total", "Articles parsed from feeds.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_counter!("pipeline_runs_total", "Pipeline runs started.");
        describe_counter!(
            "pipeline_date_errors_total",
            "Pipeline runs aborted by an unparseable date."
        );
        describe_counter!(
            "articles_kept_total",
            "Articles surviving keyword, region and date filters."
        );
        describe_counter!("chart_render_errors_total", "Topic chart write failures.");
        describe_counter!("country_toggles_total", "Country selection toggles.");
        describe_counter!("geocode_errors_total", "Reverse geocoding failures.");
    });
}
