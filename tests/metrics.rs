// tests/metrics.rs
use axum::body::{self, Body};
use http::{header, Request, StatusCode};
use axum::Router;
use std::fs;
use std::sync::Arc;
use tower::ServiceExt;

use energy_news_aggregator::chart::SvgPieChart;
use energy_news_aggregator::geocode::StaticGeocoder;
use energy_news_aggregator::ingest::providers::FixtureFeedSource;
use energy_news_aggregator::{create_router, AppConfig, AppState};

// Build the in-process app with the Prometheus route mounted.
fn build_app(tmp: &tempfile::TempDir) -> Router {
    let list = tmp.path().join("feed_links.csv");
    fs::write(&list, "https://grid.example/rss\nhttps://down.example/rss\n").unwrap();
    let chart = tmp.path().join("static/topic_pie_chart.svg");

    let config = AppConfig {
        feed_list_path: list,
        chart_path: chart.clone(),
        static_dir: tmp.path().join("static"),
        metrics_enabled: true,
        ..AppConfig::default()
    };
    let feeds = FixtureFeedSource::new()
        .with_feed("https://grid.example/rss", include_str!("fixtures/grid_rss.xml"));
    let state = AppState::new(
        config,
        Arc::new(feeds),
        Arc::new(StaticGeocoder::failing()),
        Arc::new(SvgPieChart::new(chart)),
    );
    create_router(state).expect("router with metrics")
}

#[tokio::test]
async fn metrics_endpoint_reports_pipeline_and_feed_counters() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_app(&tmp);

    // 1) One search: one good feed, one unreachable
    let r1 = app
        .clone()
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("keywords=&start-date=2024-01-01&end-date=&region="))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r1.status(), StatusCode::OK);

    // 2) One failed geocode
    let r2 = app
        .clone()
        .oneshot(
            Request::post("/get_country")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"latitude":1.0,"longitude":2.0}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(r2.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // 3) Scrape (same process so counters persist)
    let m = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(m.status(), StatusCode::OK);
    // axum::body::to_bytes requires an explicit limit
    let body = body::to_bytes(m.into_body(), 1_048_576).await.unwrap(); // 1 MiB
    let text = String::from_utf8(body.to_vec()).unwrap();

    for needle in [
        "feeds_fetched_total",
        "feed_errors_total",
        "feed_entries_total",
        "pipeline_runs_total",
        "articles_kept_total",
        "geocode_errors_total",
        "feed_parse_ms",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
