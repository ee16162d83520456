// tests/api_http.rs
//
// HTTP-level tests for the router without opening sockets.
// Feeds come from fixtures, geocoding from a static table, and the chart is
// written into a temp dir. We exercise the router via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /
// - POST /            (results, 400 on bad dates, 500 on missing feed list)
// - POST /get_country (cookie + toggle, 500 on geocoder failure)
// - GET /static/...   (chart written by the previous POST)

use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt as _; // for `oneshot`

use energy_news_aggregator::chart::SvgPieChart;
use energy_news_aggregator::geocode::StaticGeocoder;
use energy_news_aggregator::ingest::providers::FixtureFeedSource;
use energy_news_aggregator::{create_router, AppConfig, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

const GRID_RSS: &str = include_str!("fixtures/grid_rss.xml");
const OFFSHORE_ATOM: &str = include_str!("fixtures/offshore_atom.xml");
const MALFORMED: &str = include_str!("fixtures/malformed.xml");

struct Harness {
    _tmp: TempDir,
    app: Router,
    chart_path: PathBuf,
}

const FEED_URLS: &[&str] = &[
    "https://grid.example/rss",
    "https://offshore.example/atom",
    "https://broken.example/rss",
];

fn default_feeds() -> FixtureFeedSource {
    FixtureFeedSource::new()
        .with_feed(FEED_URLS[0], GRID_RSS)
        .with_feed(FEED_URLS[1], OFFSHORE_ATOM)
        .with_feed(FEED_URLS[2], MALFORMED)
}

fn default_geocoder() -> StaticGeocoder {
    StaticGeocoder::new()
        .with_country(52.5, 13.4, "Germany")
        .with_country(48.8, 2.3, "France")
}

/// Router wired like production, but with in-memory collaborators.
fn harness_with(
    feeds: FixtureFeedSource,
    urls: &[&str],
    geocoder: StaticGeocoder,
    write_list: bool,
) -> Harness {
    let tmp = tempfile::tempdir().expect("tempdir");
    let static_dir = tmp.path().join("static");
    let chart_path = static_dir.join("topic_pie_chart.svg");
    let feed_list = tmp.path().join("feed_links.csv");
    if write_list {
        let csv: String = urls.iter().map(|u| format!("{u},fixture\n")).collect();
        fs::write(&feed_list, csv).expect("write feed list");
    }

    let config = AppConfig {
        feed_list_path: feed_list,
        chart_path: chart_path.clone(),
        static_dir,
        metrics_enabled: false,
        ..AppConfig::default()
    };
    let state = AppState::new(
        config,
        Arc::new(feeds),
        Arc::new(geocoder),
        Arc::new(SvgPieChart::new(chart_path.clone())),
    );
    let app = create_router(state).expect("router");
    Harness {
        _tmp: tmp,
        app,
        chart_path,
    }
}

fn harness() -> Harness {
    harness_with(default_feeds(), FEED_URLS, default_geocoder(), true)
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    String::from_utf8(bytes).expect("utf8")
}

fn search(form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .expect("build POST /")
}

fn locate(lat: f64, lon: f64, cookie: Option<&str>) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri("/get_country")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(c) = cookie {
        b = b.header(header::COOKIE, c);
    }
    b.body(Body::from(
        serde_json::json!({ "latitude": lat, "longitude": lon }).to_string(),
    ))
    .expect("build POST /get_country")
}

#[tokio::test]
async fn health_returns_ok() {
    let h = harness();
    let resp = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await.trim(), "ok");
}

#[tokio::test]
async fn index_get_renders_empty_form() {
    let h = harness();
    let resp = h
        .app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(resp).await;
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    assert!(html.contains(&format!(r#"name="start-date" type="date" value="{today}""#)));
    assert!(html.contains("/get_country"));
    assert!(!html.contains("id=\"positive\""));
}

#[tokio::test]
async fn search_renders_buckets_and_writes_chart() {
    let h = harness();
    let resp = h
        .app
        .clone()
        .oneshot(search("keywords=&start-date=2024-01-01&end-date=&region="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(resp).await;
    assert!(html.contains("Positive (2)"), "{html}");
    assert!(html.contains("Neutral (1)"));
    assert!(html.contains("Negative (1)"));
    assert!(html.contains("Solar energy boom lifts rooftop installs"));
    assert!(html.contains("Offshore wind energy auction draws strong bids"));
    assert!(html.contains("Energy crisis deepens as oil and gas shortage spreads"));
    // Outside the window and undated entries never show up.
    assert!(!html.contains("Old energy story"));
    assert!(!html.contains("Undated wind energy note"));
    assert!(html.contains("src=\"/static/topic_pie_chart.svg?v="));

    let svg = fs::read_to_string(&h.chart_path).expect("chart written");
    assert!(svg.contains("Share of Topics in News Articles"));
    assert!(svg.contains(">natural gas<"));

    // The chart is reachable under the static prefix.
    let resp = h
        .app
        .oneshot(
            Request::get("/static/topic_pie_chart.svg")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.starts_with("<svg"));
}

#[tokio::test]
async fn search_echoes_inputs() {
    let h = harness();
    let resp = h
        .app
        .oneshot(search("keywords=solar%2C+wind&start-date=2024-03-01&end-date=2024-03-31&region=Spain"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains(r#"value="solar, wind""#));
    assert!(html.contains(r#"value="2024-03-31""#));
    assert!(html.contains(r#"value="Spain""#));
    // energy + solar + Spain
    assert!(html.contains("Positive (1)"), "{html}");
}

#[tokio::test]
async fn unparseable_start_date_is_400() {
    let h = harness();
    let resp = h
        .app
        .oneshot(search("keywords=&start-date=yesterday-ish&end-date=&region="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = body_text(resp).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains("yesterday-ish"));
}

#[tokio::test]
async fn unparseable_published_date_is_400() {
    let bad = r#"<rss version="2.0"><channel><item>
        <title>Energy news from the future</title>
        <description>Sometime soon</description>
        <pubDate>sometime soon</pubDate>
    </item></channel></rss>"#;
    let feeds = default_feeds().with_feed("https://odd.example/rss", bad);
    let mut urls = FEED_URLS.to_vec();
    urls.push("https://odd.example/rss");
    let h = harness_with(feeds, &urls, default_geocoder(), true);

    let resp = h
        .app
        .oneshot(search("keywords=&start-date=2024-01-01&end-date=&region="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("published"));
}

#[tokio::test]
async fn missing_feed_list_is_500() {
    let h = harness_with(default_feeds(), FEED_URLS, default_geocoder(), false);
    let resp = h
        .app
        .oneshot(search("keywords=&start-date=2024-01-01&end-date=&region="))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(resp).await.contains("Failed to read the feed list."));
}

#[tokio::test]
async fn get_country_toggles_per_session() {
    let h = harness();

    // First call: new session, Germany selected.
    let resp = h.app.clone().oneshot(locate(52.52, 13.40, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie")
        .to_string();
    assert!(set_cookie.starts_with("news_session="));
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    let id = cookie.trim_start_matches("news_session=");
    assert_eq!(uuid::Uuid::parse_str(id).unwrap().get_version_num(), 4);

    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["country"], "Germany");
    assert_eq!(v["selected_countries"], serde_json::json!(["Germany"]));

    // Same session adds France, then removes Germany.
    let resp = h
        .app
        .clone()
        .oneshot(locate(48.81, 2.32, Some(&cookie)))
        .await
        .unwrap();
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["selected_countries"], serde_json::json!(["Germany", "France"]));

    let resp = h
        .app
        .clone()
        .oneshot(locate(52.52, 13.40, Some(&cookie)))
        .await
        .unwrap();
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["selected_countries"], serde_json::json!(["France"]));

    // A fresh session starts empty; the open sea has no country.
    let resp = h.app.oneshot(locate(0.0, -30.0, None)).await.unwrap();
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert!(v["country"].is_null());
    assert_eq!(v["selected_countries"], serde_json::json!([]));
}

#[tokio::test]
async fn selected_country_feeds_the_search() {
    let h = harness();
    let resp = h.app.clone().oneshot(locate(52.52, 13.40, None)).await.unwrap();
    let cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("session cookie")
        .to_string();

    // A region nothing mentions: only the selected country can match.
    let form = "keywords=&start-date=2024-01-01&end-date=&region=Atlantis";
    let without = h.app.clone().oneshot(search(form)).await.unwrap();
    let html = body_text(without).await;
    assert!(!html.contains("Energy prices in Germany"));

    let mut req = search(form);
    req.headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    let with = h.app.oneshot(req).await.unwrap();
    let html = body_text(with).await;
    assert!(html.contains("Energy prices in Germany"));
    assert!(html.contains("Neutral (1)"));
    assert!(html.contains("Selected countries: Germany"));
}

#[tokio::test]
async fn geocoder_failure_is_500_json() {
    let h = harness_with(default_feeds(), FEED_URLS, StaticGeocoder::failing(), true);
    let resp = h.app.oneshot(locate(52.52, 13.40, None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let v: Json = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v, serde_json::json!({ "error": "Failed to fetch country" }));
}
