use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::chart::{ChartRenderer, SvgPieChart};
use crate::config::AppConfig;
use crate::geocode::{Geocoder, NominatimGeocoder};
use crate::ingest::providers::HttpFeedSource;
use crate::ingest::{fetch_all, load_feed_links, FeedSource};
use crate::metrics::Metrics;
use crate::pipeline::{self, PipelineRequest};
use crate::render::{render_page, FormValues, Page};
use crate::sentiment::SentimentScorer;
use crate::session::{
    new_session_id, session_fingerprint, session_id_from_cookie, SelectedCountries, SessionStore,
    SESSION_COOKIE,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    feeds: Arc<dyn FeedSource>,
    geocoder: Arc<dyn Geocoder>,
    chart: Arc<dyn ChartRenderer>,
    sessions: Arc<SessionStore>,
    scorer: SentimentScorer,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        feeds: Arc<dyn FeedSource>,
        geocoder: Arc<dyn Geocoder>,
        chart: Arc<dyn ChartRenderer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            feeds,
            geocoder,
            chart,
            sessions: Arc::new(SessionStore::new()),
            scorer: SentimentScorer::new(),
        }
    }

    /// Production wiring: HTTP feeds, Nominatim, SVG chart at `chart_path`.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let timeout = config.http_timeout();
        let feeds = HttpFeedSource::new(&config.user_agent, timeout)?;
        let geocoder = NominatimGeocoder::new(config.geocoder_url.clone(), &config.user_agent, timeout)?;
        let chart = SvgPieChart::new(config.chart_path.clone());
        Ok(Self::new(
            config,
            Arc::new(feeds),
            Arc::new(geocoder),
            Arc::new(chart),
        ))
    }
}

pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let static_prefix = state.config.static_url_prefix.clone();
    let static_dir: PathBuf = state.config.static_dir.clone();
    let metrics_enabled = state.config.metrics_enabled;

    let mut router = Router::new()
        .route("/", get(index_get).post(index_post))
        .route("/get_country", post(get_country))
        .route("/health", get(|| async { "ok" }))
        .nest_service(&static_prefix, ServeDir::new(static_dir))
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if metrics_enabled {
        router = router.merge(Metrics::init()?.router());
    }
    Ok(router)
}

#[derive(Debug, Default, Deserialize)]
struct SearchForm {
    #[serde(default)]
    keywords: String,
    #[serde(rename = "start-date", default)]
    start_date: String,
    #[serde(rename = "end-date", default)]
    end_date: String,
    #[serde(default)]
    region: String,
}

impl SearchForm {
    fn values(&self) -> FormValues {
        FormValues {
            keywords: self.keywords.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            region: self.region.clone(),
        }
    }
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

fn session_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(session_id_from_cookie)
}

fn selected_for(state: &AppState, headers: &HeaderMap) -> SelectedCountries {
    session_from(headers)
        .map(|id| state.sessions.snapshot(&id))
        .unwrap_or_default()
}

fn html_page(status: StatusCode, page: &Page<'_>) -> Response {
    (status, Html(render_page(page))).into_response()
}

async fn index_get(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let countries = selected_for(&state, &headers);
    html_page(
        StatusCode::OK,
        &Page {
            current_date: today(),
            countries: Some(&countries),
            ..Default::default()
        },
    )
}

async fn index_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    let countries = selected_for(&state, &headers);
    let base = Page {
        current_date: today(),
        form: form.values(),
        countries: Some(&countries),
        ..Default::default()
    };

    let links = match load_feed_links(&state.config.feed_list_path) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = ?e, "feed list unavailable");
            return html_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                &Page {
                    error: Some("Failed to read the feed list.".to_string()),
                    ..base
                },
            );
        }
    };

    let articles = fetch_all(state.feeds.as_ref(), &links).await;

    let req = PipelineRequest {
        keywords: form.keywords,
        region: form.region,
        start_date: form.start_date,
        end_date: Some(form.end_date),
        countries: countries.clone(),
        energy_rule: state.config.energy_rule,
    };
    let outcome = match pipeline::run(&articles, &req, &state.scorer) {
        Ok(o) => o,
        Err(e) => {
            return html_page(
                StatusCode::BAD_REQUEST,
                &Page {
                    error: Some(e.to_string()),
                    ..base
                },
            );
        }
    };

    let chart_url = match state.chart.render(&outcome.topics) {
        Ok(()) => state
            .config
            .chart_url()
            .map(|u| format!("{u}?v={}", Utc::now().timestamp_millis())),
        Err(e) => {
            tracing::warn!(error = ?e, "chart render failed");
            counter!("chart_render_errors_total").increment(1);
            None
        }
    };

    html_page(
        StatusCode::OK,
        &Page {
            results: Some(&outcome.categorized),
            chart_url,
            ..base
        },
    )
}

#[derive(Debug, Deserialize)]
struct LocationReq {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct CountryResp {
    country: Option<String>,
    selected_countries: SelectedCountries,
}

#[derive(Debug, Serialize)]
struct ErrorResp {
    error: &'static str,
}

async fn get_country(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LocationReq>,
) -> Response {
    let (session_id, is_new) = match session_from(&headers) {
        Some(id) => (id, false),
        None => (new_session_id(), true),
    };

    let country = match state
        .geocoder
        .country_for(body.latitude, body.longitude)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "reverse geocoding failed");
            counter!("geocode_errors_total").increment(1);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResp {
                    error: "Failed to fetch country",
                }),
            )
                .into_response();
        }
    };

    // No country at the point: nothing to toggle.
    let selected_countries = match country.as_deref() {
        Some(c) => {
            counter!("country_toggles_total").increment(1);
            state.sessions.toggle(&session_id, c)
        }
        None => state.sessions.snapshot(&session_id),
    };
    tracing::debug!(
        session = %session_fingerprint(&session_id),
        new_session = is_new,
        selected = selected_countries.len(),
        "country toggled"
    );

    let mut resp = Json(CountryResp {
        country,
        selected_countries,
    })
    .into_response();
    if is_new {
        let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
        if let Ok(v) = HeaderValue::from_str(&cookie) {
            resp.headers_mut().insert(header::SET_COOKIE, v);
        }
    }
    resp
}
