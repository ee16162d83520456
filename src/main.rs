//! Energy News Aggregator: binary entrypoint.
//! Loads config, wires feeds, geocoder and chart renderer into the Axum router.

use anyhow::Context;
use energy_news_aggregator::{app, AppConfig};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "energy_news_aggregator=info,ingest=info,pipeline=info,tower_http=warn";

/// Compact logs by default; `NEWS_LOG_JSON=1` switches to JSON lines.
/// `try_init` so a subscriber already installed by the runtime wins.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("NEWS_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = AppConfig::load().context("loading app config")?;
    let router = app(config).context("building router")?;

    Ok(router.into())
}
