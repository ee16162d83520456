// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod article;
pub mod categorize;
pub mod chart;
pub mod config;
pub mod dates;
pub mod error;
pub mod filter;
pub mod geocode;
pub mod pipeline;
pub mod render;
pub mod sentiment;
pub mod session;
pub mod topics;

// Feed list loading, fetching and RSS/Atom parsing
pub mod ingest;

pub mod api;
pub mod metrics;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::article::Article;
pub use crate::config::AppConfig;
pub use crate::error::{GeocodeError, PipelineError};

use tracing::info;

/// Build the production router from a resolved config.
pub fn app(config: AppConfig) -> anyhow::Result<axum::Router> {
    info!(
        feed_list = %config.feed_list_path.display(),
        chart = %config.chart_path.display(),
        energy_rule = ?config.energy_rule,
        metrics = config.metrics_enabled,
        "building router"
    );
    create_router(AppState::from_config(config)?)
}
