// src/config/app.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, path::Path, path::PathBuf};

use crate::filter::EnergyRule;
use crate::geocode::NOMINATIM_REVERSE_URL;

pub const ENV_CONFIG_PATH: &str = "NEWS_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

fn default_feed_list_path() -> PathBuf {
    PathBuf::from("feed_links.csv")
}
fn default_chart_path() -> PathBuf {
    PathBuf::from("static/topic_pie_chart.svg")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_static_url_prefix() -> String {
    "/static".to_string()
}
fn default_geocoder_url() -> String {
    NOMINATIM_REVERSE_URL.to_string()
}
fn default_user_agent() -> String {
    concat!("energy-news-aggregator/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_http_timeout_secs() -> u64 {
    10
}
fn default_metrics_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Feed list: CSV (first field), TOML `feeds = [..]` or a JSON array.
    #[serde(default = "default_feed_list_path")]
    pub feed_list_path: PathBuf,
    /// Chart output, overwritten on every run.
    #[serde(default = "default_chart_path")]
    pub chart_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// URL prefix `static_dir` is served under.
    #[serde(default = "default_static_url_prefix")]
    pub static_url_prefix: String,
    #[serde(default = "default_geocoder_url")]
    pub geocoder_url: String,
    /// Sent on feed and geocoder requests (Nominatim rejects anonymous ones).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 0 disables the client timeout.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub energy_rule: EnergyRule,
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_list_path: default_feed_list_path(),
            chart_path: default_chart_path(),
            static_dir: default_static_dir(),
            static_url_prefix: default_static_url_prefix(),
            geocoder_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            http_timeout_secs: default_http_timeout_secs(),
            energy_rule: EnergyRule::default(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl AppConfig {
    /// Parse one TOML file. Missing keys take their defaults; no env overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: AppConfig =
            toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Resolve the config the service runs with:
    /// 1) $NEWS_CONFIG_PATH (must exist)
    /// 2) config/app.toml
    /// 3) built-in defaults
    ///
    /// then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = non_empty_var("NEWS_FEED_LIST") {
            self.feed_list_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var("NEWS_CHART_PATH") {
            self.chart_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty_var("NEWS_ENERGY_RULE") {
            self.energy_rule = v.parse().context("NEWS_ENERGY_RULE")?;
        }
        if let Some(v) = non_empty_var("NEWS_METRICS") {
            self.metrics_enabled = parse_bool(&v)
                .ok_or_else(|| anyhow!("NEWS_METRICS: expected a boolean, got `{v}`"))?;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        // Route prefixes must start with a slash and carry no trailing one.
        let p = self.static_url_prefix.trim().trim_end_matches('/');
        self.static_url_prefix = if p.starts_with('/') {
            p.to_string()
        } else {
            format!("/{p}")
        };
        if self.static_url_prefix == "/" {
            self.static_url_prefix = default_static_url_prefix();
        }
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        (self.http_timeout_secs > 0).then(|| Duration::from_secs(self.http_timeout_secs))
    }

    /// Public URL of the chart, when it lives under `static_dir`.
    pub fn chart_url(&self) -> Option<String> {
        let rel = self.chart_path.strip_prefix(&self.static_dir).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if parts.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.static_url_prefix, parts.join("/")))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
