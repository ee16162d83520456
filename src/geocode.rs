//! Reverse geocoding: a coordinate pair to a country name.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::GeocodeError;

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// English country name for the point, `None` when the service has no
    /// country there (open sea, poles).
    async fn country_for(&self, lat: f64, lon: f64) -> Result<Option<String>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    country: Option<String>,
}

/// OpenStreetMap Nominatim `/reverse` client.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, GeocodeError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent.to_string());
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }

    pub fn request_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}?format=json&lat={lat}&lon={lon}&accept-language=en",
            self.base_url.trim_end_matches('?')
        )
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn country_for(&self, lat: f64, lon: f64) -> Result<Option<String>, GeocodeError> {
        let url = self.request_url(lat, lon);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let parsed: ReverseResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Decode(e.to_string()))?;
        Ok(country_from(parsed))
    }
}

fn country_from(resp: ReverseResponse) -> Option<String> {
    resp.address
        .and_then(|a| a.country)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

/// Fixed lookup table keyed by coordinates rounded to one decimal. Points
/// not in the table have no country.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    table: HashMap<(i64, i64), String>,
    fail: bool,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, lat: f64, lon: f64, country: impl Into<String>) -> Self {
        self.table.insert(key(lat, lon), country.into());
        self
    }

    /// Every lookup answers 503, as an unavailable service would.
    pub fn failing() -> Self {
        Self {
            table: HashMap::new(),
            fail: true,
        }
    }
}

fn key(lat: f64, lon: f64) -> (i64, i64) {
    ((lat * 10.0).round() as i64, (lon * 10.0).round() as i64)
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn country_for(&self, lat: f64, lon: f64) -> Result<Option<String>, GeocodeError> {
        if self.fail {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.table.get(&key(lat, lon)).cloned())
    }
}
