use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cache::ResponseCache;
use crate::error::AppResult;

/// GeoJSON-shaped response from the seismic catalog. Unknown fields are
/// ignored; properties the catalog may omit are optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuakePayload {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub properties: Properties,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    pub mag: Option<f64>,
    pub place: Option<String>,
    /// Event time in epoch milliseconds.
    pub time: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Ordered longitude-first, latitude-second (GeoJSON convention).
    pub coordinates: Vec<f64>,
}

/// Where a fetched payload came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Live,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Cache => write!(f, "cache"),
            Source::Live => write!(f, "live"),
        }
    }
}

/// Seam for the external seismic catalog, so tests can substitute a fake.
#[async_trait]
pub trait EarthquakeCatalog: Send + Sync {
    async fn query(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        min_magnitude: f64,
    ) -> AppResult<QuakePayload>;
}

/// HTTP client for the USGS earthquake catalog.
pub struct UsgsClient {
    http: reqwest::Client,
    base_url: String,
}

impl UsgsClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl EarthquakeCatalog for UsgsClient {
    async fn query(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        min_magnitude: f64,
    ) -> AppResult<QuakePayload> {
        let payload = self
            .http
            .get(&self.base_url)
            .query(&[
                ("format", "geojson".to_string()),
                ("starttime", start_date.to_string()),
                ("endtime", end_date.to_string()),
                ("minmagnitude", min_magnitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(payload)
    }
}

/// Earthquake data gateway: a catalog client behind a time-boxed cache.
#[derive(Clone)]
pub struct EarthquakeGateway {
    catalog: Arc<dyn EarthquakeCatalog>,
    cache: ResponseCache,
}

impl EarthquakeGateway {
    pub fn new(catalog: Arc<dyn EarthquakeCatalog>, cache_ttl: Duration) -> Self {
        Self {
            catalog,
            cache: ResponseCache::new(cache_ttl),
        }
    }

    /// Fetch catalog data for a query window, consulting the cache first.
    /// Dates are keyed in ISO 8601 form so equivalent queries share an entry.
    pub async fn fetch(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        min_magnitude: f64,
    ) -> AppResult<(QuakePayload, Source)> {
        let key = format!("{start_date}_{end_date}_{min_magnitude}");

        if let Some(payload) = self.cache.get(&key) {
            tracing::debug!(%key, "catalog cache hit");
            return Ok((payload, Source::Cache));
        }

        tracing::debug!(%key, "querying earthquake catalog");
        let payload = self.catalog.query(start_date, end_date, min_magnitude).await?;
        self.cache.set(key, payload.clone());

        Ok((payload, Source::Live))
    }
}
