use async_trait::async_trait;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Seam for the external geocoding service. A lookup that fails for any
/// reason yields `None`; callers store null coordinates and carry on.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, place: &str) -> Option<Coordinates>;
}

/// Geocoder backed by the Nominatim search API.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

/// Subset of a Nominatim search hit. Coordinates arrive as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: String) -> Self {
        // Nominatim rejects requests without an identifying user agent
        let http = reqwest::Client::builder()
            .user_agent("quake-watch-backend/0.1")
            .build()
            .expect("Failed to build HTTP client");

        Self { http, base_url }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, place: &str) -> Option<Coordinates> {
        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(place, "geocoding request failed: {e}");
                return None;
            }
        };

        let hits: Vec<NominatimPlace> = match response.json().await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(place, "geocoding response was not valid JSON: {e}");
                return None;
            }
        };

        let hit = hits.into_iter().next()?;
        Some(Coordinates {
            latitude: hit.lat.parse().ok()?,
            longitude: hit.lon.parse().ok()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominatim_hit_parses_string_coordinates() {
        let raw = r#"[{"place_id": 123, "lat": "35.6828387", "lon": "139.7594549", "name": "Tokyo"}]"#;

        let hits: Vec<NominatimPlace> = serde_json::from_str(raw).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lat.parse::<f64>().unwrap(), 35.6828387);
        assert_eq!(hits[0].lon.parse::<f64>().unwrap(), 139.7594549);
    }
}
