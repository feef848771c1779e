use chrono::{Local, NaiveDate, TimeZone, Utc};

use crate::entities::city;
use crate::usgs::QuakePayload;
use crate::utils::geo::haversine_distance;

/// The (earthquake, city) pair with the smallest great-circle distance
/// across a catalog payload.
#[derive(Clone, Debug, PartialEq)]
pub struct NearestMatch {
    pub city: city::Model,
    pub distance_km: f64,
    pub magnitude: f64,
    pub location: String,
    pub date: NaiveDate,
}

/// Scan every (earthquake, city) pair and keep the global minimum distance.
///
/// Cities without coordinates are excluded. Features missing magnitude,
/// place, time, or a usable geometry are skipped. Ties go to the first pair
/// reaching the minimum (strict `<`). The full cross product is fine here:
/// the tracked-city set is a handful of rows and a query window yields at
/// most a few hundred events.
pub fn find_nearest(payload: &QuakePayload, cities: &[city::Model]) -> Option<NearestMatch> {
    let mut nearest: Option<NearestMatch> = None;
    let mut nearest_distance = f64::INFINITY;

    for feature in &payload.features {
        let (Some(magnitude), Some(place), Some(time)) = (
            feature.properties.mag,
            feature.properties.place.as_ref(),
            feature.properties.time,
        ) else {
            continue;
        };

        // GeoJSON orders coordinates longitude-first
        let &[quake_lng, quake_lat, ..] = feature.geometry.coordinates.as_slice() else {
            continue;
        };

        let Some(date) = event_date(time) else {
            continue;
        };

        for city in cities {
            let (Some(city_lat), Some(city_lng)) = (city.latitude, city.longitude) else {
                continue;
            };

            let distance = haversine_distance(city_lat, city_lng, quake_lat, quake_lng);
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(NearestMatch {
                    city: city.clone(),
                    distance_km: distance,
                    magnitude,
                    location: place.clone(),
                    date,
                });
            }
        }
    }

    nearest
}

/// Convert an epoch-millisecond event time to a calendar date in local time.
fn event_date(epoch_millis: i64) -> Option<NaiveDate> {
    Utc.timestamp_millis_opt(epoch_millis)
        .single()
        .map(|ts| ts.with_timezone(&Local).date_naive())
}
