use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{city, search_result};
use crate::error::AppResult;
use crate::matcher::{self, NearestMatch};
use crate::usgs::{EarthquakeGateway, Source};

pub struct SearchOutcome {
    pub nearest: Option<NearestMatch>,
    pub source: Source,
}

/// Run the full search pipeline: fetch catalog data (cache-aware), scan for
/// the nearest tracked city, and record the outcome when there is one.
pub async fn run_search(
    db: &DatabaseConnection,
    gateway: &EarthquakeGateway,
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_magnitude: f64,
) -> AppResult<SearchOutcome> {
    let (payload, source) = gateway.fetch(start_date, end_date, min_magnitude).await?;

    let cities = city::Entity::find().all(db).await?;
    let nearest = matcher::find_nearest(&payload, &cities);

    if let Some(m) = &nearest {
        record_result(db, m, start_date, end_date).await?;
    }

    Ok(SearchOutcome { nearest, source })
}

/// Persist a match outcome unless an identical one already exists.
///
/// The existence check and the insert are not atomic; concurrent identical
/// searches may both insert. Accepted for this system's low traffic.
pub async fn record_result(
    db: &DatabaseConnection,
    m: &NearestMatch,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<()> {
    let existing = search_result::Entity::find()
        .filter(search_result::Column::CityId.eq(m.city.id))
        .filter(search_result::Column::SearchStartDate.eq(start_date))
        .filter(search_result::Column::SearchEndDate.eq(end_date))
        .filter(search_result::Column::EarthquakeMagnitude.eq(m.magnitude))
        .filter(search_result::Column::EarthquakeLocation.eq(m.location.clone()))
        .filter(search_result::Column::EarthquakeDate.eq(m.date))
        .one(db)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    search_result::ActiveModel {
        city_id: Set(m.city.id),
        earthquake_magnitude: Set(m.magnitude),
        earthquake_location: Set(m.location.clone()),
        earthquake_date: Set(m.date),
        search_start_date: Set(start_date),
        search_end_date: Set(end_date),
        nearest_distance: Set(Some(m.distance_km)),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use sea_orm::{ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::usgs::{EarthquakeCatalog, Feature, Geometry, Properties, QuakePayload};

    async fn test_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1);

        let db = Database::connect(options).await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn tokyo(db: &DatabaseConnection) -> city::Model {
        city::Entity::find()
            .filter(city::Column::Name.eq("Tokyo, Japan"))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    fn ichihara_match(tokyo: city::Model) -> NearestMatch {
        NearestMatch {
            city: tokyo,
            distance_km: 27.34,
            magnitude: 5.1,
            location: "11 km W of Ichihara, Japan".to_string(),
            date: date(2024, 1, 27),
        }
    }

    struct FixedCatalog {
        calls: AtomicUsize,
        payload: QuakePayload,
    }

    #[async_trait]
    impl EarthquakeCatalog for FixedCatalog {
        async fn query(
            &self,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
            _min_magnitude: f64,
        ) -> AppResult<QuakePayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    fn ichihara_payload() -> QuakePayload {
        QuakePayload {
            features: vec![Feature {
                properties: Properties {
                    mag: Some(5.1),
                    place: Some("11 km W of Ichihara, Japan".to_string()),
                    time: Some(1706324400000),
                },
                geometry: Geometry {
                    coordinates: vec![140.059444, 35.636111],
                },
            }],
        }
    }

    #[tokio::test]
    async fn test_record_result_is_idempotent() {
        let db = test_db().await;
        let m = ichihara_match(tokyo(&db).await);

        record_result(&db, &m, date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        record_result(&db, &m, date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();

        let rows = search_result::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].earthquake_magnitude, 5.1);
        assert_eq!(rows[0].nearest_distance, Some(27.34));
    }

    #[tokio::test]
    async fn test_different_window_records_again() {
        let db = test_db().await;
        let m = ichihara_match(tokyo(&db).await);

        record_result(&db, &m, date(2024, 1, 1), date(2024, 1, 31))
            .await
            .unwrap();
        record_result(&db, &m, date(2024, 1, 1), date(2024, 2, 29))
            .await
            .unwrap();

        let rows = search_result::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_run_search_matches_records_and_caches() {
        let db = test_db().await;
        let catalog = Arc::new(FixedCatalog {
            calls: AtomicUsize::new(0),
            payload: ichihara_payload(),
        });
        let gateway = EarthquakeGateway::new(catalog.clone(), Duration::from_secs(60));

        let first = run_search(&db, &gateway, date(2024, 1, 1), date(2024, 1, 31), 5.0)
            .await
            .unwrap();
        let second = run_search(&db, &gateway, date(2024, 1, 1), date(2024, 1, 31), 5.0)
            .await
            .unwrap();

        assert_eq!(first.source, Source::Live);
        assert_eq!(second.source, Source::Cache);
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);

        let m = first.nearest.unwrap();
        assert_eq!(m.city.name, "Tokyo, Japan");

        // Second identical search deduplicated against the first
        let rows = search_result::Entity::find().all(&db).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_run_search_with_no_features_records_nothing() {
        let db = test_db().await;
        let catalog = Arc::new(FixedCatalog {
            calls: AtomicUsize::new(0),
            payload: QuakePayload { features: vec![] },
        });
        let gateway = EarthquakeGateway::new(catalog, Duration::from_secs(60));

        let outcome = run_search(&db, &gateway, date(2024, 1, 1), date(2024, 1, 31), 5.0)
            .await
            .unwrap();

        assert!(outcome.nearest.is_none());
        assert!(search_result::Entity::find()
            .all(&db)
            .await
            .unwrap()
            .is_empty());
    }
}
