use axum::{
    extract::{Path, State},
    Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

use crate::entities::{city, city_log};
use crate::error::{AppError, AppResult};
use crate::geocode::Geocoder;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCityRequest {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Append an audit entry for a city save. Runs after every save, insert or
/// update alike, which matches the historical behavior of this system.
pub async fn append_log(db: &DatabaseConnection, city_name: &str, action: &str) -> AppResult<()> {
    city_log::ActiveModel {
        city_name: Set(city_name.to_string()),
        action: Set(action.to_string()),
        timestamp: Set(chrono::Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Insert a city, geocoding the name when coordinates were not supplied.
/// A failed lookup stores null coordinates; creation still succeeds.
pub async fn save_new_city(
    db: &DatabaseConnection,
    geocoder: &dyn Geocoder,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AppResult<city::Model> {
    let (mut latitude, mut longitude) = (latitude, longitude);

    if latitude.is_none() || longitude.is_none() {
        match geocoder.lookup(&name).await {
            Some(coords) => {
                latitude = Some(coords.latitude);
                longitude = Some(coords.longitude);
            }
            None => {
                tracing::warn!(city = %name, "geocoding failed, storing null coordinates");
                latitude = None;
                longitude = None;
            }
        }
    }

    let saved = city::ActiveModel {
        name: Set(name),
        latitude: Set(latitude),
        longitude: Set(longitude),
        ..Default::default()
    }
    .insert(db)
    .await?;

    append_log(db, &saved.name, "add").await?;

    Ok(saved)
}

/// Apply an update to an existing city. Coordinates already present are kept
/// as-is; geocoding only runs when the merged record still lacks them.
pub async fn apply_city_update(
    db: &DatabaseConnection,
    geocoder: &dyn Geocoder,
    existing: city::Model,
    update: UpdateCityRequest,
) -> AppResult<city::Model> {
    let name = update.name.unwrap_or_else(|| existing.name.clone());

    if name != existing.name {
        let taken = city::Entity::find()
            .filter(city::Column::Name.eq(&name))
            .one(db)
            .await?;

        if taken.is_some() {
            return Err(AppError::Conflict("City already tracked".to_string()));
        }
    }

    let mut latitude = update.latitude.or(existing.latitude);
    let mut longitude = update.longitude.or(existing.longitude);

    if latitude.is_none() || longitude.is_none() {
        if let Some(coords) = geocoder.lookup(&name).await {
            latitude = Some(coords.latitude);
            longitude = Some(coords.longitude);
        }
    }

    let mut active: city::ActiveModel = existing.into();
    active.name = Set(name);
    active.latitude = Set(latitude);
    active.longitude = Set(longitude);

    let updated = active.update(db).await?;

    append_log(db, &updated.name, "add").await?;

    Ok(updated)
}

/// List all tracked cities
pub async fn list_cities(State(state): State<AppState>) -> AppResult<Json<Vec<city::Model>>> {
    let cities = city::Entity::find().all(&state.db).await?;
    Ok(Json(cities))
}

/// Get a single city
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<city::Model>> {
    let city = city::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    Ok(Json(city))
}

/// Create a city, geocoding its name when no coordinates are supplied
pub async fn create_city(
    State(state): State<AppState>,
    Json(payload): Json<CreateCityRequest>,
) -> AppResult<Json<city::Model>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("City name must not be empty".to_string()));
    }

    let existing = city::Entity::find()
        .filter(city::Column::Name.eq(&payload.name))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("City already tracked".to_string()));
    }

    let saved = save_new_city(
        &state.db,
        state.geocoder.as_ref(),
        payload.name,
        payload.latitude,
        payload.longitude,
    )
    .await?;

    Ok(Json(saved))
}

/// Update a city
pub async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCityRequest>,
) -> AppResult<Json<city::Model>> {
    let existing = city::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    let updated = apply_city_update(&state.db, state.geocoder.as_ref(), existing, payload).await?;

    Ok(Json(updated))
}

/// Delete a city (its search results cascade)
pub async fn delete_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let result = city::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("City not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "message": "City deleted" })))
}

/// List audit log entries, newest first
pub async fn list_logs(State(state): State<AppState>) -> AppResult<Json<Vec<city_log::Model>>> {
    let logs = city_log::Entity::find()
        .order_by_desc(city_log::Column::Timestamp)
        .all(&state.db)
        .await?;

    Ok(Json(logs))
}
