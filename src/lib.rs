pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod geocode;
pub mod handlers;
pub mod matcher;
pub mod routes;
pub mod search;
pub mod usgs;
pub mod utils;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub gateway: usgs::EarthquakeGateway,
    pub geocoder: Arc<dyn geocode::Geocoder>,
}
