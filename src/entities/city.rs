use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tracked city. Coordinates are null when geocoding failed or is still
/// pending; such cities are skipped by the nearest-city matcher.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::search_result::Entity")]
    SearchResults,
}

impl Related<super::search_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SearchResults.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
