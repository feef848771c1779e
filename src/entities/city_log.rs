use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only audit trail of city saves. `city_name` is a text snapshot,
/// not a foreign key, so entries outlive the city they mention.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub city_name: String,
    pub action: String,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
