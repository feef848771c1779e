pub use sea_orm_migration::prelude::*;

mod m20240310_000001_create_cities;
mod m20240310_000002_create_city_logs;
mod m20240310_000003_create_search_results;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240310_000001_create_cities::Migration),
            Box::new(m20240310_000002_create_city_logs::Migration),
            Box::new(m20240310_000003_create_search_results::Migration),
        ]
    }
}
