use sea_orm_migration::{prelude::*, schema::*};

use super::m20240310_000001_create_cities::City;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SearchResult::Table)
                    .if_not_exists()
                    .col(pk_auto(SearchResult::Id))
                    .col(integer(SearchResult::CityId).not_null())
                    .col(double(SearchResult::EarthquakeMagnitude).not_null())
                    .col(string_len(SearchResult::EarthquakeLocation, 255).not_null())
                    .col(date(SearchResult::EarthquakeDate).not_null())
                    .col(date(SearchResult::SearchStartDate).not_null())
                    .col(date(SearchResult::SearchEndDate).not_null())
                    .col(double_null(SearchResult::NearestDistance))
                    .col(
                        timestamp_with_time_zone(SearchResult::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_search_result_city")
                            .from(SearchResult::Table, SearchResult::CityId)
                            .to(City::Table, City::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchResult::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SearchResult {
    Table,
    Id,
    CityId,
    EarthquakeMagnitude,
    EarthquakeLocation,
    EarthquakeDate,
    SearchStartDate,
    SearchEndDate,
    NearestDistance,
    CreatedAt,
}
