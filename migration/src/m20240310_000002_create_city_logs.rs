use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // city_name is deliberately free text, not a foreign key: log rows
        // must survive deletion of the city they mention.
        manager
            .create_table(
                Table::create()
                    .table(CityLog::Table)
                    .if_not_exists()
                    .col(pk_auto(CityLog::Id))
                    .col(string_len(CityLog::CityName, 100).not_null())
                    .col(string_len(CityLog::Action, 10).not_null())
                    .col(
                        timestamp_with_time_zone(CityLog::Timestamp)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CityLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum CityLog {
    Table,
    Id,
    CityName,
    Action,
    Timestamp,
}
