use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(City::Table)
                    .if_not_exists()
                    .col(pk_auto(City::Id))
                    .col(string_len(City::Name, 100).not_null().unique_key())
                    .col(double_null(City::Latitude))
                    .col(double_null(City::Longitude))
                    .to_owned(),
            )
            .await?;

        // Seed the initial tracked cities
        let insert = Query::insert()
            .into_table(City::Table)
            .columns([City::Name, City::Latitude, City::Longitude])
            .values_panic(["Los Angeles, CA".into(), 34.0522.into(), (-118.2437).into()])
            .values_panic(["San Francisco, CA".into(), 37.7749.into(), (-122.4194).into()])
            .values_panic(["Tokyo, Japan".into(), 35.682839.into(), 139.759455.into()])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(City::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum City {
    Table,
    Id,
    Name,
    Latitude,
    Longitude,
}
