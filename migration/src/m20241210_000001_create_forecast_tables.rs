use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== REGION (JMA "centers") ==========
        manager
            .create_table(
                Table::create()
                    .table(Region::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Region::RegionId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Region::RegionName).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ========== PREFECTURE (JMA "offices") ==========
        manager
            .create_table(
                Table::create()
                    .table(Prefecture::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prefecture::PrefectureId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prefecture::PrefectureName).string().not_null())
                    .col(ColumnDef::new(Prefecture::RegionId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_prefecture_region")
                            .from(Prefecture::Table, Prefecture::RegionId)
                            .to(Region::Table, Region::RegionId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prefecture_region")
                    .table(Prefecture::Table)
                    .col(Prefecture::RegionId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ========== AREA (JMA "class10s") ==========
        manager
            .create_table(
                Table::create()
                    .table(Area::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Area::AreaId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Area::AreaName).string().not_null())
                    .col(ColumnDef::new(Area::PrefectureId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_area_prefecture")
                            .from(Area::Table, Area::PrefectureId)
                            .to(Prefecture::Table, Prefecture::PrefectureId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_area_prefecture")
                    .table(Area::Table)
                    .col(Area::PrefectureId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // ========== WEATHER ==========
        // No foreign key on area_id: forecast documents may name areas the
        // catalog no longer lists.
        manager
            .create_table(
                Table::create()
                    .table(Weather::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Weather::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Weather::AreaId).string().not_null())
                    .col(ColumnDef::new(Weather::AreaName).string().not_null())
                    .col(ColumnDef::new(Weather::Date).string().not_null())
                    .col(ColumnDef::new(Weather::WeatherCode).string().not_null())
                    .col(
                        ColumnDef::new(Weather::WeatherDescription)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Weather::Wind).string())
                    .col(ColumnDef::new(Weather::Wave).string())
                    .col(
                        ColumnDef::new(Weather::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weather_area_date_code")
                    .table(Weather::Table)
                    .col(Weather::AreaId)
                    .col(Weather::Date)
                    .col(Weather::WeatherCode)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Weather::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Area::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Prefecture::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Region::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Region {
    Table,
    RegionId,
    RegionName,
}

#[derive(DeriveIden)]
enum Prefecture {
    Table,
    PrefectureId,
    PrefectureName,
    RegionId,
}

#[derive(DeriveIden)]
enum Area {
    Table,
    AreaId,
    AreaName,
    PrefectureId,
}

#[derive(DeriveIden)]
enum Weather {
    Table,
    Id,
    AreaId,
    AreaName,
    Date,
    WeatherCode,
    WeatherDescription,
    Wind,
    Wave,
    UpdatedAt,
}
