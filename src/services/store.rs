//! SQLite persistence for the catalog and stored forecasts.
//!
//! Writes run inside a transaction per call; reads are plain projections.

use chrono::Utc;
use sea_orm::sea_query::{OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectOptions, ConnectionTrait,
    Database, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{area, prefecture, region, weather};
use crate::error::AppResult;
use crate::forecast::ForecastEntry;
use crate::hierarchy::Hierarchy;
use crate::weather_code;

/// Rows per INSERT statement, well under SQLite's bound-parameter limit.
const BATCH_SIZE: usize = 500;

/// Open the store. In-memory databases are pinned to a single connection so
/// every query sees the same database.
///
/// # Errors
///
/// Returns `AppError::Database` if the connection cannot be established.
pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    Ok(Database::connect(options).await?)
}

/// Create the region, prefecture, area and weather tables if absent.
///
/// # Errors
///
/// Returns `AppError::Database` if a migration fails.
pub async fn ensure_schema(db: &DatabaseConnection) -> AppResult<()> {
    migration::Migrator::up(db, None).await?;
    Ok(())
}

/// Row totals after a catalog upsert.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub regions: u64,
    pub prefectures: u64,
    pub areas: u64,
}

/// Insert regions, prefectures and areas; rows whose key already exists are
/// left untouched.
///
/// # Errors
///
/// Returns `AppError::Database` if any insert fails. Nothing is committed in
/// that case.
pub async fn upsert_catalog(db: &DatabaseConnection, hierarchy: &Hierarchy) -> AppResult<CatalogCounts> {
    let regions: Vec<region::ActiveModel> = hierarchy
        .values()
        .map(|r| region::ActiveModel {
            region_id: Set(r.id.clone()),
            region_name: Set(r.name.clone()),
        })
        .collect();

    let prefectures: Vec<prefecture::ActiveModel> = hierarchy
        .values()
        .flat_map(|r| r.prefectures.iter())
        .map(|p| prefecture::ActiveModel {
            prefecture_id: Set(p.id.clone()),
            prefecture_name: Set(p.name.clone()),
            region_id: Set(p.region_id.clone()),
        })
        .collect();

    let areas: Vec<area::ActiveModel> = hierarchy
        .values()
        .flat_map(|r| r.prefectures.iter())
        .flat_map(|p| p.areas.iter())
        .map(|a| area::ActiveModel {
            area_id: Set(a.id.clone()),
            area_name: Set(a.name.clone()),
            prefecture_id: Set(a.prefecture_id.clone()),
        })
        .collect();

    let txn = db.begin().await?;

    // Parents first so foreign keys resolve
    insert_or_ignore(&txn, regions, region::Column::RegionId).await?;
    insert_or_ignore(&txn, prefectures, prefecture::Column::PrefectureId).await?;
    insert_or_ignore(&txn, areas, area::Column::AreaId).await?;

    let counts = CatalogCounts {
        regions: region::Entity::find().count(&txn).await?,
        prefectures: prefecture::Entity::find().count(&txn).await?,
        areas: area::Entity::find().count(&txn).await?,
    };

    txn.commit().await?;

    tracing::debug!(?counts, "Catalog upserted");
    Ok(counts)
}

async fn insert_or_ignore<E, A, C>(conn: &C, models: Vec<A>, key: E::Column) -> AppResult<()>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Clone + Send,
    C: ConnectionTrait,
{
    for chunk in models.chunks(BATCH_SIZE) {
        let result = E::insert_many(chunk.to_vec())
            .on_conflict(OnConflict::column(key).do_nothing().to_owned())
            .exec(conn)
            .await;

        match result {
            // Every row in the chunk already existed
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Insert forecast rows, replacing any row with the same
/// `(area_id, date, weather_code)` and refreshing its `updated_at`.
///
/// The stored description is always the code table's, never the free text
/// JMA sent alongside the code. Entries without a weather code cannot be
/// keyed and are skipped. Returns the number of rows written.
///
/// # Errors
///
/// Returns `AppError::Database` if a write fails; the whole call is rolled back.
pub async fn replace_weather(db: &DatabaseConnection, entries: &[ForecastEntry]) -> AppResult<usize> {
    let now = Utc::now();

    let models: Vec<weather::ActiveModel> = entries
        .iter()
        .filter_map(|entry| {
            let code = entry.weather_code.as_ref()?;
            let description = weather_code::translate(code).to_string();

            Some(weather::ActiveModel {
                id: NotSet,
                area_id: Set(entry.area_code.clone()),
                area_name: Set(entry.area_name.clone()),
                date: Set(entry.time.clone()),
                weather_code: Set(code.clone()),
                weather_description: Set(description),
                wind: Set(entry.wind.clone()),
                wave: Set(entry.wave.clone()),
                updated_at: Set(now),
            })
        })
        .collect();

    let skipped = entries.len() - models.len();
    if skipped > 0 {
        tracing::debug!(skipped, "Skipped forecast entries without a weather code");
    }
    if models.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;

    for chunk in models.chunks(BATCH_SIZE) {
        weather::Entity::insert_many(chunk.to_vec())
            .on_conflict(
                OnConflict::columns([
                    weather::Column::AreaId,
                    weather::Column::Date,
                    weather::Column::WeatherCode,
                ])
                .update_columns([
                    weather::Column::AreaName,
                    weather::Column::WeatherDescription,
                    weather::Column::Wind,
                    weather::Column::Wave,
                    weather::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    Ok(models.len())
}

pub async fn list_regions(db: &DatabaseConnection) -> AppResult<Vec<region::Model>> {
    Ok(region::Entity::find()
        .order_by_asc(region::Column::RegionId)
        .all(db)
        .await?)
}

pub async fn find_region(db: &DatabaseConnection, region_id: &str) -> AppResult<Option<region::Model>> {
    Ok(region::Entity::find_by_id(region_id.to_owned()).one(db).await?)
}

pub async fn list_prefectures(
    db: &DatabaseConnection,
    region_id: &str,
) -> AppResult<Vec<prefecture::Model>> {
    Ok(prefecture::Entity::find()
        .filter(prefecture::Column::RegionId.eq(region_id))
        .order_by_asc(prefecture::Column::PrefectureId)
        .all(db)
        .await?)
}

pub async fn list_all_prefectures(db: &DatabaseConnection) -> AppResult<Vec<prefecture::Model>> {
    Ok(prefecture::Entity::find()
        .order_by_asc(prefecture::Column::PrefectureId)
        .all(db)
        .await?)
}

pub async fn find_prefecture(
    db: &DatabaseConnection,
    prefecture_id: &str,
) -> AppResult<Option<prefecture::Model>> {
    Ok(prefecture::Entity::find_by_id(prefecture_id.to_owned())
        .one(db)
        .await?)
}

pub async fn list_areas(db: &DatabaseConnection, prefecture_id: &str) -> AppResult<Vec<area::Model>> {
    Ok(area::Entity::find()
        .filter(area::Column::PrefectureId.eq(prefecture_id))
        .order_by_asc(area::Column::AreaId)
        .all(db)
        .await?)
}

fn areas_of(prefecture_id: &str) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(area::Column::AreaId)
        .from(area::Entity)
        .and_where(area::Column::PrefectureId.eq(prefecture_id))
        .to_owned()
}

/// Distinct forecast dates stored for any area of a prefecture, ascending.
pub async fn list_dates(db: &DatabaseConnection, prefecture_id: &str) -> AppResult<Vec<String>> {
    Ok(weather::Entity::find()
        .select_only()
        .column(weather::Column::Date)
        .distinct()
        .filter(weather::Column::AreaId.in_subquery(areas_of(prefecture_id)))
        .order_by_asc(weather::Column::Date)
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Stored rows for one area and date, most recently updated first.
pub async fn list_weather(
    db: &DatabaseConnection,
    area_id: &str,
    date: &str,
) -> AppResult<Vec<weather::Model>> {
    Ok(weather::Entity::find()
        .filter(weather::Column::AreaId.eq(area_id))
        .filter(weather::Column::Date.eq(date))
        .order_by_desc(weather::Column::UpdatedAt)
        .all(db)
        .await?)
}

/// Stored rows for every area of a prefecture on one date.
pub async fn list_prefecture_weather(
    db: &DatabaseConnection,
    prefecture_id: &str,
    date: &str,
) -> AppResult<Vec<weather::Model>> {
    Ok(weather::Entity::find()
        .filter(weather::Column::AreaId.in_subquery(areas_of(prefecture_id)))
        .filter(weather::Column::Date.eq(date))
        .order_by_asc(weather::Column::AreaId)
        .order_by_desc(weather::Column::UpdatedAt)
        .all(db)
        .await?)
}
