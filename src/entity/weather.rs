use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored forecast row. Unique on `(area_id, date, weather_code)`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weather")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub area_id: String,
    pub area_name: String,
    pub date: String,
    pub weather_code: String,
    pub weather_description: String,
    pub wind: Option<String>,
    pub wave: Option<String>,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
