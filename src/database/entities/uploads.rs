use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "uploads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub filename: String,
    pub created_at: ChronoDateTimeUtc,
    pub result_path: String,
    #[sea_orm(column_type = "Text")]
    pub data_json: String, // encoded scene table, see table_codec
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(filename: String, result_path: String, data_json: String) -> Self {
        Self {
            id: ActiveValue::NotSet,
            filename: Set(filename),
            created_at: Set(chrono::Utc::now()),
            result_path: Set(result_path),
            data_json: Set(data_json),
        }
    }
}
