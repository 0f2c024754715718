use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VERSION: &str = "1.0";
pub const DRAFT_STATUS: &str = "DRAFT";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "srs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_document_id: i32,
    pub title: String,
    pub version: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub sections: Json,
    pub status: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
