use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A processed video. Rows are written once by the upload pipeline and never
/// mutated afterwards.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "videos")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(skip_deserializing)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(unique)]
    pub external_asset_id: String,
    // Decimal strings, kept verbatim from the client and the gateway.
    pub original_size_bytes: String,
    pub compressed_size_bytes: String,
    pub duration_seconds: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
