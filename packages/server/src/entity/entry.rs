use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named reference to one content row. Many entries may share a content.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,

    /// Fixed at creation.
    #[sea_orm(indexed)]
    pub content_id: Uuid,
    #[sea_orm(belongs_to, from = "content_id", to = "id", on_delete = "Cascade")]
    pub content: HasOne<super::content::Entity>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
