use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored byte payload. Rows are never updated after insert.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Hash algorithm name, e.g. "sha256".
    #[sea_orm(unique_key = "digest")]
    pub hash_type: String,

    /// Lowercase hex digest of the bytes.
    #[sea_orm(unique_key = "digest", indexed)]
    pub hash_value: String,

    /// Size of the payload in bytes.
    pub size: i64,

    /// Media type declared by the first uploader.
    pub file_type: String,

    pub original_filename: String,

    /// Location of the bytes inside the blob store.
    pub blob_key: String,

    pub created_at: DateTimeUtc,

    #[sea_orm(has_many)]
    pub entries: HasMany<super::entry::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
