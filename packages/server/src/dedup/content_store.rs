use chrono::Utc;
use dedup_common::storage::{BlobStore, ContentDigest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    SqlErr, TransactionSession, TransactionTrait,
};
use tokio::io::AsyncRead;
use tracing::instrument;
use uuid::Uuid;

use super::DedupError;
use crate::entity::{content, entry};

/// Metadata supplied alongside an upload stream.
#[derive(Clone, Debug)]
pub struct UploadMeta {
    /// Size announced by the client, if any. Informational only.
    pub declared_size: Option<u64>,
    /// Declared media type, e.g. "application/pdf".
    pub file_type: String,
    /// Original file name hint.
    pub filename: String,
}

/// Result of an administrative content deletion.
#[derive(Debug)]
pub struct DeletedContent {
    pub content: content::Model,
    pub removed_entries: u64,
}

/// Deduplicating store: at most one `content` row exists per digest.
pub struct ContentStore<'a, C: ConnectionTrait> {
    conn: &'a C,
    blobs: &'a dyn BlobStore,
}

impl<'a, C: ConnectionTrait> ContentStore<'a, C> {
    pub fn new(conn: &'a C, blobs: &'a dyn BlobStore) -> Self {
        Self { conn, blobs }
    }

    /// Return the content row for the stream's bytes, creating it if needed.
    ///
    /// An existing row is returned untouched; the new request's metadata is
    /// ignored in that case. Concurrent callers with identical bytes all
    /// receive the same row.
    #[instrument(skip_all, fields(filename = %meta.filename, file_type = %meta.file_type))]
    pub async fn store_or_reuse<R>(
        &self,
        reader: &mut R,
        meta: &UploadMeta,
    ) -> Result<content::Model, DedupError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let stored = self.blobs.put_stream(reader).await?;

        if let Some(declared) = meta.declared_size
            && declared != stored.size
        {
            tracing::warn!(
                declared,
                actual = stored.size,
                "declared size differs from received bytes"
            );
        }

        if let Some(existing) = self.find_by_digest(&stored.digest).await? {
            tracing::debug!(content_id = %existing.id, digest = %stored.digest, "reusing content");
            return Ok(existing);
        }

        let model = content::ActiveModel {
            id: Set(Uuid::now_v7()),
            hash_type: Set(stored.digest.algorithm.name().to_string()),
            hash_value: Set(stored.digest.to_hex()),
            size: Set(i64::try_from(stored.size).unwrap_or(i64::MAX)),
            file_type: Set(meta.file_type.clone()),
            original_filename: Set(meta.filename.clone()),
            blob_key: Set(stored.key.clone()),
            created_at: Set(Utc::now()),
        };

        self.insert_content(&stored.digest, model).await
    }

    /// Insert a content row, resolving a lost digest race to the winner's row.
    async fn insert_content(
        &self,
        digest: &ContentDigest,
        model: content::ActiveModel,
    ) -> Result<content::Model, DedupError> {
        match model.insert(self.conn).await {
            Ok(inserted) => {
                tracing::info!(content_id = %inserted.id, %digest, size = inserted.size, "created content");
                Ok(inserted)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::debug!(%digest, "digest inserted concurrently, fetching winner");
                self.find_by_digest(digest).await?.ok_or_else(|| {
                    DedupError::Db(sea_orm::DbErr::Custom(
                        "UniqueConstraintViolation but existing content not found".to_string(),
                    ))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_digest(
        &self,
        digest: &ContentDigest,
    ) -> Result<Option<content::Model>, DedupError> {
        Ok(content::Entity::find()
            .filter(content::Column::HashType.eq(digest.algorithm.name()))
            .filter(content::Column::HashValue.eq(digest.to_hex()))
            .one(self.conn)
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<content::Model, DedupError> {
        content::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(DedupError::NotFound("Content"))
    }

    /// Number of entries currently pointing at the content.
    pub async fn reference_count(&self, id: Uuid) -> Result<u64, DedupError> {
        Ok(entry::Entity::find()
            .filter(entry::Column::ContentId.eq(id))
            .count(self.conn)
            .await?)
    }
}

impl<'a, C: ConnectionTrait + TransactionTrait> ContentStore<'a, C> {
    /// Delete a content row together with every entry referencing it.
    ///
    /// The blob stays in the store. A concurrent upload of the same bytes may
    /// already have matched it, and a later upload picks it up again.
    #[instrument(skip(self))]
    pub async fn delete_content(&self, id: Uuid) -> Result<DeletedContent, DedupError> {
        let txn = self.conn.begin().await?;

        let model = content::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(DedupError::NotFound("Content"))?;

        let removed_entries = entry::Entity::delete_many()
            .filter(entry::Column::ContentId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;

        content::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(content_id = %id, removed_entries, "deleted content");
        Ok(DeletedContent {
            content: model,
            removed_entries,
        })
    }
}
