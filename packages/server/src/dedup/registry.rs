use chrono::Utc;
use dedup_common::storage::{BlobStore, BoxReader, ContentHash};
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use tokio::io::AsyncRead;
use tracing::instrument;
use uuid::Uuid;

use super::content_store::{ContentStore, UploadMeta};
use super::filter::EntryQuery;
use super::DedupError;
use crate::entity::{content, entry};

/// One page of entries joined with their content.
#[derive(Debug)]
pub struct EntryPage {
    pub items: Vec<(entry::Model, content::Model)>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl EntryPage {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// An entry opened for reading its bytes.
pub struct OpenedEntry {
    pub entry: entry::Model,
    pub content: content::Model,
    pub reader: BoxReader,
}

/// Named references into the content store.
pub struct EntryRegistry<'a, C: ConnectionTrait> {
    conn: &'a C,
    blobs: &'a dyn BlobStore,
}

impl<'a, C: ConnectionTrait> EntryRegistry<'a, C> {
    pub fn new(conn: &'a C, blobs: &'a dyn BlobStore) -> Self {
        Self { conn, blobs }
    }

    /// Store the stream (or reuse identical stored bytes) and link a new entry to it.
    ///
    /// If the entry insert fails after a content row was created, that row is
    /// kept as unreferenced content.
    ///
    /// The upload handler calls `store_or_reuse` and [`Self::link_entry`]
    /// itself, since the multipart `name` part may arrive after the file part.
    #[instrument(skip(self, reader, meta))]
    pub async fn create_entry<R>(
        &self,
        name: &str,
        reader: &mut R,
        meta: &UploadMeta,
    ) -> Result<(entry::Model, content::Model), DedupError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let content = ContentStore::new(self.conn, self.blobs)
            .store_or_reuse(reader, meta)
            .await?;
        let entry = self.link_entry(name, &content).await?;
        Ok((entry, content))
    }

    /// Create an entry pointing at already stored content.
    pub async fn link_entry(
        &self,
        name: &str,
        content: &content::Model,
    ) -> Result<entry::Model, DedupError> {
        let now = Utc::now();
        let entry = entry::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            content_id: Set(content.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn)
        .await?;

        tracing::info!(entry_id = %entry.id, content_id = %content.id, "created entry");
        Ok(entry)
    }

    /// Remove an entry. The referenced content is left in place.
    #[instrument(skip(self))]
    pub async fn delete_entry(&self, id: Uuid) -> Result<(), DedupError> {
        let result = entry::Entity::delete_by_id(id).exec(self.conn).await?;
        if result.rows_affected == 0 {
            return Err(DedupError::NotFound("Entry"));
        }
        tracing::info!(entry_id = %id, "deleted entry");
        Ok(())
    }

    pub async fn get_entry(&self, id: Uuid) -> Result<(entry::Model, content::Model), DedupError> {
        match entry::Entity::find_by_id(id)
            .find_also_related(content::Entity)
            .one(self.conn)
            .await?
        {
            Some((entry, Some(content))) => Ok((entry, content)),
            _ => Err(DedupError::NotFound("Entry")),
        }
    }

    /// Look up an entry and open a reader over its stored bytes.
    pub async fn open_entry(&self, id: Uuid) -> Result<OpenedEntry, DedupError> {
        let (entry, content) = self.get_entry(id).await?;
        let hash = ContentHash::from_hex(&content.blob_key)?;
        let reader = self.blobs.get_stream(&hash).await?;
        Ok(OpenedEntry {
            entry,
            content,
            reader,
        })
    }

    /// List entries matching every predicate in `query`, newest first.
    #[instrument(skip(self, query), fields(page = query.page(), predicates = query.predicates().len()))]
    pub async fn list_entries(&self, query: &EntryQuery) -> Result<EntryPage, DedupError> {
        let select = query
            .apply(entry::Entity::find().find_also_related(content::Entity))
            .order_by_desc(entry::Column::CreatedAt)
            .order_by_desc(entry::Column::Id);

        let page_size = query.page_size();
        let paginator = select.paginate(self.conn, page_size);
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(query.page() - 1).await?;

        let items = rows
            .into_iter()
            .filter_map(|(entry, content)| content.map(|content| (entry, content)))
            .collect();

        Ok(EntryPage {
            items,
            page: query.page(),
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        })
    }
}
