use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::{ContentDigest, ContentHash};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Outcome of writing a stream into a [`BlobStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub digest: ContentDigest,
    /// Number of bytes read from the source stream.
    pub size: u64,
    /// Opaque location of the bytes inside the store.
    pub key: String,
    /// `false` when identical bytes were already stored under this key.
    pub created: bool,
}

/// Content-addressed blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes and describe where they landed.
    async fn put(&self, data: &[u8]) -> Result<StoredBlob, StorageError> {
        let mut reader = Cursor::new(data);
        self.put_stream(&mut reader).await
    }

    /// Hash and store a stream in a single pass.
    ///
    /// Bytes become readable under their key only after the whole stream has
    /// been consumed; a failed or abandoned write leaves nothing behind.
    async fn put_stream(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredBlob, StorageError>;

    /// Retrieve all bytes for a blob.
    async fn get(&self, hash: &ContentHash) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(hash).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError>;

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Delete a blob. Returns `false` if it did not exist.
    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError>;

    /// Size of a stored blob in bytes.
    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError>;
}
