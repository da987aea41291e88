use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::hash::{ContentHash, ContentHasher, HASH_BUFFER_SIZE};
use super::traits::{BlobStore, BoxReader, StoredBlob};

/// Filesystem-backed content-addressed blob store.
///
/// Blobs are stored in a Git-style sharded directory layout:
/// `{base_path}/{first 2 hex chars}/{remaining 62 hex chars}`.
/// Writes go to `{base_path}/.tmp` first and are renamed into place once the
/// digest is known.
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    fn blob_path(&self, hash: &ContentHash) -> PathBuf {
        self.base_path
            .join(hash.shard_prefix())
            .join(hash.shard_suffix())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Removes the spooled upload unless it was moved into place.
///
/// Covers early returns as well as futures dropped mid-stream.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put_stream(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<StoredBlob, StorageError> {
        let mut temp = TempFileGuard::new(self.temp_path());
        let mut temp_file = fs::File::create(temp.path()).await?;
        let mut hasher = ContentHasher::new();
        let mut buf = vec![0u8; HASH_BUFFER_SIZE];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            let total = hasher.len() + n as u64;
            if total > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        drop(temp_file);

        let (digest, size) = hasher.finish();
        let blob_path = self.blob_path(&digest.hash);
        let key = digest.to_hex();

        if fs::try_exists(&blob_path).await? {
            tracing::debug!(%digest, "blob already present, discarding upload copy");
            return Ok(StoredBlob {
                digest,
                size,
                key,
                created: false,
            });
        }

        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::rename(temp.path(), &blob_path).await?;
        temp.disarm();

        tracing::debug!(%digest, size, "stored new blob");
        Ok(StoredBlob {
            digest,
            size,
            key,
            created: true,
        })
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        let blob_path = self.blob_path(hash);
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.blob_path(hash)).await?)
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        match fs::remove_file(self.blob_path(hash)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, hash: &ContentHash) -> Result<u64, StorageError> {
        match fs::metadata(self.blob_path(hash)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(hash.to_hex()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
