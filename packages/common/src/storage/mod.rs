mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use hash::{ContentDigest, ContentHash, ContentHasher, HashAlgorithm};
pub use traits::{BlobStore, BoxReader, StoredBlob};
