//! Content-addressed deduplication core.
//!
//! Uploads flow hasher -> [`ContentStore`] -> [`EntryRegistry`]; savings
//! reports are computed by [`SavingsService`] straight from the tables.

mod content_store;
mod filter;
mod registry;
mod savings;

use dedup_common::storage::StorageError;
use sea_orm::DbErr;
use thiserror::Error;

pub use content_store::{ContentStore, DeletedContent, UploadMeta};
pub use filter::{EntryPredicate, EntryQuery};
pub use registry::{EntryPage, EntryRegistry, OpenedEntry};
pub use savings::{SavingsReport, SavingsService};

#[derive(Debug, Error)]
pub enum DedupError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Db(#[from] DbErr),

    #[error("{0} not found")]
    NotFound(&'static str),
}
