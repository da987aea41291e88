use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedup::{EntryPage, EntryPredicate, EntryQuery, SavingsReport};
use crate::entity::{content, entry};
use crate::error::AppError;
use crate::utils::size::{format_bytes, format_signed_bytes};

use super::shared::{non_blank, parse_datetime, parse_number};

/// Query parameters for listing entries. Blank values are ignored.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct EntryListParams {
    /// Substring of the entry name or original filename (case-insensitive).
    #[param(example = "report")]
    pub search: Option<String>,
    /// Exact entry name (case-insensitive).
    pub name: Option<String>,
    /// Substring of the original filename or media type.
    pub advanced_search: Option<String>,
    /// Media type (`application/pdf`) or bare subtype (`pdf`).
    #[param(example = "pdf")]
    pub file_type: Option<String>,
    /// Minimum content size in bytes (inclusive).
    #[param(example = 1000)]
    pub min_size: Option<String>,
    /// Maximum content size in bytes (inclusive).
    pub max_size: Option<String>,
    /// Entries whose content was first stored at or after this time (ISO 8601).
    #[param(example = "2024-01-01T00:00:00Z")]
    pub uploaded_after: Option<String>,
    /// Entries whose content was first stored at or before this time (ISO 8601).
    pub uploaded_before: Option<String>,
    /// Page number (1-indexed).
    #[param(example = 1)]
    pub page: Option<String>,
    /// Items per page (1-100, default 20).
    #[param(example = 20)]
    pub page_size: Option<String>,
}

impl TryFrom<EntryListParams> for EntryQuery {
    type Error = AppError;

    fn try_from(params: EntryListParams) -> Result<Self, Self::Error> {
        let mut query = EntryQuery::new();

        if let Some(page) = parse_number::<u64>(params.page, "page")? {
            query = query.with_page(page);
        }
        if let Some(page_size) = parse_number::<u64>(params.page_size, "page_size")? {
            query = query.with_page_size(page_size);
        }

        let min_size = parse_number::<i64>(params.min_size, "min_size")?;
        let max_size = parse_number::<i64>(params.max_size, "max_size")?;
        if let (Some(min), Some(max)) = (min_size, max_size)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_size must not exceed max_size".into(),
            ));
        }

        let predicates = [
            non_blank(params.search).map(EntryPredicate::Search),
            non_blank(params.name).map(EntryPredicate::NameEquals),
            non_blank(params.advanced_search).map(EntryPredicate::AdvancedSearch),
            non_blank(params.file_type).map(EntryPredicate::FileType),
            min_size.map(EntryPredicate::MinSize),
            max_size.map(EntryPredicate::MaxSize),
            parse_datetime(params.uploaded_after, "uploaded_after")?
                .map(EntryPredicate::UploadedAfter),
            parse_datetime(params.uploaded_before, "uploaded_before")?
                .map(EntryPredicate::UploadedBefore),
        ];

        Ok(predicates.into_iter().flatten().fold(query, EntryQuery::with))
    }
}

/// Content fields nested in entry responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentSummary {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Algorithm-prefixed digest.
    #[schema(example = "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    pub digest: String,
    #[schema(example = "sha256")]
    pub hash_type: String,
    pub hash_value: String,
    #[schema(example = "report.pdf")]
    pub original_filename: String,
    #[schema(example = "application/pdf")]
    pub file_type: String,
    #[schema(example = 142857)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<content::Model> for ContentSummary {
    fn from(model: content::Model) -> Self {
        Self {
            id: model.id.to_string(),
            digest: format!("{}:{}", model.hash_type, model.hash_value),
            hash_type: model.hash_type,
            hash_value: model.hash_value,
            original_filename: model.original_filename,
            file_type: model.file_type,
            size: model.size,
            created_at: model.created_at,
        }
    }
}

/// Content record with its current reference count.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ContentResponse {
    #[serde(flatten)]
    pub content: ContentSummary,
    #[schema(example = 3)]
    pub reference_count: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryResponse {
    #[schema(example = "01936f0e-1234-7abc-8000-0000000000aa")]
    pub id: String,
    #[schema(example = "Q3 report")]
    pub name: String,
    pub file: ContentSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<(entry::Model, content::Model)> for EntryResponse {
    fn from((entry, content): (entry::Model, content::Model)) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name,
            file: content.into(),
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}

/// Paginated entry listing.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EntryListResponse {
    pub items: Vec<EntryResponse>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 47)]
    pub total: u64,
    #[schema(example = 3)]
    pub total_pages: u64,
    #[schema(example = 20)]
    pub page_size: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl From<EntryPage> for EntryListResponse {
    fn from(page: EntryPage) -> Self {
        let has_next = page.has_next();
        let has_previous = page.has_previous();
        Self {
            items: page.items.into_iter().map(EntryResponse::from).collect(),
            page: page.page,
            total: page.total,
            total_pages: page.total_pages,
            page_size: page.page_size,
            has_next,
            has_previous,
        }
    }
}

/// Human-readable rendering of a savings report.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SavingsDisplay {
    #[schema(example = "2.93 KB")]
    pub actual_space: String,
    #[schema(example = "1.95 KB")]
    pub space_saved: String,
    #[schema(example = "4.88 KB")]
    pub would_be_space: String,
    #[schema(example = "40.0%")]
    pub savings_percentage: String,
    #[schema(example = "2.0")]
    pub deduplication_ratio: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SavingsResponse {
    #[schema(example = 3000)]
    pub actual_space: u64,
    #[schema(example = 5000)]
    pub would_be_space: u64,
    #[schema(example = 2000)]
    pub space_saved: i64,
    #[schema(example = 40.0)]
    pub savings_percentage: f64,
    #[schema(example = 2.0)]
    pub deduplication_ratio: f64,
    /// Number of stored content records.
    #[schema(example = 2)]
    pub total_files: u64,
    #[schema(example = 4)]
    pub total_entries: u64,
    pub display: SavingsDisplay,
}

impl From<SavingsReport> for SavingsResponse {
    fn from(report: SavingsReport) -> Self {
        Self {
            display: SavingsDisplay {
                actual_space: format_bytes(report.actual_space),
                space_saved: format_signed_bytes(report.space_saved),
                would_be_space: format_bytes(report.would_be_space),
                savings_percentage: format!("{:.1}%", report.savings_percentage),
                deduplication_ratio: format!("{:.1}", report.deduplication_ratio),
            },
            actual_space: report.actual_space,
            would_be_space: report.would_be_space,
            space_saved: report.space_saved,
            savings_percentage: report.savings_percentage,
            deduplication_ratio: report.deduplication_ratio,
            total_files: report.total_files,
            total_entries: report.total_entries,
        }
    }
}
