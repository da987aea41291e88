use std::io;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;

use crate::dedup::{ContentStore, EntryQuery, EntryRegistry, SavingsService, UploadMeta};
use crate::entity::content;
use crate::error::{AppError, ErrorBody};
use crate::extractors::multipart::AppMultipart;
use crate::extractors::query::AppQuery;
use crate::models::entry::{EntryListParams, EntryListResponse, EntryResponse, SavingsResponse};
use crate::models::shared::{ApiResponse, parse_uuid};
use crate::state::AppState;
use crate::utils::filename::{resolve_entry_name, sanitize_upload_filename};

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

#[utoipa::path(
    get,
    path = "/",
    tag = "Entries",
    operation_id = "listEntries",
    summary = "List entries",
    description = "Returns entries newest first. All filters are optional and combine with AND. \
        `file_type` accepts a full media type or a bare subtype (`pdf`).",
    params(EntryListParams),
    responses(
        (status = 200, description = "Page of entries", body = ApiResponse<EntryListResponse>),
        (status = 400, description = "Malformed filter value", body = ErrorBody),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_entries(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<EntryListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = EntryQuery::try_from(params)?;
    let page = EntryRegistry::new(&state.db, &*state.blob_store)
        .list_entries(&query)
        .await?;

    Ok(ApiResponse::ok(EntryListResponse::from(page)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Entries",
    operation_id = "createEntry",
    summary = "Upload a file",
    description = "Stores the `file` multipart field and creates an entry for it. \
        Identical bytes are stored once; later uploads reuse the existing content. \
        An optional `name` field names the entry (defaults to the filename).",
    request_body(content_type = "multipart/form-data", description = "File upload with optional name"),
    responses(
        (status = 201, description = "Entry created", body = ApiResponse<EntryResponse>),
        (status = 400, description = "Missing or invalid upload", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_entry(
    State(state): State<AppState>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<impl IntoResponse, AppError> {
    let store = ContentStore::new(&state.db, &*state.blob_store);

    let mut stored: Option<(content::Model, String)> = None;
    let mut entry_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                if stored.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one file may be uploaded per request".into(),
                    ));
                }

                let raw_name = field
                    .file_name()
                    .ok_or_else(|| AppError::BadRequest("File field must have a filename".into()))?;
                let filename = sanitize_upload_filename(raw_name)
                    .map_err(|e| AppError::BadRequest(e.message().into()))?;
                let meta = UploadMeta {
                    declared_size: None,
                    file_type: media_type(field.content_type(), &filename),
                    filename,
                };

                let mut reader = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
                let content = store.store_or_reuse(&mut reader, &meta).await?;
                stored = Some((content, meta.filename));
            }
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read name: {e}")))?;
                entry_name = Some(text);
            }
            _ => {}
        }
    }

    // A reused content row keeps its first uploader's filename; the entry
    // name defaults to this request's filename instead.
    let (content, filename) =
        stored.ok_or_else(|| AppError::BadRequest("No file was uploaded".into()))?;
    let name = resolve_entry_name(entry_name.as_deref(), &filename)
        .map_err(|e| AppError::BadRequest(e.message().into()))?;

    let entry = EntryRegistry::new(&state.db, &*state.blob_store)
        .link_entry(&name, &content)
        .await?;

    Ok(ApiResponse::created(EntryResponse::from((entry, content))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Entries",
    operation_id = "getEntry",
    summary = "Get an entry",
    params(("id" = String, Path, description = "Entry ID (UUID)")),
    responses(
        (status = 200, description = "Entry with its content", body = ApiResponse<EntryResponse>),
        (status = 400, description = "Malformed entry ID", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id, "entry")?;
    let found = EntryRegistry::new(&state.db, &*state.blob_store)
        .get_entry(id)
        .await?;

    Ok(ApiResponse::ok(EntryResponse::from(found)))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Entries",
    operation_id = "downloadEntry",
    summary = "Download an entry's bytes",
    description = "Streams the stored content. The ETag is the content digest, \
        so every entry sharing the content shares the ETag.",
    params(("id" = String, Path, description = "Entry ID (UUID)")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 400, description = "Malformed entry ID", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn download_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_uuid(&id, "entry")?;
    let opened = EntryRegistry::new(&state.db, &*state.blob_store)
        .open_entry(id)
        .await?;
    let (entry, content) = (opened.entry, opened.content);

    let etag_value = format!("\"{}:{}\"", content.hash_type, content.hash_value);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let body = Body::from_stream(ReaderStream::new(opened.reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, &content.file_type)
        .header(header::CONTENT_LENGTH, content.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&entry.name),
        )
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Entries",
    operation_id = "deleteEntry",
    summary = "Delete an entry",
    description = "Removes the entry only. The content it referenced stays stored, \
        even when no other entry points at it.",
    params(("id" = String, Path, description = "Entry ID (UUID)")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 400, description = "Malformed entry ID", body = ErrorBody),
        (status = 404, description = "Entry not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id, "entry")?;
    EntryRegistry::new(&state.db, &*state.blob_store)
        .delete_entry(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/savings",
    tag = "Entries",
    operation_id = "getSavings",
    summary = "Storage savings from deduplication",
    description = "Compares the bytes actually stored with the bytes that would be stored \
        if every entry kept its own copy.",
    responses(
        (status = 200, description = "Savings report", body = ApiResponse<SavingsResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn savings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = SavingsService::new(&state.db).compute_savings().await?;
    Ok(ApiResponse::ok(SavingsResponse::from(report)))
}

/// Declared part type, else a guess from the extension, else octet-stream.
fn media_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim).filter(|t| !t.is_empty()) {
        Some(declared) if declared != FALLBACK_MEDIA_TYPE => declared.to_ascii_lowercase(),
        _ => mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string()),
    }
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
