use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::dedup::ContentStore;
use crate::error::{AppError, ErrorBody};
use crate::models::entry::{ContentResponse, ContentSummary};
use crate::models::shared::{ApiResponse, parse_uuid};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Contents",
    operation_id = "getContent",
    summary = "Get a stored content record",
    description = "Returns the content metadata and how many entries currently reference it.",
    params(("id" = String, Path, description = "Content ID (UUID)")),
    responses(
        (status = 200, description = "Content record", body = ApiResponse<ContentResponse>),
        (status = 400, description = "Malformed content ID", body = ErrorBody),
        (status = 404, description = "Content not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id, "content")?;
    let store = ContentStore::new(&state.db, &*state.blob_store);

    let model = store.get(id).await?;
    let reference_count = store.reference_count(id).await?;

    Ok(ApiResponse::ok(ContentResponse {
        content: ContentSummary::from(model),
        reference_count,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Contents",
    operation_id = "deleteContent",
    summary = "Delete stored content",
    description = "Administrative removal of a content record. Every entry referencing it \
        is deleted in the same transaction. The stored bytes are kept and reused by later uploads.",
    params(("id" = String, Path, description = "Content ID (UUID)")),
    responses(
        (status = 204, description = "Content and its entries deleted"),
        (status = 400, description = "Malformed content ID", body = ErrorBody),
        (status = 404, description = "Content not found", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_uuid(&id, "content")?;
    ContentStore::new(&state.db, &*state.blob_store)
        .delete_content(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
