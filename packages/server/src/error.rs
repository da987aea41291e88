use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dedup_common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::dedup::DedupError;

/// Error envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body.
    #[schema(example = 400)]
    pub code: u16,
    /// Human-readable error description.
    #[schema(example = "No file was uploaded")]
    pub message: String,
    /// Extra context, when there is any worth sharing.
    pub detail: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Missing or invalid upload payload, bad query parameters.
    BadRequest(String),
    NotFound(String),
    /// Persistence or I/O failure. The detail is logged, never returned.
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: StatusCode::BAD_REQUEST.as_u16(),
                    message: msg,
                    detail: None,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: StatusCode::NOT_FOUND.as_u16(),
                    message: msg,
                    detail: None,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                        message: "An unexpected error occurred".into(),
                        detail: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::BadRequest(format!("File exceeds maximum size of {limit} bytes"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<DedupError> for AppError {
    fn from(err: DedupError) -> Self {
        match err {
            DedupError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            DedupError::Storage(e) => e.into(),
            DedupError::Db(e) => e.into(),
        }
    }
}
