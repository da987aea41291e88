use axum::Json;
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// Success envelope wrapping every non-empty response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    #[schema(example = 200)]
    pub code: u16,
    #[schema(example = "Success")]
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(status: StatusCode, data: T) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                code: status.as_u16(),
                message: "Success".into(),
                data,
            }),
        )
    }

    pub fn ok(data: T) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        Self::with_status(StatusCode::CREATED, data)
    }
}

/// Parse a path identifier, reporting `Invalid {what} ID` on failure.
pub fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {what} ID")))
}

/// Treat absent and blank query values the same.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional numeric query parameter.
pub fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    field: &str,
) -> Result<Option<T>, AppError> {
    non_blank(value)
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| AppError::BadRequest(format!("{field} must be a number")))
        })
        .transpose()
}

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC),
/// or a bare date (midnight UTC).
pub fn parse_datetime(value: Option<String>, field: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Some(naive.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        && let Some(midnight) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(Some(midnight.and_utc()));
    }

    Err(AppError::BadRequest(format!(
        "{field} must be an ISO 8601 date or datetime"
    )))
}
