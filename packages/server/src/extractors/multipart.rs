use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;

/// A `Multipart` wrapper whose rejections become `AppError::BadRequest`,
/// so a request without a multipart body still gets the JSON error envelope.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("No file was uploaded: {}", e.body_text())))?;
        Ok(AppMultipart(multipart))
    }
}
