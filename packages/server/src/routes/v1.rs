use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// Headroom for multipart boundaries and the `name` field.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/entries", entry_routes(config))
        .nest("/contents", content_routes())
}

fn entry_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::entry::list_entries))
        .routes(routes!(handlers::entry::savings))
        .routes(routes!(
            handlers::entry::get_entry,
            handlers::entry::delete_entry
        ))
        .routes(routes!(handlers::entry::download_entry));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::entry::create_entry))
        .layer(upload_body_limit(config));

    crud.merge(upload)
}

fn content_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::content::get_content,
        handlers::content::delete_content
    ))
}

fn upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    let limit = config
        .storage
        .max_blob_size
        .saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
}
