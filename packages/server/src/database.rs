use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::{content, entry};

pub async fn init_db(db_url: &str, sqlx_logging: bool) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(100)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(sqlx_logging);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("dedup_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

fn composite_indexes() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        // Listing by media type, newest first.
        (
            "idx_content_file_type_created",
            Index::create()
                .if_not_exists()
                .name("idx_content_file_type_created")
                .table(content::Entity)
                .col(content::Column::FileType)
                .col(content::Column::CreatedAt)
                .to_owned(),
        ),
        // Size range filters.
        (
            "idx_content_size_created",
            Index::create()
                .if_not_exists()
                .name("idx_content_size_created")
                .table(content::Entity)
                .col(content::Column::Size)
                .col(content::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_entry_content_created",
            Index::create()
                .if_not_exists()
                .name("idx_entry_content_created")
                .table(entry::Entity)
                .col(entry::Column::ContentId)
                .col(entry::Column::CreatedAt)
                .to_owned(),
        ),
    ]
}

/// Ensure composite indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    for (name, stmt) in composite_indexes() {
        match db.execute_raw(backend.build(&stmt)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
