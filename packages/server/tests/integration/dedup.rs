use dedup_common::storage::filesystem::FilesystemBlobStore;
use dedup_common::storage::{BlobStore, ContentDigest};
use dedup_server::dedup::{ContentStore, EntryRegistry, SavingsService, UploadMeta};
use futures::future::join_all;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

async fn setup() -> (DatabaseConnection, FilesystemBlobStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("dedup.db").display());
    let db = dedup_server::database::init_db(&db_url, false).await.unwrap();
    let blobs = FilesystemBlobStore::new(dir.path().join("blobs"), 1024 * 1024)
        .await
        .unwrap();
    (db, blobs, dir)
}

fn meta(filename: &str) -> UploadMeta {
    UploadMeta {
        declared_size: None,
        file_type: "text/plain".into(),
        filename: filename.into(),
    }
}

#[tokio::test]
async fn create_entry_links_to_stored_content() {
    let (db, blobs, _dir) = setup().await;
    let registry = EntryRegistry::new(&db, &blobs);

    let mut reader: &[u8] = b"registry bytes";
    let (entry, content) = registry
        .create_entry("notes", &mut reader, &meta("notes.txt"))
        .await
        .unwrap();

    assert_eq!(entry.name, "notes");
    assert_eq!(entry.content_id, content.id);
    assert_eq!(content.size, 14);

    let digest = ContentDigest::of(b"registry bytes");
    let found = ContentStore::new(&db, &blobs)
        .find_by_digest(&digest)
        .await
        .unwrap()
        .expect("content should be findable by digest");
    assert_eq!(found.id, content.id);
    assert_eq!(found.hash_value, digest.to_hex());
}

#[tokio::test]
async fn declared_size_mismatch_is_not_fatal() {
    let (db, blobs, _dir) = setup().await;
    let store = ContentStore::new(&db, &blobs);

    let mut upload = meta("short.txt");
    upload.declared_size = Some(999);
    let mut reader: &[u8] = b"short";
    let content = store.store_or_reuse(&mut reader, &upload).await.unwrap();

    assert_eq!(content.size, 5);
}

#[tokio::test]
async fn delete_content_reports_removed_entries_and_keeps_blob() {
    let (db, blobs, _dir) = setup().await;
    let registry = EntryRegistry::new(&db, &blobs);
    let store = ContentStore::new(&db, &blobs);

    let mut first: &[u8] = b"to be purged";
    let (_, content) = registry
        .create_entry("one", &mut first, &meta("one.txt"))
        .await
        .unwrap();
    let mut second: &[u8] = b"to be purged";
    registry
        .create_entry("two", &mut second, &meta("two.txt"))
        .await
        .unwrap();
    assert_eq!(store.reference_count(content.id).await.unwrap(), 2);

    let deleted = store.delete_content(content.id).await.unwrap();

    assert_eq!(deleted.removed_entries, 2);
    assert_eq!(deleted.content.id, content.id);
    let digest = ContentDigest::of(b"to be purged");
    assert!(store.find_by_digest(&digest).await.unwrap().is_none());
    assert!(blobs.exists(&digest.hash).await.unwrap());

    // Re-uploading creates a fresh row backed by the retained blob.
    let mut again: &[u8] = b"to be purged";
    let (entry, fresh) = registry
        .create_entry("three", &mut again, &meta("three.txt"))
        .await
        .unwrap();
    assert_ne!(fresh.id, content.id);
    let mut opened = registry.open_entry(entry.id).await.unwrap();
    let mut bytes = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut opened.reader, &mut bytes)
        .await
        .unwrap();
    assert_eq!(bytes, b"to be purged");
}

#[tokio::test]
async fn concurrent_store_or_reuse_converges_on_one_row() {
    let (db, blobs, _dir) = setup().await;
    let store = ContentStore::new(&db, &blobs);
    let upload = meta("race.bin");

    let attempts = (0..6).map(|_| {
        let store = &store;
        let upload = &upload;
        async move {
            let mut reader: &[u8] = b"racing identical payload";
            store.store_or_reuse(&mut reader, upload).await
        }
    });
    let results = join_all(attempts).await;

    let ids: Vec<_> = results.into_iter().map(|r| r.unwrap().id).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[tokio::test]
async fn savings_service_matches_worked_example() {
    let (db, blobs, _dir) = setup().await;
    let registry = EntryRegistry::new(&db, &blobs);
    let a = vec![b'a'; 1000];
    let b = vec![b'b'; 2000];

    for name in ["a1", "a2", "a3"] {
        let mut reader: &[u8] = &a;
        registry
            .create_entry(name, &mut reader, &meta("a.bin"))
            .await
            .unwrap();
    }
    let mut reader: &[u8] = &b;
    registry
        .create_entry("b", &mut reader, &meta("b.bin"))
        .await
        .unwrap();

    let report = SavingsService::new(&db).compute_savings().await.unwrap();
    assert_eq!(report.actual_space, 3000);
    assert_eq!(report.would_be_space, 5000);
    assert_eq!(report.space_saved, 2000);
    assert_eq!(report.total_files, 2);
    assert_eq!(report.total_entries, 4);
    assert!((report.savings_percentage - 40.0).abs() < 1e-9);
    assert!((report.deduplication_ratio - 2.0).abs() < 1e-9);
}
