use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use dedup_common::StorageConfig;
use dedup_common::storage::filesystem::FilesystemBlobStore;
use dedup_server::config::{AppConfig, CorsConfig, DatabaseConfig, LogConfig, ServerConfig};
use dedup_server::state::AppState;

pub mod routes {
    pub const ENTRIES: &str = "/api/v1/entries";
    pub const SAVINGS: &str = "/api/v1/entries/savings";

    pub fn entry(id: &str) -> String {
        format!("/api/v1/entries/{id}")
    }

    pub fn entry_download(id: &str) -> String {
        format!("/api/v1/entries/{id}/download")
    }

    pub fn content(id: &str) -> String {
        format!("/api/v1/contents/{id}")
    }
}

/// Upload size limit used by every test server.
pub const TEST_MAX_BLOB_SIZE: u64 = 64 * 1024;

/// A running test server backed by a throwaway SQLite file and blob directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    /// Keeps the database file and blobs alive for the test's duration.
    pub dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub headers: reqwest::header::HeaderMap,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let db = dedup_server::database::init_db(&db_url, false)
            .await
            .expect("Failed to initialize test database");
        dedup_server::database::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let storage = StorageConfig {
            blob_dir: dir.path().join("blobs"),
            max_blob_size: TEST_MAX_BLOB_SIZE,
        };
        let blob_store = FilesystemBlobStore::new(storage.blob_dir.clone(), storage.max_blob_size)
            .await
            .expect("Failed to create blob store");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                sqlx_logging: false,
            },
            storage,
            log: LogConfig {
                level: "info".to_string(),
            },
        };

        let state = AppState {
            db: db.clone(),
            blob_store: Arc::new(blob_store),
            config: app_config,
        };

        let app = dedup_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_header(&self, path: &str, name: &str, value: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header(name, value)
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Upload `bytes` as `file_name` with the given media type.
    pub async fn upload(
        &self,
        file_name: &str,
        file_bytes: Vec<u8>,
        mime: &str,
        name: Option<&str>,
    ) -> TestResponse {
        let part = Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .expect("Failed to set MIME type");
        let mut form = Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        self.post_form(routes::ENTRIES, form.part("file", part)).await
    }

    /// Upload and assert success, returning the `data` object.
    pub async fn create_entry(&self, file_name: &str, file_bytes: Vec<u8>, mime: &str) -> Value {
        let res = self.upload(file_name, file_bytes, mime, None).await;
        assert_eq!(res.status, 201, "create_entry failed: {}", res.text);
        res.body["data"].clone()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            headers,
        }
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Pull a string field out of a JSON object.
pub fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key]
        .as_str()
        .unwrap_or_else(|| panic!("expected string field '{key}' in {value}"))
}
