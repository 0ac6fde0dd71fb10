#![allow(dead_code)]

use std::{path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, header},
    response::Response,
};
use async_trait::async_trait;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use vitrine_back::{
    AppError,
    app::{self, AppState},
    config::{
        AdminConfig, AppConfig, CorsConfig, DatabaseConfig, ImageStorageConfig, ServerConfig,
        StoreBackend, TranslationConfig,
    },
    models::{Product, ProductInput, ProductPatch},
    services::image_service::LocalImageStorage,
    store::{MemoryProductStore, MemoryVisibilityStore, ProductStore},
};

pub const ADMIN_PASSWORD: &str = "open-sesame";
pub const ADMIN_TOKEN: &str = "test-admin-token";
const BOUNDARY: &str = "vitrine-test-boundary";

pub struct TestApp<P = MemoryProductStore> {
    pub router: Router,
    pub products: Arc<P>,
    pub upload_dir: TempDir,
}

impl<P> TestApp<P> {
    pub fn uploaded_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn test_config(upload_dir: &Path) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_body_size: 10 * 1024 * 1024,
        },
        database: DatabaseConfig {
            backend: StoreBackend::Memory,
            url: None,
            max_connections: 1,
            connect_attempts: 1,
            connect_backoff: Duration::from_millis(1),
            acquire_timeout: Duration::from_secs(1),
            seed_file: None,
        },
        cors: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        admin: AdminConfig {
            password: ADMIN_PASSWORD.to_string(),
            token: ADMIN_TOKEN.to_string(),
        },
        images: ImageStorageConfig::Local {
            upload_dir: upload_dir.to_path_buf(),
        },
        stripe: None,
        shippo: None,
        translation: TranslationConfig {
            endpoint: "http://127.0.0.1:9/translate".to_string(),
        },
    }
}

/// Full router over in-memory stores and a temporary upload directory.
pub async fn build_test_app() -> TestApp {
    build_test_app_with(MemoryProductStore::new()).await
}

pub async fn build_test_app_with(products: MemoryProductStore) -> TestApp {
    build_test_app_over(products).await
}

/// Same router over any product store, e.g. one that always fails.
pub async fn build_test_app_over<P: ProductStore + 'static>(products: P) -> TestApp<P> {
    let upload_dir = tempfile::tempdir().unwrap();
    let config = test_config(upload_dir.path());
    let products = Arc::new(products);

    let state = AppState {
        products: products.clone(),
        visibility: Arc::new(MemoryVisibilityStore::new()),
        images: Arc::new(LocalImageStorage::new(upload_dir.path()).await.unwrap()),
        http: reqwest::Client::new(),
        config: Arc::new(config),
    };

    TestApp {
        router: app::router(state).unwrap(),
        products,
        upload_dir,
    }
}

/// Product store whose backing database is never reachable.
pub struct UnavailableStore;

impl UnavailableStore {
    fn error() -> AppError {
        AppError::StorageUnavailable("connection refused".to_string())
    }
}

#[async_trait]
impl ProductStore for UnavailableStore {
    async fn list(&self) -> vitrine_back::Result<Vec<Product>> {
        Err(Self::error())
    }

    async fn get_by_id(&self, _id: &str) -> vitrine_back::Result<Option<Product>> {
        Err(Self::error())
    }

    async fn create(&self, _input: ProductInput) -> vitrine_back::Result<Product> {
        Err(Self::error())
    }

    async fn update(
        &self,
        _id: &str,
        _patch: ProductPatch,
    ) -> vitrine_back::Result<Option<Product>> {
        Err(Self::error())
    }

    async fn remove(&self, _id: &str) -> vitrine_back::Result<bool> {
        Err(Self::error())
    }

    async fn ping(&self) -> vitrine_back::Result<()> {
        Err(Self::error())
    }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn png<'a>(file_name: &'a str) -> Part<'a> {
    Part::File {
        name: "images",
        file_name,
        content_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake-image-data",
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn send<P>(app: &TestApp<P>, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get<P>(app: &TestApp<P>, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json<P>(
    app: &TestApp<P>,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn send_multipart<P>(
    app: &TestApp<P>,
    method: Method,
    uri: &str,
    parts: &[Part<'_>],
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder.body(Body::from(multipart_body(parts))).unwrap()).await
}

pub async fn delete<P>(app: &TestApp<P>, uri: &str, token: Option<&str>) -> Response {
    let mut builder = Request::builder().method(Method::DELETE).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
