use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::{AppConfig, ImageStorageConfig, StoreBackend},
    database,
    error::{AppError, Result},
    routes,
    services::image_service::{ImageStorage, LOCAL_URL_PREFIX, LocalImageStorage, S3ImageStorage},
    store::{
        MemoryProductStore, MemoryVisibilityStore, PgProductStore, PgVisibilityStore,
        ProductStore, VisibilityStore,
    },
};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub visibility: Arc<dyn VisibilityStore>,
    pub images: Arc<dyn ImageStorage>,
    pub http: reqwest::Client,
    pub config: Arc<AppConfig>,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let (products, visibility): (Arc<dyn ProductStore>, Arc<dyn VisibilityStore>) =
        match config.database.backend {
            StoreBackend::Postgres => {
                let pool = database::create_pool(&config.database).await?;
                let products: Arc<dyn ProductStore> = Arc::new(PgProductStore::new(pool.clone()));
                let visibility: Arc<dyn VisibilityStore> = Arc::new(PgVisibilityStore::new(pool));
                (products, visibility)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory product store; changes are lost on restart");
                let products: Arc<dyn ProductStore> = match &config.database.seed_file {
                    Some(path) => Arc::new(MemoryProductStore::from_seed_file(path).await?),
                    None => Arc::new(MemoryProductStore::new()),
                };
                let visibility: Arc<dyn VisibilityStore> = Arc::new(MemoryVisibilityStore::new());
                (products, visibility)
            }
        };

    let images: Arc<dyn ImageStorage> = match &config.images {
        ImageStorageConfig::Local { upload_dir } => {
            Arc::new(LocalImageStorage::new(upload_dir.clone()).await?)
        }
        ImageStorageConfig::S3(s3_config) => {
            let client = crate::config::load_s3_client(s3_config).await;
            Arc::new(S3ImageStorage::new(client, s3_config.clone()))
        }
    };

    let http = reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

    let state = AppState {
        products,
        visibility,
        images,
        http,
        config: Arc::new(config.clone()),
    };

    router(state)
}

/// Assembles routes and layers around an already-wired state.
pub fn router(state: AppState) -> Result<Router> {
    let config = state.config.clone();

    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|_| {
                AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let mut app = routes::create_router(&state);

    if let ImageStorageConfig::Local { upload_dir } = &config.images {
        app = app.nest_service(LOCAL_URL_PREFIX, ServeDir::new(upload_dir));
    }

    Ok(app
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}
