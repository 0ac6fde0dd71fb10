use crate::error::{AppError, Result};
use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub admin: AdminConfig,
    pub images: ImageStorageConfig,
    pub stripe: Option<StripeConfig>,
    pub shippo: Option<ShippoConfig>,
    pub translation: TranslationConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_backoff: Duration,
    pub acquire_timeout: Duration,
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub enum ImageStorageConfig {
    Local { upload_dir: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Set for S3-compatible servers (MinIO, R2).
    pub endpoint: Option<String>,
    pub assets_url: String,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub api_base: String,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct ShippoConfig {
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub endpoint: String,
}

const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";
const DEFAULT_STRIPE_API: &str = "https://api.stripe.com";
const DEFAULT_SHIPPO_API: &str = "https://api.goshippo.com";

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let allowed_origins: Vec<String> = env::var("FRONTEND_URL")?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let frontend_url = allowed_origins
            .first()
            .cloned()
            .ok_or_else(|| AppError::ConfigError("FRONTEND_URL is empty".to_string()))?;

        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("PORT", "3000")?,
                max_body_size: parse_var("MAX_BODY_SIZE", "10485760")?,
            },
            database: database_from_env()?,
            cors: CorsConfig { allowed_origins },
            admin: AdminConfig {
                password: required_var("ADMIN_PASSWORD")?,
                token: required_var("ADMIN_TOKEN")?,
            },
            images: images_from_env()?,
            stripe: optional_var("STRIPE_SECRET_KEY").map(|secret_key| StripeConfig {
                secret_key,
                api_base: env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_STRIPE_API.to_string()),
                currency: env::var("STRIPE_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
                success_url: env::var("CHECKOUT_SUCCESS_URL")
                    .unwrap_or_else(|_| format!("{}/success", frontend_url)),
                cancel_url: env::var("CHECKOUT_CANCEL_URL")
                    .unwrap_or_else(|_| format!("{}/cancel", frontend_url)),
            }),
            shippo: optional_var("SHIPPO_API_KEY").map(|api_key| ShippoConfig {
                api_key,
                api_base: env::var("SHIPPO_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_SHIPPO_API.to_string()),
            }),
            translation: TranslationConfig {
                endpoint: env::var("TRANSLATE_URL")
                    .unwrap_or_else(|_| DEFAULT_TRANSLATE_URL.to_string()),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn database_from_env() -> Result<DatabaseConfig> {
    let backend = match env::var("PRODUCT_STORE")
        .unwrap_or_else(|_| "postgres".to_string())
        .to_lowercase()
        .as_str()
    {
        "postgres" => StoreBackend::Postgres,
        "memory" => StoreBackend::Memory,
        other => {
            return Err(AppError::ConfigError(format!(
                "Invalid PRODUCT_STORE value: {}",
                other
            )));
        }
    };

    let url = optional_var("DB_URL");
    if backend == StoreBackend::Postgres && url.is_none() {
        return Err(AppError::ConfigError(
            "DB_URL is required when PRODUCT_STORE=postgres".to_string(),
        ));
    }

    Ok(DatabaseConfig {
        backend,
        url,
        max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
        connect_attempts: parse_var("DB_CONNECT_ATTEMPTS", "5")?,
        connect_backoff: Duration::from_millis(parse_var("DB_CONNECT_BACKOFF_MS", "500")?),
        acquire_timeout: Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", "5")?),
        seed_file: optional_var("PRODUCTS_SEED_FILE").map(PathBuf::from),
    })
}

fn images_from_env() -> Result<ImageStorageConfig> {
    match env::var("IMAGE_STORAGE")
        .unwrap_or_else(|_| "local".to_string())
        .to_lowercase()
        .as_str()
    {
        "local" => Ok(ImageStorageConfig::Local {
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
        }),
        "s3" => Ok(ImageStorageConfig::S3(S3Config {
            bucket: required_var("S3_BUCKET")?,
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint: optional_var("S3_ENDPOINT"),
            assets_url: required_var("ASSETS_URL")?
                .trim_end_matches('/')
                .to_string(),
            prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "products".to_string()),
        })),
        other => Err(AppError::ConfigError(format!(
            "Invalid IMAGE_STORAGE value: {}",
            other
        ))),
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::ConfigError(format!("{} not set", name)))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid {} value", name)))
}
