mod app_config;
mod s3_config;

pub use app_config::{
    AdminConfig, AppConfig, CorsConfig, DatabaseConfig, ImageStorageConfig, S3Config,
    ServerConfig, ShippoConfig, StoreBackend, StripeConfig, TranslationConfig,
};
pub use s3_config::*;
