use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3 as s3;
use uuid::Uuid;

use crate::{
    config::S3Config,
    error::{AppError, Result},
};

/// Path under which [`LocalImageStorage`] files are served.
pub const LOCAL_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Object storage for product images. URLs returned by `upload` are what
/// products reference; `delete` accepts the same URLs back.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<String>;

    async fn delete(&self, url: &str) -> Result<()>;
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

fn object_name(image: &ImageUpload) -> Result<String> {
    let extension = extension_for(&image.content_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unsupported image type: {}", image.content_type))
    })?;
    Ok(format!("{}.{}", Uuid::new_v4(), extension))
}

#[derive(Debug, Clone)]
pub struct S3ImageStorage {
    client: s3::Client,
    config: S3Config,
}

impl S3ImageStorage {
    pub fn new(client: s3::Client, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Object key behind one of our public URLs.
    fn key_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(&self.config.assets_url)
            .map(|rest| rest.trim_start_matches('/').to_string())
            .filter(|key| !key.is_empty())
    }
}

#[async_trait]
impl ImageStorage for S3ImageStorage {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        let key = format!("{}/{}", self.config.prefix, object_name(&image)?);

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .content_type(&image.content_type)
            .body(image.bytes.into())
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamError(format!("Failed to upload image to S3: {}", e))
            })?;

        Ok(format!("{}/{}", self.config.assets_url, key))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(key) = self.key_for(url) else {
            tracing::warn!("Skipping delete of foreign image URL {}", url);
            return Ok(());
        };

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamError(format!("Failed to delete image from S3: {}", e))
            })?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LocalImageStorage {
    dir: PathBuf,
}

impl LocalImageStorage {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::ConfigError(format!("Cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name behind a `/uploads/<name>` URL. Anything containing a path
    /// separator is rejected.
    fn file_for(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(LOCAL_URL_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.dir.join(name))
    }
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload(&self, image: ImageUpload) -> Result<String> {
        let name = object_name(&image)?;

        tokio::fs::write(self.dir.join(&name), &image.bytes)
            .await
            .map_err(|e| AppError::UpstreamError(format!("Failed to store image: {}", e)))?;

        Ok(format!("{}/{}", LOCAL_URL_PREFIX, name))
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(path) = self.file_for(url) else {
            tracing::warn!("Skipping delete of foreign image URL {}", url);
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::UpstreamError(format!(
                "Failed to delete image {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
