use std::{future::Future, time::Duration};

use crate::{
    config::DatabaseConfig,
    error::{AppError, Result},
};
use sqlx::{PgPool, postgres::PgPoolOptions};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| AppError::ConfigError("DB_URL not set".to_string()))?;

    let pool = retry_with_linear_backoff(config.connect_attempts, config.connect_backoff, || {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(url)
    })
    .await
    .map_err(|e| {
        AppError::StorageUnavailable(format!(
            "Could not connect to database after {} attempts: {}",
            config.connect_attempts, e
        ))
    })?;

    sqlx::migrate!().run(&pool).await?;

    tracing::info!(
        "Database connection established with {} max connections",
        config.max_connections
    );

    Ok(pool)
}

/// Runs `op` up to `attempts` times, sleeping `attempt * step` after the
/// n-th failure. Returns the last error once attempts are exhausted.
pub async fn retry_with_linear_backoff<T, E, F, Fut>(
    attempts: u32,
    step: Duration,
    mut op: F,
) -> std::result::Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                let delay = step * attempt;
                tracing::warn!(
                    "Database connection attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
