#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

use tokio::{net::TcpListener, signal};
use tracing::Level;
use vitrine_back::{AppError, Result, app, config::AppConfig};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    if let Err(e) = serve().await {
        tracing::error!("vitrine-back stopped: {}", e);
        std::process::exit(1);
    }
}

async fn serve() -> Result<()> {
    let config = AppConfig::from_env()?;

    tracing::info!(
        "Product store: {:?}, checkout: {}, shipping labels: {}",
        config.database.backend,
        enabled(config.stripe.is_some()),
        enabled(config.shippo.is_some()),
    );

    let router = app::build(&config).await?;

    let addr = config.server_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::ConfigError(format!("Cannot listen on {}: {}", addr, e)))?;
    tracing::info!("vitrine-back listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(stop_requested())
        .await
        .map_err(|e| AppError::InternalError(format!("HTTP server failed: {}", e)))?;

    tracing::info!("In-flight requests drained, exiting");
    Ok(())
}

fn enabled(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Resolves on Ctrl-C, or SIGTERM on unix. A handler that cannot be
/// installed never resolves, leaving the other one in charge.
async fn stop_requested() {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "interrupt",
            Err(e) => {
                tracing::warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "terminate"
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let reason = tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
    };

    tracing::info!("Received {} signal, shutting down", reason);
}
