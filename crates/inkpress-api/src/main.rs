//! Inkpress API server entry point

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use inkpress_api::{create_router, state::AppState};
use inkpress_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("failed to load config file {path}"))?,
        Err(_) => AppConfig::from_env().context("failed to load config from environment")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting inkpress-api");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState::connect(config).await?;
    let router = create_router(state)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    // Connect info is required by the per-IP rate limiter
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
