//! Shared application state

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use inkpress_core::AppConfig;

use crate::{
    auth::jwt::TokenIssuer, cache::SessionCache, db::Database, error::AppError, media::MediaRelay,
};

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub cache: SessionCache,
    pub media: MediaRelay,
    pub tokens: TokenIssuer,
    start_time: Instant,
    request_count: Arc<AtomicU64>,
}

impl AppState {
    /// Connect all backing services and assemble the state
    pub async fn connect(config: AppConfig) -> Result<Self, AppError> {
        let db = Database::connect(&config.database).await?;
        let cache = SessionCache::connect(&config.cache).await?;
        let media = MediaRelay::new(config.media.clone())?;
        let tokens = TokenIssuer::new(&config.tokens);
        Ok(Self::assemble(config, db, cache, media, tokens))
    }

    /// Assemble from already-constructed parts; connections are injected so
    /// tests can point at throwaway instances
    pub fn assemble(
        config: AppConfig,
        db: Database,
        cache: SessionCache,
        media: MediaRelay,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            cache,
            media,
            tokens,
            start_time: Instant::now(),
            request_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
