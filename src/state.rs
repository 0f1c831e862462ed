use anyhow::Context;
use scholaris_cache::{CacheConfig, RedisCache};
use scholaris_config::{CorsConfig, JwtConfig, RateLimitConfig};
use scholaris_db::{PgPool, init_db_pool};
use tracing::{info, warn};

use crate::api::{CortexHandle, CortexInbox};

const CORTEX_BUFFER: usize = 256;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when Redis is unreachable; every lookup then goes to the
    /// database.
    pub cache: Option<RedisCache>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    /// Event bus shared by managers; served by [`crate::modules::start_cortex`].
    pub cortex: CortexHandle,
}

impl AppState {
    pub fn new(db: PgPool, cache: Option<RedisCache>, cortex: CortexHandle) -> Self {
        Self {
            db,
            cache,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            cortex,
        }
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

pub async fn init_cache() -> Option<RedisCache> {
    let config = CacheConfig::from_env();

    match RedisCache::new(&config.redis_url, config.ttl()).await {
        Ok(cache) => {
            info!(ttl_seconds = config.ttl_seconds, "Role cache connected");
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, running without role cache");
            None
        }
    }
}

/// The returned inbox must be handed to [`crate::modules::start_cortex`].
pub async fn init_app_state() -> anyhow::Result<(AppState, CortexInbox)> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    let (cortex, inbox) = CortexHandle::channel(CORTEX_BUFFER);
    Ok((AppState::new(db, init_cache().await, cortex), inbox))
}
