//! Redis cache configuration.

use std::env;
use std::time::Duration;

/// # Environment Variables
///
/// - `REDIS_URL`: connection URL (default: `redis://127.0.0.1:6379`)
/// - `ROLE_CACHE_TTL_SECONDS`: lifetime of cached users and role sets, and
///   thus the staleness bound for role changes (default: `3600`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub redis_url: String,
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            ttl_seconds: env::var("ROLE_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.ttl_seconds),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".into(),
            ttl_seconds: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttl_is_one_hour() {
        assert_eq!(CacheConfig::default().ttl(), Duration::from_secs(3600));
    }
}
