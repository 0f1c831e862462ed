//! Redis client for the role cache.
//!
//! Values are JSON strings written with `SETEX`. Reads degrade to a miss on
//! any connection or decoding problem so callers fall back to PostgreSQL.

use std::fmt;
use std::time::Duration;

use redis::{AsyncCommands, Client, aio::ConnectionManager};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A shared, auto-reconnecting handle. Cloning is cheap.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    ttl: Duration,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects and verifies the server answers.
    ///
    /// # Errors
    ///
    /// `CacheError::Connection` when the URL is malformed or Redis is down.
    pub async fn new(redis_url: &str, ttl: Duration) -> Result<Self, CacheError> {
        let conn = ConnectionManager::new(Client::open(redis_url)?).await?;
        Ok(Self { conn, ttl })
    }

    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.conn.clone().get::<_, Option<String>>(key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(cache.key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        let Some(raw) = raw else {
            debug!(cache.key = %key, "Cache miss");
            return None;
        };

        serde_json::from_str(&raw)
            .inspect(|_| debug!(cache.key = %key, "Cache hit"))
            .inspect_err(|e| warn!(cache.key = %key, error = %e, "Discarding undecodable cache entry"))
            .ok()
    }

    #[instrument(skip(self, value), fields(cache.operation = "SETEX"))]
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        let seconds = self.ttl.as_secs().max(1);

        self.conn
            .clone()
            .set_ex::<_, _, ()>(key, json, seconds)
            .await?;

        debug!(cache.key = %key, cache.ttl_secs = seconds, "Cached");
        Ok(())
    }

    /// Deletes `keys` in one round trip and returns how many existed.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn delete(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = self.conn.clone().del(keys).await?;
        debug!(cache.deleted = deleted, "Cache entries dropped");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_roles_round_trip_and_invalidation() {
        let cache = RedisCache::new("redis://localhost:6379", Duration::from_secs(60))
            .await
            .unwrap();
        let user_id = Uuid::new_v4();
        let key = keys::users::roles(user_id);

        cache.set(&key, &["user", "student"]).await.unwrap();
        let roles: Option<Vec<String>> = cache.get(&key).await;
        assert_eq!(roles.unwrap(), vec!["user", "student"]);

        crate::invalidate::user_roles(Some(&cache), user_id).await;
        assert!(cache.get::<Vec<String>>(&key).await.is_none());
    }
}
