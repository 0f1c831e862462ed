//! # Scholaris Cache
//!
//! Redis-backed read-through cache for user profiles and role lookups.
//!
//! # Consistency contract
//!
//! Cached entries are written with a TTL of `ROLE_CACHE_TTL_SECONDS`
//! (default 3600). Every operation that changes a user's roles deletes that
//! user's entries through [`invalidate::user_roles`] after its write commits.
//! Deletion is best-effort: if it fails, or a reader repopulates the entry
//! between the commit and the delete, a stale role set can be served for at
//! most one TTL. The TTL is therefore the upper bound on role staleness.
//!
//! ```ignore
//! use scholaris_cache::{CacheConfig, RedisCache, keys};
//!
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::new(&config.redis_url, config.ttl()).await?;
//! let roles: Option<Vec<String>> = cache.get(&keys::users::roles(user_id)).await;
//! ```

pub mod config;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use keys::invalidate;
pub use redis::{CacheError, RedisCache};
