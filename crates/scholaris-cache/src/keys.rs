//! Cache key scheme and invalidation helpers.
//!
//! All keys share the `scholaris` prefix. Per user there are three entries:
//!
//! - `scholaris:user:{id}`: the public profile
//! - `scholaris:user:{id}:rolesId`: role ids
//! - `scholaris:user:{id}:roles`: role slugs

use crate::RedisCache;
use tracing::warn;
use uuid::Uuid;

const CACHE_PREFIX: &str = "scholaris";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

pub mod users {
    use super::*;

    pub fn by_id(user_id: Uuid) -> String {
        build_key(&["user", &user_id.to_string()])
    }

    pub fn role_ids(user_id: Uuid) -> String {
        build_key(&["user", &user_id.to_string(), "rolesId"])
    }

    pub fn roles(user_id: Uuid) -> String {
        build_key(&["user", &user_id.to_string(), "roles"])
    }

    /// Every key held for one user.
    pub fn all(user_id: Uuid) -> Vec<String> {
        vec![by_id(user_id), role_ids(user_id), roles(user_id)]
    }
}

pub mod invalidate {
    use super::*;

    /// Drops every cached entry for `user_id`.
    ///
    /// Call this after any commit that grants or revokes a role. Failures are
    /// logged and swallowed; the TTL bounds the resulting staleness.
    pub async fn user_roles(cache: Option<&RedisCache>, user_id: Uuid) {
        let Some(cache) = cache else { return };

        if let Err(e) = cache.delete(&users::all(user_id)).await {
            warn!(error = %e, user_id = %user_id, "Failed to invalidate user role caches");
        }
    }
}
