//! # Scholaris Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: auth and refresh token secrets and lifetimes
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: per-client fixed-window request budget
//! - [`server`]: service name and listen ports
//!
//! Every struct exposes `from_env()` and falls back to its `Default` for any
//! variable that is unset or unparsable.

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;

pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
