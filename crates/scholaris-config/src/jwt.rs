//! Token configuration.
//!
//! Two independent secrets sign the two token kinds so a leaked auth-token
//! secret cannot mint refresh tokens and vice versa.
//!
//! - `SHORT_TOKEN_SECRET` / `SHORT_TOKEN_EXPIRY` (seconds, default 3600)
//! - `LONG_TOKEN_SECRET` / `LONG_TOKEN_EXPIRY` (seconds, default 604800)

use std::env;

use crate::env_or;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub short_token_secret: String,
    pub long_token_secret: String,
    pub short_token_expiry: i64,
    pub long_token_expiry: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            short_token_secret: "change-me-short-token-secret".to_string(),
            long_token_secret: "change-me-long-token-secret".to_string(),
            short_token_expiry: 3600,
            long_token_expiry: 604_800,
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            short_token_secret: env::var("SHORT_TOKEN_SECRET")
                .unwrap_or(defaults.short_token_secret),
            long_token_secret: env::var("LONG_TOKEN_SECRET").unwrap_or(defaults.long_token_secret),
            short_token_expiry: env_or("SHORT_TOKEN_EXPIRY", defaults.short_token_expiry),
            long_token_expiry: env_or("LONG_TOKEN_EXPIRY", defaults.long_token_expiry),
        }
    }
}
