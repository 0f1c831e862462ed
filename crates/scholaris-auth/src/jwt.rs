//! Minting and verification of auth and refresh tokens.
//!
//! Auth tokens are signed with `short_token_secret`, refresh tokens with
//! `long_token_secret`. Verification failures never reveal why a token was
//! rejected: auth tokens fail as 401 "Unauthorized", refresh tokens as 400
//! "Invalid refresh token".

use anyhow::anyhow;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use scholaris_config::JwtConfig;
use scholaris_core::AppError;

use crate::claims::{LongTokenClaims, ShortTokenClaims};

fn now() -> usize {
    Utc::now().timestamp() as usize
}

/// Creates an auth token for one session on one device.
///
/// # Errors
///
/// Returns an internal error if encoding fails.
pub fn create_short_token(
    user_id: Uuid,
    user_key: &str,
    session_id: &str,
    device_id: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = ShortTokenClaims {
        user_id,
        user_key: user_key.to_string(),
        session_id: session_id.to_string(),
        device_id: device_id.to_string(),
        iat,
        exp: iat + jwt_config.short_token_expiry.max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.short_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create auth token: {}", e)))
}

/// Verifies an auth token's signature and expiry.
pub fn verify_short_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<ShortTokenClaims, AppError> {
    decode::<ShortTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.short_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow!("Unauthorized")))
}

/// Creates a refresh token. Every call yields a distinct token.
pub fn create_long_token(
    user_id: Uuid,
    user_key: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let iat = now();
    let claims = LongTokenClaims {
        user_id,
        user_key: user_key.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat,
        exp: iat + jwt_config.long_token_expiry.max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.long_token_secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow!("Failed to create refresh token: {}", e)))
}

pub fn verify_long_token(token: &str, jwt_config: &JwtConfig) -> Result<LongTokenClaims, AppError> {
    decode::<LongTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.long_token_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::bad_request(anyhow!("Invalid refresh token")))
}
