use anyhow::anyhow;
use chrono::{Duration, Utc};
use scholaris_auth::{create_long_token, create_short_token, device_fingerprint, sha256_hex, verify_long_token};
use scholaris_config::JwtConfig;
use scholaris_core::AppError;
use scholaris_models::auth::TokenPair;
use scholaris_models::refresh_tokens::RefreshToken;
use scholaris_models::users::User;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::{track_refresh_rejected, track_tokens_issued};

pub struct RefreshTokenService;

impl RefreshTokenService {
    /// Mints a long token and stores its digest, replacing whatever token
    /// the user held before.
    #[instrument(skip(db, jwt_config), fields(user.id = %user_id, db.operation = "UPSERT", db.table = "refresh_tokens"))]
    pub async fn create_refresh_token(
        db: &PgPool,
        jwt_config: &JwtConfig,
        user_id: Uuid,
        username: &str,
    ) -> Result<String, AppError> {
        let refresh_token = create_long_token(user_id, username, jwt_config)?;
        let expires_at = Utc::now() + Duration::seconds(jwt_config.long_token_expiry);

        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_hash, is_used, expires_at)
             VALUES ($1, $2, FALSE, $3)
             ON CONFLICT (user_id) DO UPDATE
             SET token_hash = EXCLUDED.token_hash,
                 is_used = FALSE,
                 expires_at = EXCLUDED.expires_at,
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(sha256_hex(&refresh_token))
        .bind(expires_at)
        .execute(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error storing refresh token");
            AppError::from(e)
        })?;

        Ok(refresh_token)
    }

    /// A fresh short token bound to `device` plus a new refresh token.
    pub async fn issue_tokens(
        db: &PgPool,
        jwt_config: &JwtConfig,
        user: &User,
        device: &str,
    ) -> Result<TokenPair, AppError> {
        let session_id = Uuid::new_v4().simple().to_string();
        let auth_token = create_short_token(
            user.id,
            &user.username,
            &session_id,
            &device_fingerprint(device),
            jwt_config,
        )?;
        let refresh_token =
            Self::create_refresh_token(db, jwt_config, user.id, &user.username).await?;

        track_tokens_issued("pair");
        debug!(user.id = %user.id, session.id = %session_id, "Token pair issued");

        Ok(TokenPair {
            auth_token,
            refresh_token,
        })
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "SELECT", db.table = "refresh_tokens"))]
    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> Result<Option<RefreshToken>, AppError> {
        sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token_hash, is_used, expires_at, created_at, updated_at
             FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::from)
    }

    /// Exchanges a refresh token for a new pair. The stored row is consumed
    /// with a conditional update, so a token is accepted at most once even
    /// under concurrent use.
    #[instrument(skip(db, jwt_config, refresh_token, device), fields(user.id = %user.id))]
    pub async fn refresh(
        db: &PgPool,
        jwt_config: &JwtConfig,
        user: &User,
        refresh_token: &str,
        device: &str,
    ) -> Result<TokenPair, AppError> {
        let Some(stored) = Self::find_by_user(db, user.id).await? else {
            track_refresh_rejected("missing");
            return Err(AppError::forbidden(anyhow!("Invalid refresh token")));
        };

        if stored.is_used {
            warn!(user.id = %user.id, "Refresh token reuse attempt");
            track_refresh_rejected("used");
            return Err(AppError::bad_request(anyhow!("Refresh token already used")));
        }

        let token_hash = sha256_hex(refresh_token);
        if token_hash != stored.token_hash || stored.is_expired() {
            track_refresh_rejected("mismatch");
            return Err(AppError::bad_request(anyhow!("Invalid refresh token")));
        }

        let claims = verify_long_token(refresh_token, jwt_config).inspect_err(|_| {
            track_refresh_rejected("invalid");
        })?;

        if claims.user_id != user.id {
            warn!(user.id = %user.id, token.user_id = %claims.user_id, "Refresh token presented by another user");
            track_refresh_rejected("owner");
            return Err(AppError::bad_request(anyhow!("Invalid refresh token")));
        }

        let consumed = sqlx::query(
            "UPDATE refresh_tokens SET is_used = TRUE, updated_at = NOW()
             WHERE id = $1 AND is_used = FALSE AND token_hash = $2",
        )
        .bind(stored.id)
        .bind(&token_hash)
        .execute(db)
        .await?
        .rows_affected();

        if consumed == 0 {
            warn!(user.id = %user.id, "Refresh token consumed concurrently");
            track_refresh_rejected("used");
            return Err(AppError::bad_request(anyhow!("Refresh token already used")));
        }

        let tokens = Self::issue_tokens(db, jwt_config, user, device).await?;

        info!(user.id = %user.id, "Refresh token exchanged");

        Ok(tokens)
    }
}
