use anyhow::anyhow;
use scholaris_config::JwtConfig;
use scholaris_core::{AppError, hash_password, verify_password};
use scholaris_models::auth::{AuthResponse, LoginRequest, RegisterRequest};
use scholaris_models::users::system_roles;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::metrics::{track_user_login_failure, track_user_login_success, track_user_registered};
use crate::modules::refresh_tokens::service::RefreshTokenService;
use crate::modules::users::service::UserService;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, jwt_config, dto, device), fields(user.username = %dto.username))]
    pub async fn login(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: LoginRequest,
        device: &str,
    ) -> Result<AuthResponse, AppError> {
        let Some(found) = UserService::find_with_password(db, &dto.username).await? else {
            warn!(user.username = %dto.username, "Login for unknown user");
            track_user_login_failure("unknown_user");
            return Err(AppError::unprocessable(anyhow!(INVALID_CREDENTIALS_MESSAGE)));
        };

        if !verify_password(&dto.password, &found.password)? {
            warn!(user.id = %found.user.id, "Login with wrong password");
            track_user_login_failure("invalid_password");
            return Err(AppError::unprocessable(anyhow!(INVALID_CREDENTIALS_MESSAGE)));
        }

        let user = found.user;
        let tokens = RefreshTokenService::issue_tokens(db, jwt_config, &user, device).await?;

        track_user_login_success();
        info!(user.id = %user.id, "User logged in");

        Ok(AuthResponse { user, tokens })
    }

    /// Creates the account with the `user` role and signs it in.
    #[instrument(skip(db, jwt_config, dto, device), fields(user.username = %dto.username))]
    pub async fn register(
        db: &PgPool,
        jwt_config: &JwtConfig,
        dto: RegisterRequest,
        device: &str,
    ) -> Result<AuthResponse, AppError> {
        if dto.password != dto.confirm_password {
            return Err(AppError::unprocessable(anyhow!("Invalid registration data"))
                .with_details(vec![json!({
                    "message": "Passwords do not match",
                    "path": "confirm_password",
                    "label": "Confirm password",
                })]));
        }

        if let Some(conflict) = UserService::find_conflict(db, &dto.username, &dto.email).await? {
            return Err(AppError::conflict(anyhow!(conflict)));
        }

        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;
        let user = UserService::create_user(&mut *tx, &dto, &password_hash).await?;
        UserService::assign_role(&mut *tx, user.id, system_roles::USER).await?;
        tx.commit().await?;

        let tokens = RefreshTokenService::issue_tokens(db, jwt_config, &user, device).await?;

        track_user_registered();
        info!(user.id = %user.id, "User registered");

        Ok(AuthResponse { user, tokens })
    }
}
