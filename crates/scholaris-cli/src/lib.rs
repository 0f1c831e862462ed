//! # Scholaris CLI
//!
//! Administrative operations that are not exposed over HTTP. Super admins
//! can only be created here.
//!
//! ```ignore
//! use scholaris_cli::{NewSuperAdmin, create_super_admin};
//!
//! let admin = NewSuperAdmin { /* ... */ };
//! let user_id = create_super_admin(&pool, &admin).await?;
//! ```

use scholaris_core::hash_password;
use scholaris_models::users::system_roles;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid input: {0}")]
    Invalid(#[from] validator::ValidationErrors),
    #[error("a user with this username or email already exists")]
    UserExists,
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Validate)]
pub struct NewSuperAdmin {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 3, max = 20))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 16))]
    pub password: String,
}

/// Inserts the user and grants `super-admin` in one transaction.
pub async fn create_super_admin(db: &PgPool, admin: &NewSuperAdmin) -> Result<Uuid, CliError> {
    admin.validate()?;

    let password_hash = hash_password(&admin.password).map_err(|e| CliError::Hash(e.error.to_string()))?;

    let mut tx = db.begin().await?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (first_name, last_name, username, email, password)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT DO NOTHING
         RETURNING id",
    )
    .bind(&admin.first_name)
    .bind(&admin.last_name)
    .bind(&admin.username)
    .bind(&admin.email)
    .bind(&password_hash)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(CliError::UserExists)?;

    for role_id in [system_roles::SUPER_ADMIN, system_roles::USER] {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(user_id)
}
