use scholaris_cache::{RedisCache, invalidate, keys};
use scholaris_core::AppError;
use scholaris_models::auth::RegisterRequest;
use scholaris_models::users::{User, UserWithPassword};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, created_at, updated_at";

pub struct UserService;

impl UserService {
    /// Looks a user up by id, reading through the cache.
    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<Option<User>, AppError> {
        let cache_key = keys::users::by_id(user_id);

        if let Some(cache) = cache
            && let Some(user) = cache.get::<User>(&cache_key).await
        {
            debug!(user.id = %user_id, "User found in cache");
            return Ok(Some(user));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error fetching user");
            AppError::from(e)
        })?;

        if let Some(user) = &user
            && let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, user).await
        {
            warn!(error = %e, "Failed to cache user");
        }

        Ok(user)
    }

    pub async fn get_user_or_404(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<User, AppError> {
        Self::get_user(db, cache, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "SELECT", db.table = "user_roles"))]
    pub async fn get_user_role_ids(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, AppError> {
        let cache_key = keys::users::role_ids(user_id);

        if let Some(cache) = cache
            && let Some(role_ids) = cache.get::<Vec<Uuid>>(&cache_key).await
        {
            return Ok(role_ids);
        }

        let role_ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id",
        )
        .bind(user_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error fetching role ids");
            AppError::from(e)
        })?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &role_ids).await
        {
            warn!(error = %e, "Failed to cache role ids");
        }

        Ok(role_ids)
    }

    /// Role slugs held by the user, reading through the cache.
    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "SELECT", db.table = "roles"))]
    pub async fn get_user_roles(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<Vec<String>, AppError> {
        let cache_key = keys::users::roles(user_id);

        if let Some(cache) = cache
            && let Some(roles) = cache.get::<Vec<String>>(&cache_key).await
        {
            debug!(user.id = %user_id, "Roles found in cache");
            return Ok(roles);
        }

        let role_ids = Self::get_user_role_ids(db, cache, user_id).await?;

        let roles = sqlx::query_scalar::<_, String>(
            "SELECT slug FROM roles WHERE id = ANY($1) ORDER BY slug",
        )
        .bind(&role_ids)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, error = %e, "Database error fetching roles");
            AppError::from(e)
        })?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &roles).await
        {
            warn!(error = %e, "Failed to cache roles");
        }

        Ok(roles)
    }

    /// Drops the cached user and role sets so the next read sees the
    /// committed roles.
    pub async fn revalidate_user_roles(cache: Option<&RedisCache>, user_id: Uuid) {
        invalidate::user_roles(cache, user_id).await;
        debug!(user.id = %user_id, "User role caches invalidated");
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn find_with_password(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<UserWithPassword>, AppError> {
        sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {}, password FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching credentials");
            AppError::from(e)
        })
    }

    /// Whether the username or the email is already registered.
    pub async fn find_conflict(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<Option<&'static str>, AppError> {
        let (username_taken, email_taken) = sqlx::query_as::<_, (bool, bool)>(
            "SELECT
                EXISTS(SELECT 1 FROM users WHERE username = $1),
                EXISTS(SELECT 1 FROM users WHERE email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(db)
        .await?;

        Ok(if username_taken {
            Some("Username already taken")
        } else if email_taken {
            Some("Email already registered")
        } else {
            None
        })
    }

    #[instrument(skip(executor, dto, password_hash), fields(user.username = %dto.username, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user<'e>(
        executor: impl PgExecutor<'e>,
        dto: &RegisterRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (first_name, last_name, username, email, password)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.username)
        .bind(&dto.email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(user.username = %dto.username, "Registration raced an existing account");
                return AppError::conflict(anyhow::anyhow!("Username or email already registered"));
            }
            error!(error = %e, "Database error creating user");
            AppError::from(e)
        })?;

        info!(user.id = %user.id, user.username = %user.username, "User created");

        Ok(user)
    }

    /// Grants a role. Granting a role the user already holds is a no-op.
    #[instrument(skip(executor), fields(db.operation = "INSERT", db.table = "user_roles"))]
    pub async fn assign_role<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(executor)
        .await
        .map_err(|e| {
            error!(user.id = %user_id, role.id = %role_id, error = %e, "Database error assigning role");
            AppError::from(e)
        })?;

        Ok(())
    }

    #[instrument(skip(executor), fields(db.operation = "DELETE", db.table = "user_roles"))]
    pub async fn revoke_role<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(executor)
            .await
            .map_err(|e| {
                error!(user.id = %user_id, role.id = %role_id, error = %e, "Database error revoking role");
                AppError::from(e)
            })?;

        Ok(())
    }
}
