use anyhow::anyhow;
use scholaris_cache::RedisCache;
use scholaris_core::AppError;
use scholaris_models::roles::{CreateRoleDto, Role, generate_slug};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::UserService;

const ROLE_COLUMNS: &str = "id, name, slug, description, is_system_role, created_at, updated_at";

pub struct RoleService;

impl RoleService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "roles"))]
    pub async fn list_roles(db: &PgPool) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>(&format!(
            "SELECT {} FROM roles ORDER BY is_system_role DESC, name",
            ROLE_COLUMNS
        ))
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing roles");
            AppError::from(e)
        })
    }

    #[instrument(skip(db), fields(role.id = %role_id, db.operation = "SELECT", db.table = "roles"))]
    pub async fn get_role(db: &PgPool, role_id: Uuid) -> Result<Role, AppError> {
        sqlx::query_as::<_, Role>(&format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS))
            .bind(role_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Role not found")))
    }

    #[instrument(skip(db, dto), fields(role.name = %dto.name, db.operation = "INSERT", db.table = "roles"))]
    pub async fn create_role(db: &PgPool, dto: CreateRoleDto) -> Result<Role, AppError> {
        let slug = generate_slug(&dto.name);
        if slug.is_empty() {
            return Err(AppError::unprocessable(anyhow!("Invalid role data")).with_details(vec![
                serde_json::json!({ "message": "name must contain letters or digits", "path": "name" }),
            ]));
        }

        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, slug, description) VALUES ($1, $2, $3) RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(dto.name.trim())
        .bind(&slug)
        .bind(&dto.description)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!(role.slug = %slug, "Role slug already taken");
                return AppError::conflict(anyhow!("Role already exists"));
            }
            error!(error = %e, "Database error creating role");
            AppError::from(e)
        })?;

        info!(role.id = %role.id, role.slug = %role.slug, "Role created");

        Ok(role)
    }

    /// Deletes a custom role and drops the cached roles of every holder.
    #[instrument(skip(db, cache), fields(role.id = %role_id, db.operation = "DELETE", db.table = "roles"))]
    pub async fn delete_role(
        db: &PgPool,
        cache: Option<&RedisCache>,
        role_id: Uuid,
    ) -> Result<(), AppError> {
        let role = Self::get_role(db, role_id).await?;

        if role.is_system_role {
            debug!(role.slug = %role.slug, "Refusing to delete system role");
            return Err(AppError::bad_request(anyhow!("System roles cannot be deleted")));
        }

        let mut tx = db.begin().await?;

        let holders = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM user_roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for user_id in &holders {
            UserService::revalidate_user_roles(cache, *user_id).await;
        }

        info!(role.id = %role_id, holders = holders.len(), "Role deleted");

        Ok(())
    }
}
