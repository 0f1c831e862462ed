use anyhow::anyhow;
use scholaris_cache::RedisCache;
use scholaris_core::{AppError, Paginated};
use scholaris_models::school_admins::{
    CreateSchoolAdminDto, SchoolAdmin, SchoolAdminFilterParams, SchoolAdminWithUser,
};
use scholaris_models::users::{User, system_roles};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::UserService;

const ADMIN_COLUMNS: &str = "id, school_id, user_id, created_by, created_at, updated_at";

pub const NOT_SCHOOL_ADMIN_MESSAGE: &str = "You are not an administrator of this school";

#[derive(FromRow)]
struct SchoolAdminRow {
    #[sqlx(flatten)]
    admin: SchoolAdmin,
    user_first_name: String,
    user_last_name: String,
    user_username: String,
    user_email: String,
    user_created_at: chrono::DateTime<chrono::Utc>,
    user_updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<SchoolAdminRow> for SchoolAdminWithUser {
    fn from(row: SchoolAdminRow) -> Self {
        let user = User {
            id: row.admin.user_id,
            first_name: row.user_first_name,
            last_name: row.user_last_name,
            username: row.user_username,
            email: row.user_email,
            created_at: row.user_created_at,
            updated_at: row.user_updated_at,
        };
        Self {
            admin: row.admin,
            user,
        }
    }
}

const ADMIN_WITH_USER_SELECT: &str = "SELECT sa.id, sa.school_id, sa.user_id, sa.created_by, sa.created_at, sa.updated_at,
        u.first_name AS user_first_name, u.last_name AS user_last_name,
        u.username AS user_username, u.email AS user_email,
        u.created_at AS user_created_at, u.updated_at AS user_updated_at
     FROM school_admins sa
     JOIN users u ON u.id = sa.user_id";

pub struct SchoolAdminService;

impl SchoolAdminService {
    pub async fn is_school_admin(db: &PgPool, user_id: Uuid, school_id: Uuid) -> Result<bool, AppError> {
        let is_admin = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM school_admins WHERE user_id = $1 AND school_id = $2)",
        )
        .bind(user_id)
        .bind(school_id)
        .fetch_one(db)
        .await?;
        Ok(is_admin)
    }

    /// Fails with 403 unless `user_id` administers `school_id`.
    pub async fn ensure_school_admin(
        db: &PgPool,
        user_id: Uuid,
        school_id: Uuid,
    ) -> Result<(), AppError> {
        if Self::is_school_admin(db, user_id, school_id).await? {
            return Ok(());
        }
        debug!(user.id = %user_id, school.id = %school_id, "Caller does not administer school");
        Err(AppError::forbidden(anyhow!(NOT_SCHOOL_ADMIN_MESSAGE)))
    }

    /// The school and the user must already have been looked up.
    #[instrument(skip(db, cache, dto), fields(school.id = %dto.school_id, user.id = %dto.user_id, db.operation = "INSERT", db.table = "school_admins"))]
    pub async fn create_school_admin(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateSchoolAdminDto,
        created_by: Uuid,
    ) -> Result<SchoolAdmin, AppError> {
        if Self::is_school_admin(db, dto.user_id, dto.school_id).await? {
            return Err(AppError::bad_request(anyhow!("User is already a school admin")));
        }

        let mut tx = db.begin().await?;

        let admin = sqlx::query_as::<_, SchoolAdmin>(&format!(
            "INSERT INTO school_admins (school_id, user_id, created_by) VALUES ($1, $2, $3)
             RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(dto.school_id)
        .bind(dto.user_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                warn!("School admin insert raced an existing row");
                return AppError::bad_request(anyhow!("User is already a school admin"));
            }
            error!(error = %e, "Database error creating school admin");
            AppError::from(e)
        })?;

        UserService::assign_role(&mut *tx, dto.user_id, system_roles::SCHOOL_ADMINISTRATOR).await?;

        tx.commit().await?;

        UserService::revalidate_user_roles(cache, dto.user_id).await;
        info!(school_admin.id = %admin.id, "School admin created");

        Ok(admin)
    }

    #[instrument(skip(db), fields(school_admin.id = %school_admin_id, db.operation = "SELECT", db.table = "school_admins"))]
    pub async fn get_school_admin(
        db: &PgPool,
        school_admin_id: Uuid,
    ) -> Result<SchoolAdminWithUser, AppError> {
        sqlx::query_as::<_, SchoolAdminRow>(&format!("{} WHERE sa.id = $1", ADMIN_WITH_USER_SELECT))
            .bind(school_admin_id)
            .fetch_optional(db)
            .await?
            .map(SchoolAdminWithUser::from)
            .ok_or_else(|| AppError::not_found(anyhow!("School admin not found")))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "school_admins"))]
    pub async fn get_school_admins(
        db: &PgPool,
        filters: SchoolAdminFilterParams,
    ) -> Result<Paginated<SchoolAdminWithUser>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM school_admins WHERE ($1::uuid IS NULL OR school_id = $1)",
        )
        .bind(filters.school_id)
        .fetch_one(db)
        .await?;

        let rows = sqlx::query_as::<_, SchoolAdminRow>(&format!(
            "{} WHERE ($1::uuid IS NULL OR sa.school_id = $1)
             ORDER BY sa.created_at DESC
             LIMIT $2 OFFSET $3",
            ADMIN_WITH_USER_SELECT
        ))
        .bind(filters.school_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching school admins");
            AppError::from(e)
        })?;

        let admins = rows.into_iter().map(SchoolAdminWithUser::from).collect();

        Ok(Paginated::new(admins, total, &filters.pagination))
    }

    /// Removes the admin row. The `school-administrator` role goes with the
    /// user's last admin row.
    #[instrument(skip(db, cache), fields(school_admin.id = %school_admin_id, db.operation = "DELETE", db.table = "school_admins"))]
    pub async fn delete_school_admin(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_admin_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM school_admins WHERE id = $1 RETURNING user_id",
        )
        .bind(school_admin_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("School admin not found")))?;

        let remaining = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM school_admins WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if remaining == 0 {
            UserService::revoke_role(&mut *tx, user_id, system_roles::SCHOOL_ADMINISTRATOR).await?;
        }

        tx.commit().await?;

        UserService::revalidate_user_roles(cache, user_id).await;
        info!(school_admin.id = %school_admin_id, user.id = %user_id, remaining, "School admin deleted");

        Ok(())
    }
}
