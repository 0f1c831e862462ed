use anyhow::anyhow;
use scholaris_cache::RedisCache;
use scholaris_core::{AppError, Paginated, contains_pattern};
use scholaris_models::schools::{CreateSchoolDto, School, SchoolFilterParams, UpdateSchoolDto};
use scholaris_models::users::system_roles;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::track_school_created;
use crate::modules::users::service::UserService;

const SCHOOL_COLUMNS: &str =
    "id, name, address, phone, email, website, description, created_by, created_at, updated_at";

const EMAIL_TAKEN_MESSAGE: &str = "School with this email already exists";

fn map_school_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!("School email raced an existing school");
        return AppError::conflict(anyhow!(EMAIL_TAKEN_MESSAGE));
    }
    error!(error = %e, "Database error writing school");
    AppError::from(e)
}

pub struct SchoolService;

impl SchoolService {
    async fn email_taken<'e>(
        executor: impl PgExecutor<'e>,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM schools WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    /// Inserts the school and makes the creator its first administrator in
    /// one transaction.
    #[instrument(skip(db, cache, dto), fields(school.name = %dto.name, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateSchoolDto,
        created_by: Uuid,
    ) -> Result<School, AppError> {
        let mut tx = db.begin().await?;

        if let Some(email) = &dto.email
            && Self::email_taken(&mut *tx, email, None).await?
        {
            debug!(school.email = %email, "School email already in use");
            return Err(AppError::conflict(anyhow!(EMAIL_TAKEN_MESSAGE)));
        }

        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (name, address, phone, email, website, description, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            SCHOOL_COLUMNS
        ))
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.email)
        .bind(&dto.website)
        .bind(&dto.description)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_school_write_error)?;

        sqlx::query("INSERT INTO school_admins (school_id, user_id, created_by) VALUES ($1, $2, $2)")
            .bind(school.id)
            .bind(created_by)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(school.id = %school.id, error = %e, "Database error adding creator as school admin");
                AppError::from(e)
            })?;

        UserService::assign_role(&mut *tx, created_by, system_roles::SCHOOL_ADMINISTRATOR).await?;

        tx.commit().await?;

        UserService::revalidate_user_roles(cache, created_by).await;
        track_school_created();
        info!(school.id = %school.id, school.name = %school.name, "School created successfully");

        Ok(school)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<Paginated<School>, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();
        let name = filters.name.as_deref().map(contains_pattern);

        debug!(limit = %limit, offset = %offset, filter.name = ?filters.name, "Fetching schools");

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM schools WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(&name)
        .fetch_one(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error counting schools");
            AppError::from(e)
        })?;

        let schools = sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3",
            SCHOOL_COLUMNS
        ))
        .bind(&name)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching schools");
            AppError::from(e)
        })?;

        Ok(Paginated::new(schools, total, &filters.pagination))
    }

    #[instrument(skip(db), fields(school.id = %school_id, db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school_by_id(db: &PgPool, school_id: Uuid) -> Result<School, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools WHERE id = $1",
            SCHOOL_COLUMNS
        ))
        .bind(school_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(school.id = %school_id, error = %e, "Database error fetching school");
            AppError::from(e)
        })?
        .ok_or_else(|| {
            debug!(school.id = %school_id, "School not found");
            AppError::not_found(anyhow!("School not found"))
        })
    }

    pub async fn exists(db: &PgPool, school_id: Uuid) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schools WHERE id = $1)")
                .bind(school_id)
                .fetch_one(db)
                .await?;
        Ok(exists)
    }

    /// Applies the provided fields. An empty update returns the school as is.
    #[instrument(skip(db, dto), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        if dto.is_empty() {
            return Self::get_school_by_id(db, school_id).await;
        }

        if let Some(email) = &dto.email
            && Self::email_taken(db, email, Some(school_id)).await?
        {
            return Err(AppError::conflict(anyhow!(EMAIL_TAKEN_MESSAGE)));
        }

        let school = sqlx::query_as::<_, School>(&format!(
            "UPDATE schools SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email),
                website = COALESCE($6, website),
                description = COALESCE($7, description),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            SCHOOL_COLUMNS
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.email)
        .bind(&dto.website)
        .bind(&dto.description)
        .fetch_optional(db)
        .await
        .map_err(map_school_write_error)?
        .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;

        info!(school.id = %school.id, "School updated");

        Ok(school)
    }

    /// Deletes the school with its class rooms, students and admin rows, then
    /// drops the roles those rows granted.
    #[instrument(skip(db, cache), fields(school.id = %school_id, db.operation = "DELETE", db.table = "schools"))]
    pub async fn delete_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let admins = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM school_admins WHERE school_id = $1")
            .bind(school_id)
            .fetch_all(&mut *tx)
            .await?;
        let students = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM students WHERE school_id = $1")
            .bind(school_id)
            .fetch_all(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM schools WHERE id = $1")
            .bind(school_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!(school.id = %school_id, error = %e, "Database error deleting school");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            debug!(school.id = %school_id, "School not found for deletion");
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        sqlx::query(
            "DELETE FROM user_roles
             WHERE role_id = $1 AND user_id = ANY($2)
               AND NOT EXISTS (SELECT 1 FROM school_admins sa WHERE sa.user_id = user_roles.user_id)",
        )
        .bind(system_roles::SCHOOL_ADMINISTRATOR)
        .bind(&admins)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_roles WHERE role_id = $1 AND user_id = ANY($2)")
            .bind(system_roles::STUDENT)
            .bind(&students)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for user_id in admins.iter().chain(students.iter()) {
            UserService::revalidate_user_roles(cache, *user_id).await;
        }

        info!(
            school.id = %school_id,
            admins = admins.len(),
            students = students.len(),
            "School deleted"
        );

        Ok(())
    }
}
