use anyhow::anyhow;
use scholaris_core::{AppError, Paginated, contains_pattern};
use scholaris_models::class_rooms::{
    ClassRoom, ClassRoomFilterParams, CreateClassRoomDto, UpdateClassRoomDto,
};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::schools::service::SchoolService;

const CLASS_ROOM_COLUMNS: &str = "id, name, school_id, capacity, created_by, created_at, updated_at";

const NAME_TAKEN_MESSAGE: &str = "Class room name already exists";

fn map_class_room_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        warn!("Class room name raced an existing room");
        return AppError::conflict(anyhow!(NAME_TAKEN_MESSAGE));
    }
    error!(error = %e, "Database error writing class room");
    AppError::from(e)
}

pub struct ClassRoomService;

impl ClassRoomService {
    async fn name_taken(
        db: &PgPool,
        school_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM class_rooms
                WHERE school_id = $1 AND name = $2 AND ($3::uuid IS NULL OR id <> $3)
             )",
        )
        .bind(school_id)
        .bind(name)
        .bind(exclude)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    #[instrument(skip(db, dto), fields(school.id = %dto.school_id, db.operation = "INSERT", db.table = "class_rooms"))]
    pub async fn create_class_room(
        db: &PgPool,
        dto: CreateClassRoomDto,
        created_by: Uuid,
    ) -> Result<ClassRoom, AppError> {
        if !SchoolService::exists(db, dto.school_id).await? {
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        let name = dto.name.trim();
        if Self::name_taken(db, dto.school_id, name, None).await? {
            debug!(class_room.name = %name, "Class room name already in use");
            return Err(AppError::conflict(anyhow!(NAME_TAKEN_MESSAGE)));
        }

        let class_room = sqlx::query_as::<_, ClassRoom>(&format!(
            "INSERT INTO class_rooms (name, school_id, capacity, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            CLASS_ROOM_COLUMNS
        ))
        .bind(name)
        .bind(dto.school_id)
        .bind(dto.capacity)
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(map_class_room_write_error)?;

        info!(class_room.id = %class_room.id, class_room.name = %class_room.name, "Class room created");

        Ok(class_room)
    }

    #[instrument(skip(db), fields(class_room.id = %class_room_id, db.operation = "SELECT", db.table = "class_rooms"))]
    pub async fn get_class_room(db: &PgPool, class_room_id: Uuid) -> Result<ClassRoom, AppError> {
        sqlx::query_as::<_, ClassRoom>(&format!(
            "SELECT {} FROM class_rooms WHERE id = $1",
            CLASS_ROOM_COLUMNS
        ))
        .bind(class_room_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Class room not found")))
    }

    #[instrument(skip(db, filters), fields(school.id = %filters.school_id, db.operation = "SELECT", db.table = "class_rooms"))]
    pub async fn get_class_rooms(
        db: &PgPool,
        filters: ClassRoomFilterParams,
    ) -> Result<Paginated<ClassRoom>, AppError> {
        let name = filters.name.as_deref().map(contains_pattern);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM class_rooms
             WHERE school_id = $1 AND ($2::text IS NULL OR name ILIKE $2)",
        )
        .bind(filters.school_id)
        .bind(&name)
        .fetch_one(db)
        .await?;

        let class_rooms = sqlx::query_as::<_, ClassRoom>(&format!(
            "SELECT {} FROM class_rooms
             WHERE school_id = $1 AND ($2::text IS NULL OR name ILIKE $2)
             ORDER BY name
             LIMIT $3 OFFSET $4",
            CLASS_ROOM_COLUMNS
        ))
        .bind(filters.school_id)
        .bind(&name)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching class rooms");
            AppError::from(e)
        })?;

        Ok(Paginated::new(class_rooms, total, &filters.pagination))
    }

    /// Updates a room of `dto.school_id`. A room of another school is
    /// reported as missing.
    #[instrument(skip(db, dto), fields(class_room.id = %class_room_id, db.operation = "UPDATE", db.table = "class_rooms"))]
    pub async fn update_class_room(
        db: &PgPool,
        class_room_id: Uuid,
        dto: UpdateClassRoomDto,
    ) -> Result<ClassRoom, AppError> {
        let name = dto.name.as_deref().map(str::trim);

        if let Some(name) = name
            && Self::name_taken(db, dto.school_id, name, Some(class_room_id)).await?
        {
            return Err(AppError::conflict(anyhow!(NAME_TAKEN_MESSAGE)));
        }

        let class_room = sqlx::query_as::<_, ClassRoom>(&format!(
            "UPDATE class_rooms SET
                name = COALESCE($3, name),
                capacity = COALESCE($4, capacity),
                updated_at = NOW()
             WHERE id = $1 AND school_id = $2
             RETURNING {}",
            CLASS_ROOM_COLUMNS
        ))
        .bind(class_room_id)
        .bind(dto.school_id)
        .bind(name)
        .bind(dto.capacity)
        .fetch_optional(db)
        .await
        .map_err(map_class_room_write_error)?
        .ok_or_else(|| AppError::not_found(anyhow!("Class room not found")))?;

        info!(class_room.id = %class_room.id, "Class room updated");

        Ok(class_room)
    }

    #[instrument(skip(db), fields(class_room.id = %class_room_id, db.operation = "DELETE", db.table = "class_rooms"))]
    pub async fn delete_class_room(db: &PgPool, class_room_id: Uuid) -> Result<(), AppError> {
        let students = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE class_room_id = $1",
        )
        .bind(class_room_id)
        .fetch_one(db)
        .await?;

        if students > 0 {
            debug!(class_room.id = %class_room_id, students, "Refusing to delete occupied class room");
            return Err(AppError::conflict(anyhow!(
                "Class room has students and cannot be deleted"
            )));
        }

        let result = sqlx::query("DELETE FROM class_rooms WHERE id = $1")
            .bind(class_room_id)
            .execute(db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e
                    && db_err.is_foreign_key_violation()
                {
                    return AppError::conflict(anyhow!(
                        "Class room has students and cannot be deleted"
                    ));
                }
                error!(error = %e, "Database error deleting class room");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class room not found")));
        }

        info!(class_room.id = %class_room_id, "Class room deleted");

        Ok(())
    }
}
