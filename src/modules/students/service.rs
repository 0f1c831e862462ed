use anyhow::anyhow;
use chrono::{Datelike, Utc};
use rand::Rng;
use scholaris_cache::RedisCache;
use scholaris_core::{AppError, Paginated};
use scholaris_models::students::{CreateStudentDto, Student, StudentFilterParams, StudentStatus};
use scholaris_models::users::system_roles;
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::metrics::track_student_enrolled;
use crate::modules::class_rooms::service::ClassRoomService;
use crate::modules::schools::service::SchoolService;
use crate::modules::users::service::UserService;

const STUDENT_COLUMNS: &str =
    "id, user_id, school_id, class_room_id, registration_number, status, created_at, updated_at";

const REGISTRATION_ATTEMPTS: usize = 3;

/// `<year><last four hex digits of the class room id><four digit serial>`,
/// e.g. `2025A1F30042`.
pub fn registration_number(class_room_id: Uuid, year: i32, serial: u16) -> String {
    let room = class_room_id.simple().to_string().to_uppercase();
    format!("{}{}{:04}", year, &room[room.len() - 4..], serial % 10_000)
}

/// Target of a student update after defaults are applied.
#[derive(Debug, Clone)]
pub struct StudentChanges {
    pub school_id: Uuid,
    pub class_room_id: Uuid,
    pub status: StudentStatus,
}

pub struct StudentService;

impl StudentService {
    /// Enrols `user_id` in a class room and grants the `student` role.
    #[instrument(skip(db, cache, dto), fields(user.id = %user_id, school.id = %dto.school_id, db.operation = "INSERT", db.table = "students"))]
    pub async fn create_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
        dto: CreateStudentDto,
    ) -> Result<Student, AppError> {
        SchoolService::get_school_by_id(db, dto.school_id).await?;
        let class_room = ClassRoomService::get_class_room(db, dto.class_room_id).await?;

        if class_room.school_id != dto.school_id {
            return Err(AppError::bad_request(anyhow!(
                "Class room does not belong to this school"
            )));
        }

        if Self::find_by_user(db, user_id).await?.is_some() {
            return Err(AppError::bad_request(anyhow!("You are already a student")));
        }

        // A failed insert aborts its transaction, so every attempt gets its own.
        let mut attempt = 0;
        let student = loop {
            attempt += 1;
            let serial = rand::thread_rng().gen_range(0..10_000u16);
            let number = registration_number(class_room.id, Utc::now().year(), serial);

            let mut tx = db.begin().await?;
            match Self::insert_student(&mut *tx, user_id, &dto, &number).await {
                Ok(student) => {
                    UserService::assign_role(&mut *tx, user_id, system_roles::STUDENT).await?;
                    tx.commit().await?;
                    break student;
                }
                Err(e) => {
                    if let sqlx::Error::Database(db_err) = &e
                        && db_err.is_unique_violation()
                    {
                        if db_err.constraint() == Some("students_user_id_key") {
                            return Err(AppError::bad_request(anyhow!("You are already a student")));
                        }
                        if attempt < REGISTRATION_ATTEMPTS {
                            warn!(registration_number = %number, attempt, "Registration number collision, retrying");
                            continue;
                        }
                    }
                    error!(error = %e, "Database error creating student");
                    return Err(AppError::from(e));
                }
            }
        };

        UserService::revalidate_user_roles(cache, user_id).await;

        track_student_enrolled();
        info!(student.id = %student.id, student.registration_number = %student.registration_number, "Student enrolled");

        Ok(student)
    }

    async fn insert_student<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        dto: &CreateStudentDto,
        registration_number: &str,
    ) -> Result<Student, sqlx::Error> {
        sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (user_id, school_id, class_room_id, registration_number, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .bind(dto.school_id)
        .bind(dto.class_room_id)
        .bind(registration_number)
        .bind(StudentStatus::Pending.as_str())
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE user_id = $1",
            STUDENT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(student)
    }

    #[instrument(skip(db), fields(student.id = %student_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn get_student(db: &PgPool, student_id: Uuid) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE id = $1",
            STUDENT_COLUMNS
        ))
        .bind(student_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| {
            debug!(student.id = %student_id, "Student not found");
            AppError::not_found(anyhow!("Student not found"))
        })
    }

    #[instrument(skip(db, filters), fields(school.id = %filters.school_id, db.operation = "SELECT", db.table = "students"))]
    pub async fn get_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<Paginated<Student>, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students
             WHERE school_id = $1 AND ($2::uuid IS NULL OR class_room_id = $2)",
        )
        .bind(filters.school_id)
        .bind(filters.class_room_id)
        .fetch_one(db)
        .await?;

        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students
             WHERE school_id = $1 AND ($2::uuid IS NULL OR class_room_id = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
            STUDENT_COLUMNS
        ))
        .bind(filters.school_id)
        .bind(filters.class_room_id)
        .bind(filters.pagination.limit())
        .bind(filters.pagination.offset())
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching students");
            AppError::from(e)
        })?;

        Ok(Paginated::new(students, total, &filters.pagination))
    }

    /// Moves the student and sets its status. The target class room must
    /// belong to the target school.
    #[instrument(skip(db, changes), fields(student.id = %student_id, db.operation = "UPDATE", db.table = "students"))]
    pub async fn update_student(
        db: &PgPool,
        student_id: Uuid,
        changes: StudentChanges,
    ) -> Result<Student, AppError> {
        let class_room = ClassRoomService::get_class_room(db, changes.class_room_id).await?;
        if class_room.school_id != changes.school_id {
            return Err(AppError::bad_request(anyhow!(
                "Class room does not belong to this school"
            )));
        }

        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET
                school_id = $2,
                class_room_id = $3,
                status = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            STUDENT_COLUMNS
        ))
        .bind(student_id)
        .bind(changes.school_id)
        .bind(changes.class_room_id)
        .bind(changes.status.as_str())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Student not found")))?;

        info!(student.id = %student.id, student.status = %student.status, "Student updated");

        Ok(student)
    }

    /// Removes the enrolment and the `student` role it granted.
    #[instrument(skip(db, cache, student), fields(student.id = %student.id, db.operation = "DELETE", db.table = "students"))]
    pub async fn delete_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        student: &Student,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(student.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Student not found")));
        }

        UserService::revoke_role(&mut *tx, student.user_id, system_roles::STUDENT).await?;

        tx.commit().await?;

        UserService::revalidate_user_roles(cache, student.user_id).await;
        info!(student.id = %student.id, "Student deleted");

        Ok(())
    }
}
