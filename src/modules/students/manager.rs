use std::sync::Arc;

use anyhow::anyhow;
use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::students::{
    CreateStudentDto, StudentFilterParams, StudentStatus, UpdateStudentDto,
};
use scholaris_models::users::User;
use serde_json::json;
use uuid::Uuid;

use super::service::{StudentChanges, StudentService};
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, QUERY, SCHOOL_ADMINISTRATOR};
use crate::modules::school_admins::service::SchoolAdminService;
use crate::state::AppState;

pub struct StudentsManager {
    state: AppState,
}

impl StudentsManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn student_id(payload: &Payload) -> Result<Uuid, AppError> {
        payload.param_as("studentId", "Invalid student data")
    }

    async fn create_student(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: CreateStudentDto = payload.parse("Invalid student data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let student =
            StudentService::create_student(&self.state.db, self.state.cache(), caller.id, dto)
                .await?;

        success_transformer(
            "Student created successfully",
            &json!({ "student": student }),
            Some(StatusCode::CREATED),
        )
    }

    /// Visible to the enrolled user and to administrators of the school.
    async fn get_single_student(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let student_id = Self::student_id(&payload)?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let student = StudentService::get_student(&self.state.db, student_id).await?;

        if student.user_id != caller.id
            && !SchoolAdminService::is_school_admin(&self.state.db, caller.id, student.school_id)
                .await?
        {
            return Err(AppError::forbidden(anyhow!(
                "You are not authorized to view this student"
            )));
        }

        success_transformer("Student fetched successfully", &json!({ "student": student }), None)
    }

    async fn update_student(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let student_id = Self::student_id(&payload)?;
        let dto: UpdateStudentDto = payload.parse("Invalid student data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let status = match dto.status.as_deref() {
            Some(status) => Some(
                status
                    .parse::<StudentStatus>()
                    .map_err(|_| AppError::unprocessable(anyhow!("Invalid student status")))?,
            ),
            None => None,
        };

        let student = StudentService::get_student(&self.state.db, student_id).await?;
        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, student.school_id)
            .await?;

        let school_id = dto.school_id.unwrap_or(student.school_id);
        if school_id != student.school_id {
            SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, school_id).await?;
        }

        let current_status = student
            .status
            .parse::<StudentStatus>()
            .unwrap_or(StudentStatus::Pending);

        let changes = StudentChanges {
            school_id,
            class_room_id: dto.class_room_id.unwrap_or(student.class_room_id),
            status: status.unwrap_or(current_status),
        };

        let student = StudentService::update_student(&self.state.db, student_id, changes).await?;

        success_transformer("Student updated successfully", &json!({ "student": student }), None)
    }

    async fn get_students(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let filters: StudentFilterParams = payload.query("Invalid student data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, filters.school_id)
            .await?;
        let students = StudentService::get_students(&self.state.db, filters).await?;

        success_transformer("Students fetched successfully", &students, None)
    }

    async fn delete_student(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let student_id = Self::student_id(&payload)?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let student = StudentService::get_student(&self.state.db, student_id).await?;
        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, student.school_id)
            .await?;
        StudentService::delete_student(&self.state.db, self.state.cache(), &student).await?;

        success_transformer("Student deleted successfully", &json!({}), None)
    }
}

impl HttpExposed for StudentsManager {
    fn module_name(&self) -> &'static str {
        "students"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(
                &self,
                "post=index.createStudent",
                &[AUTHENTICATION],
                Self::create_student,
            ),
            expose(
                &self,
                "get=getSingleStudent:studentId",
                &[AUTHENTICATION, PARAMS],
                Self::get_single_student,
            ),
            expose(
                &self,
                "patch=updateStudent:studentId",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, PARAMS],
                Self::update_student,
            ),
            expose(
                &self,
                "get=index.getStudents",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, QUERY],
                Self::get_students,
            ),
            expose(
                &self,
                "delete=deleteStudent:studentId",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, PARAMS],
                Self::delete_student,
            ),
        ]
    }
}
