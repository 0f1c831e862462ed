use std::sync::Arc;

use anyhow::anyhow;
use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::school_admins::{CreateSchoolAdminDto, SchoolAdminFilterParams};
use scholaris_models::users::User;
use serde_json::json;
use uuid::Uuid;

use super::service::SchoolAdminService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, QUERY, SUPER_ADMIN};
use crate::state::AppState;

pub struct SchoolAdminsManager {
    state: AppState,
}

impl SchoolAdminsManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn create_school_admin(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: CreateSchoolAdminDto = payload.parse("Invalid school admin data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let school = self
            .state
            .cortex
            .call("schools.getSchoolById", json!({ "schoolId": dto.school_id }))
            .await?;
        if school["school"].is_null() {
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        let user = self
            .state
            .cortex
            .call("users.getUser", json!({ "userId": dto.user_id }))
            .await?;
        if user["user"].is_null() {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        let admin = SchoolAdminService::create_school_admin(
            &self.state.db,
            self.state.cache(),
            dto,
            caller.id,
        )
        .await?;

        success_transformer(
            "School admin created successfully",
            &json!({ "schoolAdmin": admin }),
            Some(StatusCode::CREATED),
        )
    }

    async fn get_single_school_admin(
        self: Arc<Self>,
        payload: Payload,
    ) -> Result<Outcome, AppError> {
        let id: Uuid = payload.param_as("schoolAdminId", "Invalid school admin id")?;
        let admin = SchoolAdminService::get_school_admin(&self.state.db, id).await?;
        success_transformer(
            "School admin fetched successfully",
            &json!({ "schoolAdmin": admin }),
            None,
        )
    }

    async fn get_school_admins(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let filters: SchoolAdminFilterParams = payload.query("Invalid school admin filters")?;
        let admins = SchoolAdminService::get_school_admins(&self.state.db, filters).await?;
        success_transformer("School admins fetched successfully", &admins, None)
    }

    async fn delete_school_admin(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let id: Uuid = payload.param_as("schoolAdminId", "Invalid school admin id")?;
        SchoolAdminService::delete_school_admin(&self.state.db, self.state.cache(), id).await?;
        success_transformer("School admin deleted successfully", &json!({}), None)
    }
}

impl HttpExposed for SchoolAdminsManager {
    fn module_name(&self) -> &'static str {
        "school-admins"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(
                &self,
                "post=index.createSchoolAdmin",
                &[AUTHENTICATION, SUPER_ADMIN],
                Self::create_school_admin,
            ),
            expose(
                &self,
                "get=getSingleSchoolAdmin:schoolAdminId",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::get_single_school_admin,
            ),
            expose(
                &self,
                "get=index.getSchoolAdmins",
                &[AUTHENTICATION, SUPER_ADMIN, QUERY],
                Self::get_school_admins,
            ),
            expose(
                &self,
                "delete=deleteSchoolAdmin:schoolAdminId",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::delete_school_admin,
            ),
        ]
    }
}
