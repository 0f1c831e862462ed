use std::sync::Arc;

use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::schools::{CreateSchoolDto, SchoolFilterParams, UpdateSchoolDto};
use scholaris_models::users::User;
use serde_json::json;
use uuid::Uuid;

use super::service::SchoolService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, QUERY, SUPER_ADMIN};
use crate::state::AppState;

pub struct SchoolsManager {
    state: AppState,
}

impl SchoolsManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn school_id(payload: &Payload) -> Result<Uuid, AppError> {
        payload.param_as("id", "Invalid school id")
    }

    async fn create_school(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: CreateSchoolDto = payload.validated("Invalid school data")?;
        let user: User = payload.middleware(AUTHENTICATION)?;

        let school =
            SchoolService::create_school(&self.state.db, self.state.cache(), dto, user.id).await?;

        success_transformer(
            "School created successfully",
            &json!({ "school": school }),
            Some(StatusCode::CREATED),
        )
    }

    async fn get_schools(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let filters: SchoolFilterParams = payload.query("Invalid school filters")?;
        let schools = SchoolService::get_schools(&self.state.db, filters).await?;
        success_transformer("Schools fetched successfully", &schools, None)
    }

    async fn get_school(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let school = SchoolService::get_school_by_id(&self.state.db, Self::school_id(&payload)?).await?;
        success_transformer("School fetched successfully", &json!({ "school": school }), None)
    }

    async fn update_school(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let school_id = Self::school_id(&payload)?;
        let dto: UpdateSchoolDto = payload.validated("Invalid school data")?;

        let school = SchoolService::update_school(&self.state.db, school_id, dto).await?;

        success_transformer("School updated successfully", &json!({ "school": school }), None)
    }

    async fn delete_school(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let school_id = Self::school_id(&payload)?;
        SchoolService::delete_school(&self.state.db, self.state.cache(), school_id).await?;
        success_transformer("School deleted successfully", &json!({}), None)
    }
}

impl HttpExposed for SchoolsManager {
    fn module_name(&self) -> &'static str {
        "schools"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(
                &self,
                "post=index.createSchool",
                &[AUTHENTICATION, SUPER_ADMIN],
                Self::create_school,
            ),
            expose(
                &self,
                "get=index.getSchools",
                &[AUTHENTICATION, SUPER_ADMIN, QUERY],
                Self::get_schools,
            ),
            expose(
                &self,
                "get=getSchool:id",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::get_school,
            ),
            expose(
                &self,
                "patch=updateSchool:id",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::update_school,
            ),
            expose(
                &self,
                "delete=deleteSchool:id",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::delete_school,
            ),
        ]
    }
}
