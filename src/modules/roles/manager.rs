use std::sync::Arc;

use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::roles::CreateRoleDto;
use serde_json::json;
use uuid::Uuid;

use super::service::RoleService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, SUPER_ADMIN};
use crate::state::AppState;

pub struct RolesManager {
    state: AppState,
}

impl RolesManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn list_roles(self: Arc<Self>, _payload: Payload) -> Result<Outcome, AppError> {
        let roles = RoleService::list_roles(&self.state.db).await?;
        success_transformer("Roles fetched successfully", &json!({ "roles": roles }), None)
    }

    async fn create_role(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: CreateRoleDto = payload.validated("Invalid role data")?;
        let role = RoleService::create_role(&self.state.db, dto).await?;
        success_transformer(
            "Role created successfully",
            &json!({ "role": role }),
            Some(StatusCode::CREATED),
        )
    }

    async fn delete_role(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let role_id: Uuid = payload.param_as("roleId", "Invalid role id")?;
        RoleService::delete_role(&self.state.db, self.state.cache(), role_id).await?;
        success_transformer("Role deleted successfully", &json!({}), None)
    }
}

impl HttpExposed for RolesManager {
    fn module_name(&self) -> &'static str {
        "roles"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(&self, "get=index.listRoles", &[AUTHENTICATION], Self::list_roles),
            expose(
                &self,
                "post=index.createRole",
                &[AUTHENTICATION, SUPER_ADMIN],
                Self::create_role,
            ),
            expose(
                &self,
                "delete=deleteRole:roleId",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::delete_role,
            ),
        ]
    }
}
