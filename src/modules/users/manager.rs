use std::sync::Arc;

use scholaris_core::AppError;
use scholaris_models::users::{User, UserProfile};
use serde_json::json;
use uuid::Uuid;

use super::service::UserService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, SUPER_ADMIN, USER_ROLES};
use crate::state::AppState;

pub struct UsersManager {
    state: AppState,
}

impl UsersManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn me(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let user: User = payload.middleware(AUTHENTICATION)?;
        let roles: Vec<String> = payload.middleware(USER_ROLES)?;

        success_transformer(
            "User fetched successfully",
            &json!({ "user": UserProfile { user, roles } }),
            None,
        )
    }

    async fn get_user(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let user_id: Uuid = payload.param_as("userId", "Invalid user id")?;
        let user = UserService::get_user_or_404(&self.state.db, self.state.cache(), user_id).await?;
        let roles = UserService::get_user_roles(&self.state.db, self.state.cache(), user_id).await?;

        success_transformer(
            "User fetched successfully",
            &json!({ "user": UserProfile { user, roles } }),
            None,
        )
    }
}

impl HttpExposed for UsersManager {
    fn module_name(&self) -> &'static str {
        "users"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(&self, "get=index.me", &[AUTHENTICATION, USER_ROLES], Self::me),
            expose(
                &self,
                "get=getUser:userId",
                &[AUTHENTICATION, SUPER_ADMIN, PARAMS],
                Self::get_user,
            ),
        ]
    }
}
