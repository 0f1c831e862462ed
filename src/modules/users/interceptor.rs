use anyhow::anyhow;
use async_trait::async_trait;
use scholaris_core::AppError;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::service::UserService;
use crate::api::{CortexEvent, Interceptor};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserLookup {
    user_id: Uuid,
}

/// Answers `users.getUser` and `users.getUserRoles` on the event bus.
pub struct UsersInterceptor {
    state: AppState,
}

impl UsersInterceptor {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Interceptor for UsersInterceptor {
    fn module_name(&self) -> &'static str {
        "users"
    }

    fn cortex_exposed(&self) -> &'static [&'static str] {
        &["getUser", "getUserRoles"]
    }

    async fn intercept(&self, event: CortexEvent) -> Result<Value, AppError> {
        let UserLookup { user_id } = serde_json::from_value(event.data)
            .map_err(|e| AppError::unprocessable(anyhow!("Invalid user lookup: {}", e)))?;

        match event.function.as_str() {
            "getUser" => {
                let user = UserService::get_user(&self.state.db, self.state.cache(), user_id).await?;
                Ok(json!({ "user": user }))
            }
            "getUserRoles" => {
                let roles =
                    UserService::get_user_roles(&self.state.db, self.state.cache(), user_id).await?;
                Ok(json!({ "roles": roles }))
            }
            other => Err(AppError::not_found(anyhow!("Unknown function {}", other))),
        }
    }
}
