use std::sync::Arc;

use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::auth::{LoginRequest, RegisterRequest};
use serde_json::json;

use super::service::AuthService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::DEVICE;
use crate::state::AppState;

pub struct AuthManager {
    state: AppState,
}

impl AuthManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn index(self: Arc<Self>, _payload: Payload) -> Result<Outcome, AppError> {
        success_transformer("Auth module is running", &json!({}), None)
    }

    async fn login(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: LoginRequest = payload.validated("Invalid login data")?;
        let device: String = payload.middleware(DEVICE)?;

        let response = AuthService::login(&self.state.db, &self.state.jwt_config, dto, &device).await?;

        success_transformer("Login successful", &response, None)
    }

    async fn register(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: RegisterRequest = payload.validated("Invalid registration data")?;
        let device: String = payload.middleware(DEVICE)?;

        let response =
            AuthService::register(&self.state.db, &self.state.jwt_config, dto, &device).await?;

        success_transformer(
            "User registered successfully",
            &response,
            Some(StatusCode::CREATED),
        )
    }
}

impl HttpExposed for AuthManager {
    fn module_name(&self) -> &'static str {
        "auth"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(&self, "login", &[DEVICE], Self::login),
            expose(&self, "register", &[DEVICE], Self::register),
            expose(&self, "index", &[], Self::index),
            expose(&self, "get=index", &[], Self::index),
        ]
    }
}
