use std::sync::Arc;

use scholaris_core::AppError;
use scholaris_models::auth::RefreshTokenRequest;
use scholaris_models::users::User;

use super::service::RefreshTokenService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, DEVICE};
use crate::state::AppState;

pub struct RefreshTokensManager {
    state: AppState,
}

impl RefreshTokensManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    async fn refresh_authentication_token(
        self: Arc<Self>,
        payload: Payload,
    ) -> Result<Outcome, AppError> {
        let dto: RefreshTokenRequest = payload.validated("Refresh token is required")?;
        let user: User = payload.middleware(AUTHENTICATION)?;
        let device: String = payload.middleware(DEVICE)?;

        let tokens = RefreshTokenService::refresh(
            &self.state.db,
            &self.state.jwt_config,
            &user,
            &dto.refresh_token,
            &device,
        )
        .await?;

        success_transformer("Refresh token refreshed successfully", &tokens, None)
    }
}

impl HttpExposed for RefreshTokensManager {
    fn module_name(&self) -> &'static str {
        "refresh-tokens"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![expose(
            &self,
            "post=index.refreshAuthenticationToken",
            &[DEVICE, AUTHENTICATION],
            Self::refresh_authentication_token,
        )]
    }
}
