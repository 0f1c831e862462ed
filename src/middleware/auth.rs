use async_trait::async_trait;
use axum::http::StatusCode;
use scholaris_auth::verify_short_token;
use scholaris_models::users::User;
use tracing::debug;

use crate::api::{Flow, Middleware, MiddlewareResults, RequestContext, ResponseDispatcher};
use crate::modules::users::service::UserService;
use crate::state::AppState;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

pub fn unauthorized() -> Flow {
    Flow::Halt(ResponseDispatcher::failure(
        StatusCode::UNAUTHORIZED,
        UNAUTHORIZED_MESSAGE,
    ))
}

/// Resolves the bearer token to a user. `None` covers a missing or invalid
/// token and a token whose user no longer exists.
pub async fn authenticate(state: &AppState, ctx: &RequestContext) -> anyhow::Result<Option<User>> {
    let Some(token) = ctx.bearer_token() else {
        debug!(module = %ctx.module, "No bearer token");
        return Ok(None);
    };

    let claims = match verify_short_token(&token, &state.jwt_config) {
        Ok(claims) => claims,
        Err(err) => {
            debug!(error = %err.error, "Rejected auth token");
            return Ok(None);
        }
    };

    UserService::get_user(&state.db, state.cache(), claims.user_id)
        .await
        .map_err(|e| e.error)
}

/// `__authentication`: contributes the caller's [`User`].
pub struct AuthenticationMiddleware {
    state: AppState,
}

impl AuthenticationMiddleware {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        match authenticate(&self.state, ctx).await? {
            Some(user) => Ok(Flow::Next(Some(serde_json::to_value(user)?))),
            None => Ok(unauthorized()),
        }
    }
}
