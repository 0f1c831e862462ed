use async_trait::async_trait;
use axum::http::StatusCode;
use scholaris_models::users::User;
use serde_json::json;
use tracing::debug;

use super::auth::{authenticate, unauthorized};
use super::ids::{AUTHENTICATION, USER_ROLES};
use crate::api::{Flow, Middleware, MiddlewareResults, RequestContext, ResponseDispatcher};
use crate::metrics::track_authorization_check;
use crate::modules::users::service::UserService;
use crate::state::AppState;

pub const FORBIDDEN_MESSAGE: &str = "Forbidden Resource";

/// The caller as resolved by an earlier `__authentication`, or from the
/// bearer token when that guard did not run first.
async fn caller(
    state: &AppState,
    ctx: &RequestContext,
    done: &MiddlewareResults,
) -> anyhow::Result<Option<User>> {
    match done.get(AUTHENTICATION) {
        Some(user) => Ok(Some(serde_json::from_value(user.clone())?)),
        None => authenticate(state, ctx).await,
    }
}

async fn caller_roles(
    state: &AppState,
    user: &User,
    done: &MiddlewareResults,
) -> anyhow::Result<Vec<String>> {
    if let Some(roles) = done.get(USER_ROLES) {
        return Ok(serde_json::from_value(roles.clone())?);
    }

    UserService::get_user_roles(&state.db, state.cache(), user.id)
        .await
        .map_err(|e| e.error)
}

/// `__userRoles`: contributes the caller's role slugs.
pub struct UserRolesMiddleware {
    state: AppState,
}

impl UserRolesMiddleware {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Middleware for UserRolesMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        let Some(user) = caller(&self.state, ctx, done).await? else {
            return Ok(unauthorized());
        };

        let roles = caller_roles(&self.state, &user, done).await?;
        Ok(Flow::Next(Some(json!(roles))))
    }
}

/// Admits only callers holding `role`.
pub struct RequireRole {
    state: AppState,
    role: &'static str,
}

impl RequireRole {
    pub fn new(state: AppState, role: &'static str) -> Self {
        Self { state, role }
    }
}

#[async_trait]
impl Middleware for RequireRole {
    async fn handle(
        &self,
        ctx: &RequestContext,
        done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        let Some(user) = caller(&self.state, ctx, done).await? else {
            return Ok(unauthorized());
        };

        let roles = caller_roles(&self.state, &user, done).await?;
        let allowed = roles.iter().any(|role| role == self.role);
        track_authorization_check(allowed, self.role);

        if !allowed {
            debug!(user.id = %user.id, required = %self.role, "Role check failed");
            return Ok(Flow::Halt(ResponseDispatcher::failure(
                StatusCode::FORBIDDEN,
                FORBIDDEN_MESSAGE,
            )));
        }

        Ok(Flow::Next(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CortexHandle;
    use axum::http::{HeaderMap, Method};
    use chrono::Utc;
    use scholaris_config::{CorsConfig, JwtConfig, RateLimitConfig};
    use serde_json::Map;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    // The pool never connects: these paths must not reach the database.
    fn offline_state() -> AppState {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://offline@localhost/unused")
            .unwrap();
        AppState {
            db,
            cache: None,
            jwt_config: JwtConfig::default(),
            cors_config: CorsConfig::default(),
            rate_limit_config: RateLimitConfig::disabled(),
            cortex: CortexHandle::channel(1).0,
        }
    }

    fn anonymous() -> RequestContext {
        RequestContext {
            module: "schools".into(),
            function: "getSchools".into(),
            method: Method::GET,
            path: "/api/schools".into(),
            headers: HeaderMap::new(),
            params: Map::new(),
            query: Map::new(),
        }
    }

    fn authenticated(roles: &[&str]) -> MiddlewareResults {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            username: "adaobi".into(),
            email: "ada@example.com".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut done = MiddlewareResults::new();
        done.insert(AUTHENTICATION.into(), serde_json::to_value(user).unwrap());
        done.insert(USER_ROLES.into(), json!(roles));
        done
    }

    #[tokio::test]
    async fn test_reuses_earlier_authentication() {
        let guard = RequireRole::new(offline_state(), "super-admin");
        let done = authenticated(&["super-admin", "user"]);

        let flow = guard.handle(&anonymous(), &done).await.unwrap();
        assert!(matches!(flow, Flow::Next(None)));
    }

    #[tokio::test]
    async fn test_forbids_missing_role_from_earlier_results() {
        let guard = RequireRole::new(offline_state(), "super-admin");
        let done = authenticated(&["user"]);

        match guard.handle(&anonymous(), &done).await.unwrap() {
            Flow::Halt(response) => assert_eq!(response.status(), StatusCode::FORBIDDEN),
            Flow::Next(_) => panic!("expected the guard to halt"),
        }
    }

    #[tokio::test]
    async fn test_user_roles_passes_through_earlier_roles() {
        let middleware = UserRolesMiddleware::new(offline_state());
        let done = authenticated(&["student", "user"]);

        match middleware.handle(&anonymous(), &done).await.unwrap() {
            Flow::Next(Some(roles)) => assert_eq!(roles, json!(["student", "user"])),
            _ => panic!("expected roles"),
        }
    }

    #[tokio::test]
    async fn test_without_token_or_results_is_unauthorized() {
        let guard = RequireRole::new(offline_state(), "super-admin");

        match guard.handle(&anonymous(), &MiddlewareResults::new()).await.unwrap() {
            Flow::Halt(response) => assert_eq!(response.status(), StatusCode::UNAUTHORIZED),
            Flow::Next(_) => panic!("expected the guard to halt"),
        }
    }
}
