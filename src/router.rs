use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::handler::not_found_fallback;
use crate::api::{ApiHandler, MatrixError, api_routes};
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::rate_limit::{client_limiter, rate_limit_middleware, spawn_limiter_cleanup};
use crate::middleware::registry;
use crate::modules::managers;
use crate::state::AppState;

fn cors_layer(state: &AppState) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if state.cors_config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    layer.allow_origin(allowed_origins).allow_credentials(true)
}

/// Builds the method matrix from every manager and mounts the catch-all
/// dispatcher. Fails when a manager declares an invalid route.
pub fn init_router(state: AppState) -> Result<Router, MatrixError> {
    let api = ApiHandler::new(managers(&state), registry(&state)?)?;

    let modules: Vec<&str> = api.matrix().module_names().collect();
    info!(modules = ?modules, "Method matrix built");

    let mut router = api_routes(Arc::new(api)).fallback(not_found_fallback);

    if let Some(quota) = state.rate_limit_config.quota() {
        let limiter = client_limiter(quota);
        spawn_limiter_cleanup(
            limiter.clone(),
            Duration::from_secs(state.rate_limit_config.window_seconds.max(1)),
        );
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    Ok(router
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware)))
}
