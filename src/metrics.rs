use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{Router, extract::Request, middleware::Next, response::Response, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// `OBSERVABILITY_ENABLED` unless set to `false` or `0`.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
/// Returns `Ok(None)` if observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Every API call shares one axum route, so requests are labelled by the
/// module they address instead of the matched path.
fn route_label(path: &str) -> String {
    match path.strip_prefix("/api/") {
        Some(rest) => {
            let module = rest.split('/').next().unwrap_or_default();
            format!("/api/{}", module)
        }
        None => "other".to_string(),
    }
}

fn status_class(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = route_label(req.uri().path());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status_class(status)
    )
    .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "route" => route)
        .record(start.elapsed().as_secs_f64());

    response
}

/// The `/metrics` endpoint served on the metrics port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Counts dispatched manager functions by outcome.
pub fn track_api_dispatch(module: &str, function: &str, outcome: &'static str) {
    if is_observability_enabled() {
        counter!(
            "api_dispatch_total",
            "module" => module.to_string(),
            "function" => function.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

pub fn track_user_registered() {
    if is_observability_enabled() {
        counter!("users_registered_total").increment(1);
    }
}

pub fn track_user_login_success() {
    if is_observability_enabled() {
        counter!("user_logins_total", "status" => "success").increment(1);
    }
}

pub fn track_user_login_failure(reason: &'static str) {
    if is_observability_enabled() {
        counter!("user_logins_total", "status" => "failure", "reason" => reason).increment(1);
    }
}

/// `kind` is `pair` for an auth token plus refresh token.
pub fn track_tokens_issued(kind: &'static str) {
    if is_observability_enabled() {
        counter!("tokens_issued_total", "kind" => kind).increment(1);
    }
}

pub fn track_refresh_rejected(reason: &'static str) {
    if is_observability_enabled() {
        counter!("refresh_tokens_rejected_total", "reason" => reason).increment(1);
    }
}

pub fn track_school_created() {
    if is_observability_enabled() {
        counter!("schools_created_total").increment(1);
    }
}

pub fn track_student_enrolled() {
    if is_observability_enabled() {
        counter!("students_enrolled_total").increment(1);
    }
}

pub fn track_authorization_check(allowed: bool, role: &str) {
    if is_observability_enabled() {
        let status = if allowed { "allowed" } else { "denied" };
        counter!("role_checks_total", "role" => role.to_string(), "status" => status)
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label("/api/schools/42"), "/api/schools");
        assert_eq!(route_label("/api/auth"), "/api/auth");
        assert_eq!(route_label("/favicon.ico"), "other");
    }

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(201), "2xx");
        assert_eq!(status_class(429), "4xx");
        assert_eq!(status_class(500), "5xx");
    }
}
