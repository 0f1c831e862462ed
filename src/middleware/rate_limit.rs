use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::api::ResponseDispatcher;

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later";

pub type ClientLimiter = DefaultKeyedRateLimiter<String>;

pub fn client_limiter(quota: Quota) -> Arc<ClientLimiter> {
    Arc::new(RateLimiter::keyed(quota))
}

/// Periodically forgets clients whose budget has fully replenished.
pub fn spawn_limiter_cleanup(limiter: Arc<ClientLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            debug!(tracked_clients = limiter.len(), "Rate limiter pruned");
        }
    });
}

/// The first `X-Forwarded-For` hop, else the peer address.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<ClientLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req);

    if limiter.check_key(&key).is_err() {
        warn!(client = %key, path = %req.uri().path(), "Rate limit exceeded");
        return ResponseDispatcher::failure(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE);
    }

    next.run(req).await
}
