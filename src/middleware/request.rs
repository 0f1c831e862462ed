use async_trait::async_trait;
use serde_json::Value;

use crate::api::{Flow, Middleware, MiddlewareResults, RequestContext};

pub const UNKNOWN_DEVICE: &str = "unknown";

pub struct ParamsMiddleware;

#[async_trait]
impl Middleware for ParamsMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        Ok(Flow::Next(Some(Value::Object(ctx.params.clone()))))
    }
}

pub struct QueryMiddleware;

#[async_trait]
impl Middleware for QueryMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        Ok(Flow::Next(Some(Value::Object(ctx.query.clone()))))
    }
}

pub struct HeadersMiddleware;

#[async_trait]
impl Middleware for HeadersMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        Ok(Flow::Next(Some(Value::Object(ctx.headers_as_json()))))
    }
}

/// The caller's user agent; device-bound tokens are derived from it.
pub struct DeviceMiddleware;

#[async_trait]
impl Middleware for DeviceMiddleware {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _done: &MiddlewareResults,
    ) -> anyhow::Result<Flow> {
        let device = ctx.user_agent().unwrap_or(UNKNOWN_DEVICE);
        Ok(Flow::Next(Some(Value::String(device.to_string()))))
    }
}
