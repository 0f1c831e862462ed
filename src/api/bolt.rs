//! Bolt: runs a function's middleware stack in order.
//!
//! Each middleware either continues, optionally contributing a value stored
//! under its own name, or halts the request with a complete response. When
//! every middleware has continued, the collected results are handed to the
//! completion callback. A failing middleware stops the chain with a 500.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::{Map, Value};
use tracing::{debug, error};

use super::context::RequestContext;
use super::matrix::MatrixError;
use super::response::ResponseDispatcher;

pub const MIDDLEWARE_PREFIX: &str = "__";

pub type MiddlewareResults = Map<String, Value>;

pub enum Flow {
    Next(Option<Value>),
    Halt(Response),
}

#[async_trait]
pub trait Middleware: Send + Sync {
    /// `done` holds the results of the middlewares that ran before this one.
    async fn handle(
        &self,
        ctx: &RequestContext,
        done: &MiddlewareResults,
    ) -> anyhow::Result<Flow>;
}

#[derive(Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, Arc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("MiddlewareRegistry")
            .field("middlewares", &names)
            .finish()
    }
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M>(&mut self, name: &str, middleware: M) -> Result<(), MatrixError>
    where
        M: Middleware + 'static,
    {
        if !name.starts_with(MIDDLEWARE_PREFIX) || name.len() == MIDDLEWARE_PREFIX.len() {
            return Err(MatrixError::InvalidMiddlewareName(name.to_string()));
        }
        if self.entries.contains_key(name) {
            return Err(MatrixError::DuplicateMiddleware(name.to_string()));
        }
        self.entries.insert(name.to_string(), Arc::new(middleware));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Middleware>> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Bolt<'a> {
    registry: &'a MiddlewareRegistry,
    stack: &'a [String],
}

impl<'a> Bolt<'a> {
    pub fn new(registry: &'a MiddlewareRegistry, stack: &'a [String]) -> Self {
        Self { registry, stack }
    }

    pub async fn run<F, Fut>(self, ctx: &RequestContext, on_done: F) -> Response
    where
        F: FnOnce(MiddlewareResults) -> Fut,
        Fut: Future<Output = Response>,
    {
        let mut results = MiddlewareResults::new();

        for name in self.stack {
            let Some(middleware) = self.registry.get(name) else {
                error!(middleware = %name, module = %ctx.module, function = %ctx.function, "Middleware missing from registry");
                return ResponseDispatcher::internal_error();
            };

            match middleware.handle(ctx, &results).await {
                Ok(Flow::Next(value)) => {
                    if let Some(value) = value {
                        results.insert(name.clone(), value);
                    }
                }
                Ok(Flow::Halt(response)) => {
                    debug!(
                        middleware = %name,
                        module = %ctx.module,
                        function = %ctx.function,
                        status = %response.status().as_u16(),
                        "Middleware halted request"
                    );
                    return response;
                }
                Err(e) => {
                    error!(
                        middleware = %name,
                        module = %ctx.module,
                        function = %ctx.function,
                        error = %e,
                        "Middleware failed"
                    );
                    return ResponseDispatcher::internal_error();
                }
            }
        }

        on_done(results).await
    }
}
