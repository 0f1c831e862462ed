//! How managers declare their HTTP surface.
//!
//! A manager lists its routes explicitly; each route names the function's
//! specifier, the middleware stack that guards it and the async method that
//! serves it.
//!
//! ```ignore
//! impl HttpExposed for SchoolsManager {
//!     fn module_name(&self) -> &'static str { "schools" }
//!
//!     fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
//!         vec![expose(&self, "get=getSchool:id", &[AUTHENTICATION, PARAMS], Self::get_school)]
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use scholaris_core::AppError;

use super::payload::Payload;
use super::response::Outcome;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Outcome, AppError>> + Send>>;

pub type Handler = Arc<dyn Fn(Payload) -> HandlerFuture + Send + Sync>;

#[derive(Clone)]
pub struct ExposedRoute {
    pub spec: &'static str,
    pub guards: &'static [&'static str],
    pub handler: Handler,
}

impl std::fmt::Debug for ExposedRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExposedRoute")
            .field("spec", &self.spec)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

/// Binds `method` on a shared manager to a route specifier.
pub fn expose<M, F, Fut>(
    manager: &Arc<M>,
    spec: &'static str,
    guards: &'static [&'static str],
    method: F,
) -> ExposedRoute
where
    M: Send + Sync + 'static,
    F: Fn(Arc<M>, Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Outcome, AppError>> + Send + 'static,
{
    let manager = Arc::clone(manager);
    ExposedRoute {
        spec,
        guards,
        handler: Arc::new(move |payload| -> HandlerFuture {
            Box::pin(method(Arc::clone(&manager), payload))
        }),
    }
}

pub trait HttpExposed: Send + Sync {
    fn module_name(&self) -> &'static str;

    /// The module's routes. An empty list keeps the module off the API.
    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute>;
}
