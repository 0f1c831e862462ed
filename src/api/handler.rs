//! The HTTP adapter: `ALL /api/{module_name}[/{fn_name}]`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Router,
    body::Bytes,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::Response,
    routing::any,
};
use scholaris_core::AppError;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::bolt::{Bolt, MiddlewareRegistry};
use super::context::RequestContext;
use super::exposed::{Handler, HttpExposed};
use super::matrix::{MatrixError, MethodMatrix, Resolution};
use super::payload::Payload;
use super::response::{Dispatch, Outcome, ResponseDispatcher};
use super::route::RouteSpec;
use crate::metrics::track_api_dispatch;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON payload";
pub const INVALID_QUERY_MESSAGE: &str = "Invalid query string";

/// A request as seen by the dispatcher, independent of axum extractors.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub module: String,
    pub fn_name: Option<String>,
    pub headers: HeaderMap,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

pub struct ApiHandler {
    matrix: MethodMatrix,
    handlers: HashMap<String, Handler>,
    middlewares: MiddlewareRegistry,
}

impl std::fmt::Debug for ApiHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandler")
            .field("matrix", &self.matrix)
            .field("middlewares", &self.middlewares)
            .finish_non_exhaustive()
    }
}

fn handler_key(module: &str, function: &str) -> String {
    format!("{}.{}", module, function)
}

impl ApiHandler {
    /// Builds the method matrix from every manager's declared routes.
    ///
    /// # Errors
    ///
    /// Fails on a malformed specifier, a second parametrized or indexed route
    /// for the same verb, a guard missing from `middlewares`, or a module name
    /// used twice.
    pub fn new(
        managers: Vec<Arc<dyn HttpExposed>>,
        middlewares: MiddlewareRegistry,
    ) -> Result<Self, MatrixError> {
        let mut matrix = MethodMatrix::new();
        let mut handlers = HashMap::new();

        for manager in managers {
            let module = manager.module_name();
            let routes = manager.http_exposed();

            if routes.is_empty() {
                debug!(module = %module, "Module exposes no routes, skipping");
                continue;
            }

            matrix.add_module(module)?;
            let count = routes.len();

            for route in routes {
                let spec = RouteSpec::parse(route.spec)?;
                matrix.add_route(module, &spec, route.guards, &middlewares)?;
                handlers
                    .entry(handler_key(module, &spec.function))
                    .or_insert(route.handler);
            }

            info!(module = %module, routes = count, "Module exposed over HTTP");
        }

        Ok(Self {
            matrix,
            handlers,
            middlewares,
        })
    }

    pub fn matrix(&self) -> &MethodMatrix {
        &self.matrix
    }

    #[instrument(skip(self, request), fields(module = %request.module, method = %request.method))]
    pub async fn handle(&self, request: ApiRequest) -> Response {
        let ApiRequest {
            method,
            path,
            module,
            fn_name,
            headers,
            query,
            body,
        } = request;

        let resolution = self.matrix.resolve(&module, &method, fn_name.as_deref());

        let mut params = Map::new();
        let function = match resolution {
            Resolution::NotFound => {
                return ResponseDispatcher::not_found(method.as_str(), &path);
            }
            Resolution::Plain { function } | Resolution::Indexed { function } => {
                params.insert("moduleName".into(), Value::String(module.clone()));
                if let Some(fn_name) = &fn_name {
                    params.insert("fnName".into(), Value::String(fn_name.clone()));
                }
                function
            }
            Resolution::Parametrized {
                param,
                value,
                function,
            } => {
                params.insert(param, Value::String(value));
                params.insert("fnName".into(), Value::String(function.clone()));
                function
            }
        };

        let Some(handler) = self.handlers.get(&handler_key(&module, &function)).cloned() else {
            error!(module = %module, function = %function, "Resolved function has no handler");
            return ResponseDispatcher::internal_error();
        };

        debug!(module = %module, function = %function, "Dispatching");

        let ctx = RequestContext {
            module: module.clone(),
            function: function.clone(),
            method,
            path,
            headers,
            params,
            query,
        };

        let stack = self.matrix.stack(&module, &function);

        Bolt::new(&self.middlewares, stack)
            .run(&ctx, |results| async move {
                let payload = Payload::new(body, results);
                let outcome = execute(handler, payload, &module, &function).await;
                render(outcome, &module, &function)
            })
            .await
    }
}

/// Runs the handler on its own task so a panic is contained to this request.
async fn execute(handler: Handler, payload: Payload, module: &str, function: &str) -> Outcome {
    match tokio::spawn(handler(payload)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            if err.is_server_error() {
                error!(module = %module, function = %function, error = ?err.error, "Handler failed");
            } else {
                debug!(module = %module, function = %function, status = %err.status.as_u16(), error = %err.error, "Handler rejected request");
            }
            Outcome::from(err)
        }
        Err(join_error) => {
            error!(module = %module, function = %function, error = %join_error, "Handler panicked");
            Outcome::from(AppError::internal(anyhow!("handler panicked")))
        }
    }
}

fn render(outcome: Outcome, module: &str, function: &str) -> Response {
    match outcome {
        Outcome::SelfHandled(response) => {
            track_api_dispatch(module, function, "self_handled");
            response
        }
        Outcome::Failure {
            message,
            errors,
            code,
        } => {
            track_api_dispatch(module, function, "failure");
            ResponseDispatcher::dispatch(Dispatch {
                ok: false,
                code,
                errors: Some(errors),
                message: Some(message),
                data: None,
            })
        }
        Outcome::Success {
            data: Value::Null, ..
        } => {
            warn!(module = %module, function = %function, "Invalid response from handler");
            track_api_dispatch(module, function, "invalid");
            ResponseDispatcher::internal_error()
        }
        Outcome::Success {
            message,
            data,
            code,
        } => {
            track_api_dispatch(module, function, "success");
            ResponseDispatcher::dispatch(Dispatch {
                ok: true,
                code,
                data: Some(data),
                message: Some(message),
                errors: None,
            })
        }
    }
}

fn parse_body(bytes: &[u8]) -> Option<Map<String, Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Map::new());
    }

    match serde_json::from_slice::<Value>(bytes).ok()? {
        Value::Object(map) => Some(map),
        Value::Null => Some(Map::new()),
        _ => None,
    }
}

fn query_params(
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Map<String, Value>, Response> {
    match query {
        Ok(Query(query)) => Ok(query
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect()),
        Err(rejection) => {
            debug!(error = %rejection, "Rejected query string");
            Err(ResponseDispatcher::failure(
                StatusCode::BAD_REQUEST,
                INVALID_QUERY_MESSAGE,
            ))
        }
    }
}

async fn dispatch(
    State(api): State<Arc<ApiHandler>>,
    Path(segments): Path<HashMap<String, String>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
    body: Bytes,
) -> Response {
    let Some(body) = parse_body(&body) else {
        return ResponseDispatcher::failure(StatusCode::BAD_REQUEST, INVALID_JSON_MESSAGE);
    };

    let query = match query_params(query) {
        Ok(query) => query,
        Err(response) => return response,
    };

    let request = ApiRequest {
        method,
        path: uri.path().to_string(),
        module: segments.get("module_name").cloned().unwrap_or_default(),
        fn_name: segments.get("fn_name").cloned(),
        headers,
        query,
        body,
    };

    api.handle(request).await
}

/// Envelope 404 for paths outside the API surface.
pub async fn not_found_fallback(method: Method, uri: Uri) -> Response {
    ResponseDispatcher::not_found(method.as_str(), uri.path())
}

pub fn api_routes(api: Arc<ApiHandler>) -> Router {
    Router::new()
        .route("/api/{module_name}", any(dispatch))
        .route("/api/{module_name}/{fn_name}", any(dispatch))
        .with_state(api)
}
