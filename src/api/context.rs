use axum::http::{HeaderMap, Method, header};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::{Map, Value};

/// What a middleware sees of the request being dispatched.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub module: String,
    pub function: String,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Path parameters after resolution: `{param: value, fnName: function}`
    /// for parametrized routes, `{moduleName, fnName}` otherwise.
    pub params: Map<String, Value>,
    pub query: Map<String, Value>,
}

impl RequestContext {
    /// The token of an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<String> {
        self.headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
    }

    pub fn headers_as_json(&self) -> Map<String, Value> {
        self.headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), Value::String(v.to_string())))
            })
            .collect()
    }
}
