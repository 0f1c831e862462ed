//! Handler outcomes and the uniform response envelope.
//!
//! Every response of the API surface has the shape
//! `{message, ok, data, errors}`. Status is the explicit code when one is
//! given, otherwise 200 for success and 400 for failure.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scholaris_core::AppError;
use scholaris_core::errors::INTERNAL_SERVER_ERROR_MESSAGE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// What a manager function hands back to the dispatcher.
#[derive(Debug)]
pub enum Outcome {
    Success {
        message: String,
        data: Value,
        code: Option<StatusCode>,
    },
    Failure {
        message: String,
        errors: Vec<Value>,
        code: Option<StatusCode>,
    },
    /// The handler produced the response itself; it is sent untouched.
    SelfHandled(Response),
}

impl From<AppError> for Outcome {
    fn from(err: AppError) -> Self {
        Outcome::Failure {
            message: err.message(),
            errors: err.errors(),
            code: Some(err.status),
        }
    }
}

fn normalize_error_item(item: Value) -> Value {
    match item {
        Value::String(message) => json!({ "message": message }),
        Value::Object(object) if object.contains_key("message") => Value::Object(object),
        other => json!({ "message": other.to_string() }),
    }
}

/// Builds a failure outcome, normalizing `error` into a list of
/// `{message}` objects. Without an error the message becomes the only entry.
pub fn error_transformer(
    message: impl Into<String>,
    error: Option<Value>,
    code: Option<StatusCode>,
) -> Outcome {
    let message = message.into();
    let errors = match error {
        Some(Value::Array(items)) => items.into_iter().map(normalize_error_item).collect(),
        Some(Value::String(text)) => vec![json!({ "message": text })],
        Some(Value::Object(object)) => match object.get("message") {
            Some(inner) => vec![json!({ "message": inner })],
            None => vec![json!({ "message": Value::Object(object) })],
        },
        Some(Value::Null) | None => vec![json!({ "message": message })],
        Some(other) => vec![json!({ "message": other })],
    };

    Outcome::Failure {
        message,
        errors,
        code,
    }
}

/// Builds a success outcome from any serializable payload.
pub fn success_transformer<T>(
    message: impl Into<String>,
    data: &T,
    code: Option<StatusCode>,
) -> Result<Outcome, AppError>
where
    T: Serialize + ?Sized,
{
    Ok(Outcome::Success {
        message: message.into(),
        data: serde_json::to_value(data)?,
        code,
    })
}

/// The response body. Also used by tests to decode responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: String,
    pub ok: bool,
    pub data: Value,
    pub errors: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Dispatch {
    pub ok: bool,
    pub data: Option<Value>,
    pub code: Option<StatusCode>,
    pub errors: Option<Vec<Value>>,
    pub message: Option<String>,
}

pub struct ResponseDispatcher;

impl ResponseDispatcher {
    pub fn dispatch(dispatch: Dispatch) -> Response {
        let status = dispatch.code.unwrap_or(if dispatch.ok {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        });

        let data = match dispatch.data {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(data) => data,
        };

        let envelope = Envelope {
            message: dispatch.message.unwrap_or_default(),
            ok: dispatch.ok,
            data,
            errors: dispatch.errors.unwrap_or_default(),
        };

        (status, Json(envelope)).into_response()
    }

    pub fn failure(code: StatusCode, message: impl Into<String>) -> Response {
        Self::dispatch(Dispatch {
            ok: false,
            code: Some(code),
            message: Some(message.into()),
            ..Default::default()
        })
    }

    pub fn internal_error() -> Response {
        Self::failure(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR_MESSAGE)
    }

    pub fn not_found(method: &str, path: &str) -> Response {
        Self::failure(
            StatusCode::NOT_FOUND,
            format!("{} request to {} not found", method, path),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn envelope(response: Response) -> (StatusCode, Envelope) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn errors_of(outcome: Outcome) -> Vec<Value> {
        match outcome {
            Outcome::Failure { errors, .. } => errors,
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_error_transformer_list() {
        let outcome = error_transformer("x", Some(json!(["a", { "message": "b" }])), None);
        assert_eq!(
            errors_of(outcome),
            vec![json!({ "message": "a" }), json!({ "message": "b" })]
        );
    }

    #[test]
    fn test_error_transformer_keeps_extra_fields() {
        let item = json!({ "message": "name is required", "path": "name" });
        let outcome = error_transformer("x", Some(json!([item.clone()])), None);
        assert_eq!(errors_of(outcome), vec![item]);
    }

    #[test]
    fn test_error_transformer_string_and_object() {
        assert_eq!(
            errors_of(error_transformer("x", Some(json!("boom")), None)),
            vec![json!({ "message": "boom" })]
        );
        assert_eq!(
            errors_of(error_transformer(
                "x",
                Some(json!({ "message": "inner", "stack": "..." })),
                None
            )),
            vec![json!({ "message": "inner" })]
        );
    }

    #[test]
    fn test_error_transformer_without_error() {
        assert_eq!(
            errors_of(error_transformer("Student not found", None, None)),
            vec![json!({ "message": "Student not found" })]
        );
    }

    #[test]
    fn test_outcome_from_app_error_hides_internal_cause() {
        let outcome = Outcome::from(AppError::internal(anyhow::anyhow!("pool timed out")));
        match outcome {
            Outcome::Failure {
                message,
                errors,
                code,
            } => {
                assert_eq!(message, INTERNAL_SERVER_ERROR_MESSAGE);
                assert!(errors.is_empty());
                assert_eq!(code, Some(StatusCode::INTERNAL_SERVER_ERROR));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_defaults() {
        let (status, body) = envelope(ResponseDispatcher::dispatch(Dispatch {
            ok: true,
            ..Default::default()
        }))
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, "");
        assert_eq!(body.data, json!({}));
        assert!(body.errors.is_empty());

        let (status, body) = envelope(ResponseDispatcher::dispatch(Dispatch::default())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.ok);
    }

    #[tokio::test]
    async fn test_dispatch_explicit_code() {
        let (status, body) = envelope(ResponseDispatcher::dispatch(Dispatch {
            ok: true,
            code: Some(StatusCode::CREATED),
            data: Some(json!([1, 2])),
            message: Some("Created".into()),
            ..Default::default()
        }))
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.data, json!([1, 2]));
        assert_eq!(body.message, "Created");
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let (status, body) = envelope(ResponseDispatcher::not_found("GET", "/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "GET request to /api/nope not found");
    }
}
