//! Application error type.
//!
//! Every failure that reaches a client is rendered as the uniform envelope
//! `{message, ok: false, data: {}, errors: [...]}`. Server-side failures never
//! leak their cause: any 5xx renders as "Internal server error" with no error
//! entries.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    /// Per-field or per-cause entries, each an object with at least `message`.
    pub details: Vec<Value>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            details: Vec::new(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNAUTHORIZED, err)
    }

    pub fn forbidden<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::FORBIDDEN, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// The client-facing message.
    pub fn message(&self) -> String {
        if self.is_server_error() {
            INTERNAL_SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.error.to_string()
        }
    }

    /// The client-facing error entries. Without details the message itself
    /// becomes the sole entry.
    pub fn errors(&self) -> Vec<Value> {
        if self.is_server_error() {
            Vec::new()
        } else if self.details.is_empty() {
            vec![json!({ "message": self.error.to_string() })]
        } else {
            self.details.clone()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "message": self.message(),
            "ok": false,
            "data": {},
            "errors": self.errors(),
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_client_error_wraps_message_as_sole_entry() {
        let err = AppError::not_found(anyhow!("School not found"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "School not found");
        assert_eq!(err.errors(), vec![json!({"message": "School not found"})]);
    }

    #[test]
    fn test_details_replace_default_entry() {
        let err = AppError::unprocessable(anyhow!("Invalid school data"))
            .with_details(vec![json!({"message": "name is required", "path": "name"})]);
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0]["path"], "name");
    }

    #[test]
    fn test_server_error_hides_cause() {
        let err = AppError::database(anyhow!("connection reset by peer"));
        assert_eq!(err.message(), INTERNAL_SERVER_ERROR_MESSAGE);
        assert!(err.errors().is_empty());
    }

    #[test]
    fn test_from_std_error_is_internal() {
        let io = std::io::Error::other("boom");
        let err: AppError = io.into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::conflict(anyhow!("Email already in use")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
