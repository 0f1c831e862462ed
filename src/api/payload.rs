use std::str::FromStr;

use anyhow::anyhow;
use scholaris_core::AppError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use validator::Validate;

use crate::middleware::ids;
use crate::validator::validation_details;

/// The single argument every manager function receives: the request body
/// merged with the results of the function's middleware stack, each stored
/// under the middleware's name.
#[derive(Debug, Clone, Default)]
pub struct Payload {
    data: Map<String, Value>,
}

impl Payload {
    pub fn new(body: Map<String, Value>, results: Map<String, Value>) -> Self {
        let mut data = body;
        data.extend(results);
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Deserializes the payload into `T`. Unknown keys, including middleware
    /// results, are ignored by the target type.
    pub fn parse<T>(&self, invalid_message: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| {
            AppError::unprocessable(anyhow!("{}", invalid_message))
                .with_details(vec![json!({ "message": e.to_string() })])
        })
    }

    pub fn validated<T>(&self, invalid_message: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = self.parse(invalid_message)?;
        value.validate().map_err(|errors| {
            AppError::unprocessable(anyhow!("{}", invalid_message))
                .with_details(validation_details(&errors))
        })?;
        Ok(value)
    }

    /// The value a middleware contributed.
    pub fn middleware<T>(&self, name: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let value = self
            .data
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::internal(anyhow!("middleware result {} missing", name)))?;

        serde_json::from_value(value)
            .map_err(|e| AppError::internal(anyhow!("middleware result {} malformed: {}", name, e)))
    }

    /// A path parameter bound by `__params`.
    pub fn param(&self, name: &str) -> Result<String, AppError> {
        self.data
            .get(ids::PARAMS)
            .and_then(|params| params.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request(anyhow!("{} is required", name)))
    }

    pub fn param_as<T>(&self, name: &str, invalid_message: &str) -> Result<T, AppError>
    where
        T: FromStr,
    {
        self.param(name)?
            .parse()
            .map_err(|_| AppError::unprocessable(anyhow!("{}", invalid_message)))
    }

    /// The query string collected by `__query`, deserialized into `T`.
    pub fn query<T>(&self, invalid_message: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned,
    {
        let query = self
            .data
            .get(ids::QUERY)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        serde_json::from_value(query).map_err(|e| {
            AppError::unprocessable(anyhow!("{}", invalid_message))
                .with_details(vec![json!({ "message": e.to_string() })])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, Validate)]
    struct Body {
        #[validate(length(min = 2, message = "name is too short"))]
        name: String,
    }

    fn payload(body: Value, results: Value) -> Payload {
        let (Value::Object(body), Value::Object(results)) = (body, results) else {
            panic!("objects expected");
        };
        Payload::new(body, results)
    }

    #[test]
    fn test_middleware_results_override_body() {
        let p = payload(
            json!({ "__device": "spoofed", "name": "Ada" }),
            json!({ "__device": "curl/8.0" }),
        );
        assert_eq!(p.get("__device"), Some(&json!("curl/8.0")));
        assert_eq!(p.get("name"), Some(&json!("Ada")));
    }

    #[test]
    fn test_validated() {
        let p = payload(json!({ "name": "A" }), json!({}));
        let err = p.validated::<Body>("Invalid data").unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Invalid data");
        assert_eq!(err.errors()[0]["message"], "name is too short");

        let p = payload(json!({ "name": "Ada", "__device": "x" }), json!({}));
        assert_eq!(p.validated::<Body>("Invalid data").unwrap().name, "Ada");
    }

    #[test]
    fn test_parse_missing_field() {
        let err = payload(json!({}), json!({}))
            .parse::<Body>("Invalid data")
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.errors()[0]["message"].as_str().unwrap().contains("name"));
    }

    #[test]
    fn test_params() {
        let id = Uuid::new_v4();
        let p = payload(
            json!({}),
            json!({ "__params": { "schoolId": id.to_string(), "fnName": "getSchool" } }),
        );
        assert_eq!(p.param_as::<Uuid>("schoolId", "Invalid id").unwrap(), id);
        assert_eq!(p.param("missing").unwrap_err().status, StatusCode::BAD_REQUEST);

        let p = payload(json!({}), json!({ "__params": { "schoolId": "42" } }));
        assert_eq!(
            p.param_as::<Uuid>("schoolId", "Invalid id").unwrap_err().status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_missing_middleware_result_is_internal() {
        let err = payload(json!({}), json!({}))
            .middleware::<String>("__device")
            .unwrap_err();
        assert!(err.is_server_error());
    }
}
