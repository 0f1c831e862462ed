use anyhow::anyhow;
use async_trait::async_trait;
use axum::http::StatusCode;
use scholaris_core::AppError;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::service::SchoolService;
use crate::api::{CortexEvent, Interceptor};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchoolLookup {
    school_id: Uuid,
}

pub struct SchoolsInterceptor {
    state: AppState,
}

impl SchoolsInterceptor {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Interceptor for SchoolsInterceptor {
    fn module_name(&self) -> &'static str {
        "schools"
    }

    fn cortex_exposed(&self) -> &'static [&'static str] {
        &["getSchoolById"]
    }

    async fn intercept(&self, event: CortexEvent) -> Result<Value, AppError> {
        match event.function.as_str() {
            "getSchoolById" => {
                let SchoolLookup { school_id } = serde_json::from_value(event.data)
                    .map_err(|e| AppError::unprocessable(anyhow!("Invalid school lookup: {}", e)))?;
                let school = match SchoolService::get_school_by_id(&self.state.db, school_id).await {
                    Ok(school) => Some(school),
                    Err(e) if e.status == StatusCode::NOT_FOUND => None,
                    Err(e) => return Err(e),
                };
                Ok(json!({ "school": school }))
            }
            other => Err(AppError::not_found(anyhow!("Unknown function {}", other))),
        }
    }
}
