use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_text;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub website: String,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 255, message = "address must be between 1 and 255 characters"))]
    pub address: String,
    #[validate(length(min = 5, max = 20, message = "phone must be between 5 and 20 characters"))]
    pub phone: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "website must be a valid URL"))]
    pub website: String,
    #[validate(length(min = 1, max = 1000, message = "description must be between 1 and 1000 characters"))]
    pub description: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "address must be between 1 and 255 characters"))]
    pub address: Option<String>,
    #[validate(length(min = 5, max = 20, message = "phone must be between 5 and 20 characters"))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(url(message = "website must be a valid URL"))]
    pub website: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "description must be between 1 and 1000 characters"))]
    pub description: Option<String>,
}

impl UpdateSchoolDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.website.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
