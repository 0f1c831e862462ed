use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_text;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoom {
    pub id: Uuid,
    pub name: String,
    pub school_id: Uuid,
    pub capacity: i32,
    pub created_by: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRoomDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: String,
    pub school_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "capacity must be between 1 and 1000"))]
    pub capacity: i32,
}

/// `schoolId` is required so the caller's administration of the school can
/// be checked before anything is read.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRoomDto {
    #[validate(length(min = 1, max = 100, message = "name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub school_id: Uuid,
    #[validate(range(min = 1, max = 1000, message = "capacity must be between 1 and 1000"))]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoomFilterParams {
    pub school_id: Uuid,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}
