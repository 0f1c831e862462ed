use std::fmt;
use std::str::FromStr;

use scholaris_core::PaginationParams;
use scholaris_core::serde::deserialize_optional_uuid;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Enrolment state of a student. Stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
    Pending,
}

impl StudentStatus {
    pub const ALL: [StudentStatus; 3] = [Self::Active, Self::Inactive, Self::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown student status: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub school_id: Uuid,
    pub class_room_id: Uuid,
    pub registration_number: String,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentDto {
    pub class_room_id: Uuid,
    pub school_id: Uuid,
}

/// Partial update. `status` stays a raw string so an unknown value can be
/// reported as its own validation failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentDto {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_room_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilterParams {
    pub school_id: Uuid,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub class_room_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("active".parse::<StudentStatus>(), Ok(StudentStatus::Active));
        assert_eq!("pending".parse::<StudentStatus>(), Ok(StudentStatus::Pending));
        assert!("graduated".parse::<StudentStatus>().is_err());
        assert!("Active".parse::<StudentStatus>().is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StudentStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_update_dto_partial() {
        let dto: UpdateStudentDto = serde_json::from_str(r#"{"status":"active"}"#).unwrap();
        assert_eq!(dto.status.as_deref(), Some("active"));
        assert!(dto.class_room_id.is_none());
    }

    #[test]
    fn test_create_dto_rejects_malformed_ids() {
        let result = serde_json::from_str::<CreateStudentDto>(
            r#"{"classRoomId":"123","schoolId":"456"}"#,
        );
        assert!(result.is_err());
    }
}
