use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Generates a role slug from a display name.
///
/// Lower-cases the name, turns every run of non-alphanumeric characters
/// into a single hyphen, and trims hyphens from both ends:
/// `"School  Administrator!"` becomes `"school-administrator"`.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleDto {
    #[validate(length(min = 2, max = 50, message = "name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("School Administrator"), "school-administrator");
        assert_eq!(generate_slug("  Head -- Teacher!! "), "head-teacher");
        assert_eq!(generate_slug("Grade 7 Lead"), "grade-7-lead");
        assert_eq!(generate_slug("***"), "");
    }

    #[test]
    fn test_create_role_validation() {
        let dto = CreateRoleDto {
            name: "x".into(),
            description: None,
        };
        assert!(dto.validate().is_err());

        let dto = CreateRoleDto {
            name: "Librarian".into(),
            description: Some("Runs the library".into()),
        };
        assert!(dto.validate().is_ok());
    }
}
