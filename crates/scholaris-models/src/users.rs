//! User entities and the system roles seeded by the initial migration.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user as exposed to clients. Never carries the password hash.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[serde(rename = "first_name")]
    pub first_name: String,
    #[serde(rename = "last_name")]
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A user row including the bcrypt hash, for credential checks only.
#[derive(FromRow, Debug, Clone)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

/// The caller's own profile: the user plus role slugs.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

/// Well-known system role ids (must match the initial migration).
pub mod system_roles {
    use uuid::Uuid;

    pub mod slugs {
        pub const SUPER_ADMIN: &str = "super-admin";
        pub const SCHOOL_ADMINISTRATOR: &str = "school-administrator";
        pub const STUDENT: &str = "student";
        pub const USER: &str = "user";
    }

    pub const SUPER_ADMIN: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000001);
    pub const SCHOOL_ADMINISTRATOR: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000002);
    pub const STUDENT: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000003);
    pub const USER: Uuid = Uuid::from_u128(0x00000000_0000_0000_0000_000000000004);

    pub fn is_system_role(id: Uuid) -> bool {
        [SUPER_ADMIN, SCHOOL_ADMINISTRATOR, STUDENT, USER].contains(&id)
    }
}
