//! # Scholaris Models
//!
//! Entities read from PostgreSQL and the DTOs accepted by each module.
//!
//! Entities serialize identifiers, foreign keys, and timestamps in camelCase
//! (`schoolId`, `classRoomId`, `createdAt`). User name fields keep their
//! snake_case names (`first_name`, `last_name`).
//!
//! - [`users`]: users and the seeded system roles
//! - [`roles`]: role definitions and slug generation
//! - [`auth`]: login, registration, and token payloads
//! - [`refresh_tokens`]: persisted refresh-token digests
//! - [`schools`], [`school_admins`], [`class_rooms`], [`students`]

pub mod auth;
pub mod class_rooms;
pub mod refresh_tokens;
pub mod roles;
pub mod school_admins;
pub mod schools;
pub mod students;
pub mod users;
