//! # Scholaris Core
//!
//! Foundational types shared by every Scholaris crate:
//!
//! - [`errors`]: the application error and its envelope rendering
//! - [`pagination`]: lenient `page`/`limit` parsing and paginated list shapes
//! - [`password`]: bcrypt hashing and verification
//! - [`search`]: escaped `ILIKE` patterns
//! - [`serde`]: deserialization helpers for query-string filters
//!
//! # Example
//!
//! ```ignore
//! use scholaris_core::{AppError, PaginationParams};
//!
//! let error = AppError::not_found(anyhow::anyhow!("School not found"));
//! let params = PaginationParams::default();
//! assert_eq!(params.limit(), 10);
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod search;
pub mod serde;

pub use errors::AppError;
pub use pagination::{Paginated, PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use search::contains_pattern;
