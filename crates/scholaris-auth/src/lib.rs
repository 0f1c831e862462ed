//! # Scholaris Auth
//!
//! Token handling for the Scholaris API.
//!
//! Two kinds of JWT are issued:
//!
//! - **Auth token** ([`ShortTokenClaims`]): short-lived, sent on every request
//!   as `Authorization: Bearer <token>`, bound to a session and a device.
//! - **Refresh token** ([`LongTokenClaims`]): long-lived, exchanged once for a
//!   fresh pair. Only its SHA-256 digest is persisted server-side.
//!
//! ```ignore
//! use scholaris_auth::{create_short_token, verify_short_token, device_fingerprint};
//!
//! let device_id = device_fingerprint("Mozilla/5.0 ...");
//! let token = create_short_token(user_id, "jdoe", &session_id, &device_id, &config)?;
//! let claims = verify_short_token(&token, &config)?;
//! ```

pub mod claims;
pub mod digest;
pub mod jwt;

pub use claims::{LongTokenClaims, ShortTokenClaims};
pub use digest::{device_fingerprint, sha256_hex};
pub use jwt::{create_long_token, create_short_token, verify_long_token, verify_short_token};
