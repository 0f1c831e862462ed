//! # Scholaris API
//!
//! A multi-tenant school management backend built with Axum and PostgreSQL.
//! Schools, their administrators, class rooms and students are managed
//! through a single catch-all HTTP surface:
//!
//! ```text
//! ANY /api/{moduleName}
//! ANY /api/{moduleName}/{fnName}
//! ```
//!
//! ## Exposure
//!
//! Modules do not build axum routers. Each manager implements
//! [`api::HttpExposed`] and lists route specifiers:
//!
//! | Specifier | Request | Calls |
//! |-----------|---------|-------|
//! | `login` | `POST /api/auth/login` | `login` |
//! | `get=index.listRoles` | `GET /api/roles` | `listRoles` |
//! | `delete=deleteRole:roleId` | `DELETE /api/roles/{any}` | `deleteRole` with `roleId` bound |
//!
//! The specifiers are compiled into a [`api::matrix::MethodMatrix`] at
//! startup. Each route names the guards that run before it (see
//! [`middleware`]); their results reach the handler through
//! [`api::Payload`].
//!
//! Every response, including errors and unknown routes, uses one envelope:
//!
//! ```json
//! { "message": "...", "ok": true, "data": {}, "errors": [] }
//! ```
//!
//! ## Authentication
//!
//! - **Auth token**: short-lived JWT sent as `Authorization: Bearer <token>`
//! - **Refresh token**: long-lived JWT stored as a SHA-256 digest, one per
//!   user, single use
//!
//! Role lookups are cached in Redis when it is reachable.
//!
//! ## Modules
//!
//! - [`api`]: method matrix, dispatcher, middleware executor, event bus
//! - [`logging`]: tracing subscriber and request logging
//! - [`metrics`]: Prometheus metrics
//! - [`middleware`]: guards and the rate limiter
//! - [`modules`]: feature modules
//! - [`router`]: application router
//! - [`state`]: shared application state
//! - [`validator`]: validation error rendering

pub mod api;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod validator;

pub use scholaris_auth;
pub use scholaris_cache;
pub use scholaris_config;
pub use scholaris_core;
pub use scholaris_db;
pub use scholaris_models;
