//! Request middleware.
//!
//! Two kinds live here:
//!
//! - **Bolt middlewares** ([`request`], [`auth`], [`role`]): named guards a
//!   manager lists per route. Each either contributes a value to the
//!   handler's payload under its name or halts with an envelope response.
//! - **Tower middlewares** ([`rate_limit`]): applied to the whole router.
//!
//! | Name | Contributes | Halts with |
//! |------|-------------|------------|
//! | `__params` | path parameters | |
//! | `__query` | query string | |
//! | `__headers` | request headers | |
//! | `__device` | user agent | |
//! | `__authentication` | the caller's user | 401 |
//! | `__userRoles` | the caller's role slugs | 401 |
//! | `__schoolAdministrator` | | 401, 403 |
//! | `__superAdmin` | | 401, 403 |

pub mod auth;
pub mod rate_limit;
pub mod request;
pub mod role;

use scholaris_models::users::system_roles::slugs;

use crate::api::{MatrixError, MiddlewareRegistry};
use crate::state::AppState;

pub mod ids {
    pub const PARAMS: &str = "__params";
    pub const QUERY: &str = "__query";
    pub const HEADERS: &str = "__headers";
    pub const DEVICE: &str = "__device";
    pub const AUTHENTICATION: &str = "__authentication";
    pub const USER_ROLES: &str = "__userRoles";
    pub const SCHOOL_ADMINISTRATOR: &str = "__schoolAdministrator";
    pub const SUPER_ADMIN: &str = "__superAdmin";
}

pub fn registry(state: &AppState) -> Result<MiddlewareRegistry, MatrixError> {
    let mut registry = MiddlewareRegistry::new();

    registry.register(ids::PARAMS, request::ParamsMiddleware)?;
    registry.register(ids::QUERY, request::QueryMiddleware)?;
    registry.register(ids::HEADERS, request::HeadersMiddleware)?;
    registry.register(ids::DEVICE, request::DeviceMiddleware)?;
    registry.register(ids::AUTHENTICATION, auth::AuthenticationMiddleware::new(state.clone()))?;
    registry.register(ids::USER_ROLES, role::UserRolesMiddleware::new(state.clone()))?;
    registry.register(
        ids::SCHOOL_ADMINISTRATOR,
        role::RequireRole::new(state.clone(), slugs::SCHOOL_ADMINISTRATOR),
    )?;
    registry.register(
        ids::SUPER_ADMIN,
        role::RequireRole::new(state.clone(), slugs::SUPER_ADMIN),
    )?;

    Ok(registry)
}
