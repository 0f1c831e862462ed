//! The exposure layer.
//!
//! Managers declare their routes ([`exposed`]), the [`matrix`] indexes them
//! by module and verb, [`bolt`] runs each function's middleware stack and
//! [`handler`] turns the outcome into the response envelope. [`cortex`] is
//! the independent event-bus surface.

pub mod bolt;
pub mod context;
pub mod cortex;
pub mod exposed;
pub mod handler;
pub mod matrix;
pub mod payload;
pub mod response;
pub mod route;

pub use bolt::{Flow, Middleware, MiddlewareRegistry, MiddlewareResults};
pub use context::RequestContext;
pub use cortex::{Cortex, CortexError, CortexEvent, CortexHandle, CortexInbox, Interceptor};
pub use exposed::{ExposedRoute, HttpExposed, expose};
pub use handler::{ApiHandler, api_routes};
pub use matrix::MatrixError;
pub use payload::Payload;
pub use response::{Envelope, Outcome, ResponseDispatcher, error_transformer, success_transformer};
