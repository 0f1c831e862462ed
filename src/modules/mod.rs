//! Feature modules. Each exposes a manager over HTTP and, where other
//! modules need its data, an interceptor on the event bus.

pub mod auth;
pub mod class_rooms;
pub mod refresh_tokens;
pub mod roles;
pub mod school_admins;
pub mod schools;
pub mod students;
pub mod users;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::api::{Cortex, CortexError, CortexInbox, HttpExposed, Interceptor};
use crate::state::AppState;

pub fn managers(state: &AppState) -> Vec<Arc<dyn HttpExposed>> {
    vec![
        Arc::new(auth::AuthManager::new(state.clone())),
        Arc::new(refresh_tokens::RefreshTokensManager::new(state.clone())),
        Arc::new(users::UsersManager::new(state.clone())),
        Arc::new(roles::RolesManager::new(state.clone())),
        Arc::new(schools::SchoolsManager::new(state.clone())),
        Arc::new(school_admins::SchoolAdminsManager::new(state.clone())),
        Arc::new(class_rooms::ClassRoomsManager::new(state.clone())),
        Arc::new(students::StudentsManager::new(state.clone())),
    ]
}

pub fn interceptors(state: &AppState) -> Vec<Arc<dyn Interceptor>> {
    vec![
        Arc::new(users::UsersInterceptor::new(state.clone())),
        Arc::new(schools::SchoolsInterceptor::new(state.clone())),
    ]
}

/// Subscribes every interceptor and serves the bus behind `state.cortex`.
pub fn start_cortex(state: &AppState, inbox: CortexInbox) -> Result<JoinHandle<()>, CortexError> {
    let cortex = Arc::new(Cortex::new(interceptors(state))?);
    let modules: Vec<&str> = cortex.modules().collect();
    info!(modules = ?modules, "Cortex ready");
    Ok(cortex.serve(inbox))
}
