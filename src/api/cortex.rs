//! The event-bus adapter.
//!
//! Modules that implement [`Interceptor`] are subscribed under their module
//! name. An event `"<module>.<function>"` is routed to that module's
//! interceptor; the reply is the interceptor's value, or an `{error}` object
//! when the module is unknown or the function fails. This surface is
//! independent of the HTTP one: it shares services, not routes.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use scholaris_core::AppError;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CortexEvent {
    pub module: String,
    pub function: String,
    pub data: Value,
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    fn module_name(&self) -> &'static str;

    /// Function names this module answers on the bus.
    fn cortex_exposed(&self) -> &'static [&'static str];

    async fn intercept(&self, event: CortexEvent) -> Result<Value, AppError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CortexError {
    #[error("Interceptor for module {0} registered twice")]
    DuplicateInterceptor(String),

    #[error("Cortex is not running")]
    Closed,
}

pub struct Cortex {
    interceptors: HashMap<&'static str, Arc<dyn Interceptor>>,
}

impl std::fmt::Debug for Cortex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cortex")
            .field("modules", &self.interceptors.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn failure(function: &str) -> Value {
    json!({ "error": format!("failed to execute {}", function) })
}

impl Cortex {
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Result<Self, CortexError> {
        let mut map: HashMap<&'static str, Arc<dyn Interceptor>> = HashMap::new();
        for interceptor in interceptors {
            let module = interceptor.module_name();
            if map.insert(module, interceptor).is_some() {
                return Err(CortexError::DuplicateInterceptor(module.to_string()));
            }
            info!(module = %module, "Module subscribed to cortex");
        }
        Ok(Self { interceptors: map })
    }

    pub fn modules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.interceptors.keys().copied()
    }

    /// Routes one event. Never fails: every problem becomes an `{error}`
    /// reply.
    pub async fn dispatch(&self, event: &str, data: Value) -> Value {
        let mut parts = event.split('.');
        let module = parts.next().unwrap_or_default();
        let function = parts.next().unwrap_or_default();

        let Some(interceptor) = self.interceptors.get(module).cloned() else {
            debug!(event = %event, "Cortex event for unknown module");
            return json!({ "error": format!("module {} not found", module) });
        };

        if !interceptor.cortex_exposed().iter().any(|f| *f == function) {
            warn!(event = %event, "Cortex event for unexposed function");
            return failure(function);
        }

        let call = CortexEvent {
            module: module.to_string(),
            function: function.to_string(),
            data,
        };

        match tokio::spawn(async move { interceptor.intercept(call).await }).await {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                warn!(event = %event, status = %err.status.as_u16(), error = %err.error, "Cortex function failed");
                failure(function)
            }
            Err(join_error) => {
                error!(event = %event, error = %join_error, "Cortex function panicked");
                failure(function)
            }
        }
    }

    /// Serves events from `inbox` until every [`CortexHandle`] is dropped.
    pub fn serve(self: Arc<Self>, inbox: CortexInbox) -> JoinHandle<()> {
        let CortexInbox { mut rx } = inbox;

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let cortex = Arc::clone(&self);
                tokio::spawn(async move {
                    let reply = cortex.dispatch(&message.event, message.data).await;
                    if message.reply.send(reply).is_err() {
                        debug!(event = %message.event, "Cortex caller went away");
                    }
                });
            }
            info!("Cortex stopped");
        })
    }

    pub fn spawn(self: Arc<Self>, buffer: usize) -> CortexHandle {
        let (handle, inbox) = CortexHandle::channel(buffer);
        self.serve(inbox);
        handle
    }
}

struct CortexMessage {
    event: String,
    data: Value,
    reply: oneshot::Sender<Value>,
}

/// Sending side of the bus. Cheap to clone; held in the application state.
#[derive(Clone, Debug)]
pub struct CortexHandle {
    tx: mpsc::Sender<CortexMessage>,
}

/// Receiving side, consumed by [`Cortex::serve`].
#[derive(Debug)]
pub struct CortexInbox {
    rx: mpsc::Receiver<CortexMessage>,
}

impl std::fmt::Debug for CortexMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CortexMessage")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl CortexHandle {
    /// Creates a handle before the interceptors exist, so they can share
    /// state that contains it.
    pub fn channel(buffer: usize) -> (Self, CortexInbox) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, CortexInbox { rx })
    }

    pub async fn emit(&self, event: &str, data: Value) -> Result<Value, CortexError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CortexMessage {
                event: event.to_string(),
                data,
                reply,
            })
            .await
            .map_err(|_| CortexError::Closed)?;
        rx.await.map_err(|_| CortexError::Closed)
    }

    /// [`CortexHandle::emit`] for callers inside a request: a stopped bus or
    /// an `{error}` reply becomes an internal error.
    pub async fn call(&self, event: &str, data: Value) -> Result<Value, AppError> {
        let reply = self.emit(event, data).await.map_err(AppError::internal)?;
        match reply.get("error") {
            Some(error) => Err(AppError::internal(anyhow!("{} failed: {}", event, error))),
            None => Ok(reply),
        }
    }
}
