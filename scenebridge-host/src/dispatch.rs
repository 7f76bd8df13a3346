use indexmap::IndexMap;
use scenebridge_rpc::ResultEnvelope;
use scenebridge_rpc::command::split_command;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::editor::Editor;
use crate::handler::CommandHandler;
use crate::handlers::{AssetCommandHandler, SceneCommandHandler};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("A handler for prefix '{0}' is already registered")]
    DuplicatePrefix(String),
}

/// Routes `prefix.action` commands to the handler registered for `prefix`.
///
/// Populated once at startup, then only read. Handlers are kept in
/// registration order.
#[derive(Default)]
pub struct Dispatcher {
    handlers: IndexMap<&'static str, Box<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `scene` and `asset` handlers.
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.handlers.insert("scene", Box::new(SceneCommandHandler));
        dispatcher.handlers.insert("asset", Box::new(AssetCommandHandler));
        dispatcher
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> Result<(), DispatchError> {
        let prefix = handler.prefix();
        if self.handlers.contains_key(prefix) {
            return Err(DispatchError::DuplicatePrefix(prefix.to_string()));
        }
        tracing::debug!("[Dispatch] Registered '{}': {}", prefix, handler.description());
        self.handlers.insert(prefix, handler);
        Ok(())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn handler(&self, prefix: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(prefix).map(|h| h.as_ref())
    }

    /// Forward the action to its handler and return the handler's envelope
    /// untouched. Parameters are not inspected here.
    pub fn dispatch(
        &self,
        editor: &mut Editor,
        command: &str,
        parameters: &Map<String, Value>,
    ) -> ResultEnvelope {
        let routed = split_command(command)
            .and_then(|(prefix, action)| Some((self.handlers.get(prefix)?, action)));
        match routed {
            Some((handler, action)) => handler.execute(editor, action, parameters),
            None => {
                tracing::warn!("[Dispatch] Unknown command: {}", command);
                ResultEnvelope::error(format!("Unknown command: {command}"))
            }
        }
    }
}
