use scenebridge_core::scene::HostError;
use scenebridge_rpc::ResultEnvelope;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::editor::Editor;

/// A family of actions sharing a command prefix.
///
/// `execute` never fails: every error is folded into a failed envelope at the
/// handler's boundary, so the dispatcher relays whatever comes back.
pub trait CommandHandler: Send {
    fn prefix(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn execute(
        &self,
        editor: &mut Editor,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> ResultEnvelope;
}

/// Why a single action failed. Rendered verbatim into the envelope's `error`.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A required parameter is missing or blank.
    #[error("{0}")]
    Invalid(&'static str),
    #[error("GameObject not found: {0}")]
    NodeNotFound(String),
    #[error("Component type not found: {0}")]
    TypeNotFound(String),
    #[error("Prefab not found: {0}")]
    TemplateNotFound(String),
    #[error("No active scene loaded")]
    NoActiveScene,
    #[error("Failed to save scene '{0}': it has no file path yet")]
    SaveFailed(String),
    #[error(transparent)]
    Host(#[from] HostError),
}

pub type CommandResult = Result<ResultEnvelope, CommandError>;

/// Collapse an action's result into the envelope sent back.
pub(crate) fn finish(prefix: &str, action: &str, result: CommandResult) -> ResultEnvelope {
    result.unwrap_or_else(|err| {
        tracing::debug!("[Command] {}.{} failed: {}", prefix, action, err);
        ResultEnvelope::error(err.to_string())
    })
}
