//! MCP Tool Executor
//!
//! Executes tools by forwarding them to the scene host. Parameters and the
//! resulting envelope pass through untouched.

use scenebridge_rpc::ResultEnvelope;
use serde_json::{Map, Value};

use super::tools::{ToolCatalog, tool_command};
use super::transport::CommandTransport;

/// Execute a tool by name
pub async fn execute_tool(
    catalog: &ToolCatalog,
    transport: &dyn CommandTransport,
    tool_name: &str,
    args: Value,
) -> ResultEnvelope {
    let command = match catalog.find(tool_name).and(tool_command(tool_name)) {
        Some(command) => command,
        None => return ResultEnvelope::error(format!("Tool not found: {tool_name}")),
    };

    let parameters = match args {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return ResultEnvelope::error(format!(
                "Tool arguments must be an object, got: {other}"
            ));
        }
    };

    tracing::debug!("[MCP] Executing tool: {} as {}", tool_name, command);
    transport.send(&command, parameters).await
}
