//! MCP (Model Context Protocol) Server
//!
//! Exposes the scene host's commands as MCP tools for coding agents.
//!
//! Tools exposed:
//! - scene_*: create, find, reparent and move GameObjects, open and save scenes
//! - asset_Search: search project assets by name or type

mod executor;
mod server;
mod tools;
mod transport;
mod types;

pub use executor::execute_tool;
pub use server::{McpServer, start_mcp_server};
pub use tools::{ParamKind, ParamSpec, ToolCatalog, ToolDefinition, ToolFamily, tool_command};
pub use transport::CommandTransport;
pub use types::{McpTool, ToolAnnotations};
