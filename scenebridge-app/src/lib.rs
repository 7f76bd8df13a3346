//! SceneBridge app
//!
//! The MCP side of the bridge. Agents call tools over HTTP; every call is
//! forwarded to the scene host connected on the WebSocket bridge and the
//! host's result envelope comes back unchanged.
//!
//! ```text
//! agent --HTTP/JSON-RPC--> mcp::server --CommandTransport--> bridge runtime --WebSocket--> host
//! ```

pub mod app;
pub mod bridge;
pub mod config;
pub mod mcp;

pub use app::launch;
