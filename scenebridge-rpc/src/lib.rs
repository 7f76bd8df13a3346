//! Wire types shared by the client-facing app and the scene host.
//!
//! ## Modules
//!
//! - [`envelope`]: the result envelope every command returns
//! - [`command`]: `prefix.action` command requests
//! - [`bridge`]: WebSocket framing and handshake between the two processes

pub mod bridge;
pub mod command;
pub mod envelope;

pub use bridge::{
    BRIDGE_BASE_PORT, BridgeCommand, BridgeReply, HandshakeAck, HandshakeMessage, MCP_BASE_PORT,
    PORT_ATTEMPTS, PROTOCOL_VERSION,
};
pub use command::CommandRequest;
pub use envelope::ResultEnvelope;
