//! Framing of the WebSocket bridge between the app and the scene host.
//!
//! The app listens, the host connects and opens with a [`HandshakeMessage`].
//! After a successful [`HandshakeAck`] the app sends [`BridgeCommand`]s and
//! the host answers each with exactly one [`BridgeReply`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::envelope::ResultEnvelope;

/// Must match on both sides of the bridge.
pub const PROTOCOL_VERSION: i32 = 1;

/// Base port for the bridge WebSocket server
pub const BRIDGE_BASE_PORT: u16 = 27020;

/// Base port for the MCP HTTP server
pub const MCP_BASE_PORT: u16 = 27030;

/// Number of port fallback attempts (base..base+9)
pub const PORT_ATTEMPTS: u16 = 10;

/// Sent by the host right after connecting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeMessage {
    /// Always "handshake"
    #[serde(rename = "type")]
    pub msg_type: String,
    pub version: i32,
    /// Display name of the host process
    pub host_name: String,
    pub project_path: String,
    /// Name of the scene active at connect time
    pub scene_name: String,
    pub pid: u32,
}

impl HandshakeMessage {
    pub fn new(host_name: &str, project_path: &str, scene_name: &str) -> Self {
        Self {
            msg_type: "handshake".to_string(),
            version: PROTOCOL_VERSION,
            host_name: host_name.to_string(),
            project_path: project_path.to_string(),
            scene_name: scene_name.to_string(),
            pid: std::process::id(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.msg_type == "handshake" && self.version == PROTOCOL_VERSION
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeAck {
    /// Always "handshake_ack"
    #[serde(rename = "type")]
    pub msg_type: String,
    pub session_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandshakeAck {
    pub fn success(session_id: String) -> Self {
        Self {
            msg_type: "handshake_ack".to_string(),
            session_id,
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            msg_type: "handshake_ack".to_string(),
            session_id: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// App → host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeCommand {
    /// Correlates the reply
    pub request_id: String,
    /// `"<prefix>.<action>"`
    pub command: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Host → app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeReply {
    pub request_id: String,
    pub result: ResultEnvelope,
}
