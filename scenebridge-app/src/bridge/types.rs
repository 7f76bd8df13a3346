//! App-side bridge state and notifications.
//!
//! The wire types themselves live in `scenebridge_rpc::bridge`.

use serde::Serialize;

/// A connected scene host, as introduced by its handshake.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSession {
    /// Assigned by the bridge on handshake
    pub session_id: String,
    pub host_name: String,
    pub project_path: String,
    /// Scene that was active when the host connected
    pub scene_name: String,
    pub pid: u32,
    /// Unix timestamp of the handshake
    pub connected_at: u64,
}

/// Sent from the bridge runtime thread to whoever watches the bridge.
#[derive(Debug, Clone)]
pub enum BridgeNotification {
    ServerStarted { port: u16 },
    ServerStopped,
    HostConnected(HostSession),
    HostDisconnected { session_id: String },
    Error { message: String },
}
