//! Bridge client
//!
//! The host dials the app's WebSocket server, introduces itself with a
//! handshake and then serves commands until the socket closes. Commands are
//! handed to the editor thread one at a time: the next frame is not read
//! before the previous reply has been sent.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use scenebridge_rpc::{
    BridgeCommand, BridgeReply, CommandRequest, HandshakeAck, HandshakeMessage, ResultEnvelope,
};
use serde_json::Map;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::editor::EditorRpcHandler;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

pub const HOST_NAME: &str = "scenebridge-host";

/// Where to find the app and how to introduce ourselves.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    pub base_port: u16,
    pub port_attempts: u16,
    pub project_path: String,
}

impl BridgeClient {
    /// Connect to the first port in range that accepts a WebSocket upgrade.
    pub async fn connect(&self) -> Result<(Socket, u16), String> {
        let last = self.base_port.saturating_add(self.port_attempts.saturating_sub(1));
        for port in self.base_port..=last {
            match connect_async(format!("ws://127.0.0.1:{port}")).await {
                Ok((socket, _)) => return Ok((socket, port)),
                Err(e) => tracing::trace!("[Bridge] Port {} unavailable: {}", port, e),
            }
        }
        Err(format!(
            "No bridge server in port range {}-{}",
            self.base_port, last
        ))
    }

    /// One session: handshake, then serve commands until the app hangs up.
    pub async fn serve(&self, socket: Socket, editor: EditorRpcHandler) -> Result<(), String> {
        let (mut write, mut read) = socket.split();

        let scene_name = active_scene_name(&editor).await;
        let handshake = HandshakeMessage::new(HOST_NAME, &self.project_path, &scene_name);
        let handshake_json = serde_json::to_string(&handshake)
            .map_err(|e| format!("Failed to serialize handshake: {e}"))?;
        write
            .send(Message::Text(handshake_json.into()))
            .await
            .map_err(|e| format!("Failed to send handshake: {e}"))?;

        let ack = tokio::time::timeout(HANDSHAKE_TIMEOUT, read.next())
            .await
            .map_err(|_| "Handshake timeout")?
            .ok_or("Connection closed before handshake ack")?
            .map_err(|e| format!("Failed to receive handshake ack: {e}"))?;
        let ack: HandshakeAck = match ack {
            Message::Text(text) => serde_json::from_str(text.as_str())
                .map_err(|e| format!("Invalid handshake ack JSON: {e}"))?,
            _ => return Err("Expected text message for handshake ack".to_string()),
        };
        if !ack.success {
            return Err(format!(
                "Handshake rejected: {}",
                ack.error.unwrap_or_default()
            ));
        }
        tracing::info!("[Bridge] Session {} established", ack.session_id);

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let command: BridgeCommand = match serde_json::from_str(text.as_str()) {
                        Ok(command) => command,
                        Err(e) => {
                            tracing::warn!("[Bridge] Ignoring malformed command frame: {}", e);
                            continue;
                        }
                    };
                    let reply = execute(&editor, command).await;
                    let reply_json = serde_json::to_string(&reply)
                        .map_err(|e| format!("Failed to serialize reply: {e}"))?;
                    write
                        .send(Message::Text(reply_json.into()))
                        .await
                        .map_err(|e| format!("Failed to send reply: {e}"))?;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => return Err(format!("WebSocket error: {e}")),
            }
        }

        tracing::info!("[Bridge] Session {} closed", ack.session_id);
        Ok(())
    }

    /// Keep a session alive for as long as the process runs, reconnecting
    /// whenever the app goes away.
    pub async fn run(self, editor: EditorRpcHandler) {
        loop {
            match self.connect().await {
                Ok((socket, port)) => {
                    tracing::info!("[Bridge] Connected on port {}", port);
                    if let Err(e) = self.serve(socket, editor.clone()).await {
                        tracing::warn!("[Bridge] {}", e);
                    }
                }
                Err(e) => tracing::debug!("[Bridge] {}", e),
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }
}

/// Run on the editor thread without blocking the socket's runtime.
async fn run_command(editor: &EditorRpcHandler, request: CommandRequest) -> ResultEnvelope {
    let editor = editor.clone();
    tokio::task::spawn_blocking(move || editor.execute(request))
        .await
        .unwrap_or_else(|e| ResultEnvelope::error(format!("Command task failed: {e}")))
}

async fn execute(editor: &EditorRpcHandler, command: BridgeCommand) -> BridgeReply {
    let request = CommandRequest::new(command.command, command.parameters);
    BridgeReply {
        request_id: command.request_id,
        result: run_command(editor, request).await,
    }
}

async fn active_scene_name(editor: &EditorRpcHandler) -> String {
    let request = CommandRequest::new("scene.GetActiveSceneName", Map::new());
    run_command(editor, request)
        .await
        .get("sceneName")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
