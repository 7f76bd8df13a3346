//! Bridge runtime - runs the WebSocket server in a background thread
//!
//! All async bridge work happens on a dedicated thread with its own tokio
//! runtime. Callers talk to it through [`BridgeRpcHandler`]: requests go over
//! a crossbeam channel and replies are routed back through the pending map,
//! keyed by request id.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use futures_util::{SinkExt, StreamExt};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use scenebridge_rpc::{
    BridgeCommand, BridgeReply, HandshakeAck, HandshakeMessage, PROTOCOL_VERSION, ResultEnvelope,
};
use serde_json::{Map, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

use super::types::*;

/// Request ID for tracking pending commands
pub type RequestId = u64;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// RPC messages sent to the bridge runtime
#[derive(Debug)]
pub enum BridgeRpc {
    /// Start the WebSocket server
    Start,
    /// Stop the WebSocket server
    Stop,
    /// Send a command to the connected scene host
    SendCommand {
        id: RequestId,
        command: String,
        parameters: Map<String, Value>,
    },
    /// Shutdown the runtime
    Shutdown,
}

/// Callback for async responses
pub trait BridgeCallback: Send + FnOnce(Result<ResultEnvelope, String>) {}
impl<F: Send + FnOnce(Result<ResultEnvelope, String>)> BridgeCallback for F {}

enum ResponseHandler {
    Callback(Box<dyn BridgeCallback>),
    Chan(Sender<Result<ResultEnvelope, String>>),
}

impl ResponseHandler {
    fn invoke(self, result: Result<ResultEnvelope, String>) {
        match self {
            ResponseHandler::Callback(f) => f(result),
            ResponseHandler::Chan(tx) => {
                let _ = tx.send(result);
            }
        }
    }
}

#[derive(Clone)]
pub struct BridgeRpcHandler {
    /// Channel to send commands to the bridge runtime
    tx: Sender<BridgeRpc>,
    /// Channel to receive commands (used by the runtime)
    rx: Receiver<BridgeRpc>,
    /// Request ID counter
    id: Arc<AtomicU64>,
    /// Pending request handlers
    pending: Arc<Mutex<HashMap<RequestId, ResponseHandler>>>,
    /// Commands on the wire waiting for a host reply, by wire request id
    in_flight: Arc<Mutex<HashMap<String, PendingCommand>>>,
    /// Connected host count
    connected_count: Arc<AtomicU64>,
    command_timeout: Duration,
}

impl BridgeRpcHandler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            id: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            connected_count: Arc::new(AtomicU64::new(0)),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// How long [`BridgeRpcHandler::send_command`] waits for a reply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected_count.load(Ordering::Relaxed) > 0
    }

    fn client_connected(&self) {
        self.connected_count.fetch_add(1, Ordering::Relaxed);
    }

    fn client_disconnected(&self) {
        let prev = self.connected_count.fetch_sub(1, Ordering::Relaxed);
        if prev == 0 {
            // Underflow protection
            self.connected_count.store(0, Ordering::Relaxed);
        }
    }

    /// Send a command and wait for the host's envelope.
    ///
    /// `Err` means the command never produced an envelope: no host, transport
    /// failure, or timeout.
    pub async fn send_command(
        &self,
        command: &str,
        parameters: Map<String, Value>,
    ) -> Result<ResultEnvelope, String> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().insert(id, ResponseHandler::Chan(tx));

        let _ = self.tx.send(BridgeRpc::SendCommand {
            id,
            command: command.to_string(),
            parameters,
        });

        let timeout = self.command_timeout;
        let received = tokio::task::spawn_blocking(move || rx.recv_timeout(timeout)).await;
        match received {
            Ok(Ok(result)) => result,
            Ok(Err(RecvTimeoutError::Timeout)) => {
                self.forget(id);
                Err(format!("Command timed out after {}s", timeout.as_secs_f32()))
            }
            Ok(Err(RecvTimeoutError::Disconnected)) => {
                Err("Bridge dropped the command".to_string())
            }
            Err(e) => {
                self.forget(id);
                Err(format!("Failed to wait for reply: {e}"))
            }
        }
    }

    /// Send a command; `callback` runs on the bridge thread with the outcome.
    pub fn send_command_async(
        &self,
        command: String,
        parameters: Map<String, Value>,
        callback: impl BridgeCallback + 'static,
    ) {
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .insert(id, ResponseHandler::Callback(Box::new(callback)));

        let _ = self.tx.send(BridgeRpc::SendCommand {
            id,
            command,
            parameters,
        });
    }

    /// Get the receiver for the runtime to process
    pub fn rx(&self) -> &Receiver<BridgeRpc> {
        &self.rx
    }

    pub fn start(&self) {
        tracing::info!("[Bridge] Sending Start message");
        let _ = self.tx.send(BridgeRpc::Start);
    }

    pub fn stop(&self) {
        let _ = self.tx.send(BridgeRpc::Stop);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(BridgeRpc::Shutdown);
    }

    /// Drop every trace of a command nobody waits for anymore.
    ///
    /// The handler goes first so a runtime that registers the wire entry
    /// afterwards sees it gone and cleans up after itself.
    fn forget(&self, id: RequestId) {
        self.pending.lock().remove(&id);
        self.in_flight.lock().retain(|_, p| p.rpc_id != id);
    }

    fn is_pending(&self, id: RequestId) -> bool {
        self.pending.lock().contains_key(&id)
    }

    #[cfg(test)]
    fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Handle a response from the bridge runtime
    pub fn handle_response(&self, id: RequestId, result: Result<ResultEnvelope, String>) {
        let handler = self.pending.lock().remove(&id);
        if let Some(handler) = handler {
            handler.invoke(result);
        }
    }
}

impl Default for BridgeRpcHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a connected host
struct ClientState {
    tx: mpsc::Sender<String>,
}

/// Command sent to a host, waiting for its reply
struct PendingCommand {
    session_id: String,
    rpc_id: RequestId,
}

/// Everything the server tasks share.
#[derive(Clone)]
struct Shared {
    rpc: BridgeRpcHandler,
    notification_tx: Sender<BridgeNotification>,
    /// Connected hosts in connection order
    clients: Arc<RwLock<IndexMap<String, ClientState>>>,
    /// Commands waiting for a reply, by wire request id
    pending_commands: Arc<Mutex<HashMap<String, PendingCommand>>>,
    shutdown: Arc<AtomicBool>,
}

impl Shared {
    /// Fail every pending command matching `filter`.
    fn fail_pending(&self, filter: impl Fn(&PendingCommand) -> bool, message: &str) {
        let mut orphaned = Vec::new();
        self.pending_commands.lock().retain(|_, pending| {
            if filter(pending) {
                orphaned.push(pending.rpc_id);
                false
            } else {
                true
            }
        });
        for id in orphaned {
            self.rpc.handle_response(id, Err(message.to_string()));
        }
    }
}

/// The bridge runtime that manages the WebSocket server
pub struct BridgeRuntime {
    shared: Shared,
    base_port: u16,
    port_attempts: u16,
}

impl BridgeRuntime {
    pub fn new(
        rpc: BridgeRpcHandler,
        notification_tx: Sender<BridgeNotification>,
        base_port: u16,
        port_attempts: u16,
    ) -> Self {
        Self {
            shared: Shared {
                notification_tx,
                clients: Arc::new(RwLock::new(IndexMap::new())),
                pending_commands: rpc.in_flight.clone(),
                rpc,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
            base_port,
            port_attempts,
        }
    }

    /// Run the main loop (call this from a dedicated thread)
    pub fn run(self) {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("[Bridge] Failed to create tokio runtime: {}", e);
                let _ = self.shared.notification_tx.send(BridgeNotification::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        for msg in self.shared.rpc.rx().iter() {
            match msg {
                BridgeRpc::Start => {
                    let shared = self.shared.clone();
                    match rt.block_on(Self::do_start(shared, self.base_port, self.port_attempts)) {
                        Ok(port) => tracing::info!("[Bridge] Server started on port {}", port),
                        Err(e) => {
                            tracing::error!("[Bridge] Failed to start server: {}", e);
                            let _ = self
                                .shared
                                .notification_tx
                                .send(BridgeNotification::Error { message: e });
                        }
                    }
                }

                BridgeRpc::Stop => {
                    self.stop();
                    let _ = self
                        .shared
                        .notification_tx
                        .send(BridgeNotification::ServerStopped);
                }

                BridgeRpc::SendCommand {
                    id,
                    command,
                    parameters,
                } => {
                    let shared = self.shared.clone();
                    rt.block_on(Self::do_send_command(shared, id, command, parameters));
                }

                BridgeRpc::Shutdown => {
                    self.stop();
                    break;
                }
            }
        }
    }

    fn stop(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        let dropped = std::mem::take(&mut *self.shared.clients.write());
        for _ in dropped {
            self.shared.rpc.client_disconnected();
        }
        self.shared.fail_pending(|_| true, "Bridge stopped");
    }

    async fn do_start(shared: Shared, base_port: u16, attempts: u16) -> Result<u16, String> {
        shared.shutdown.store(false, Ordering::SeqCst);

        for offset in 0..attempts {
            let try_port = base_port.saturating_add(offset);
            match TcpListener::bind(format!("127.0.0.1:{try_port}")).await {
                Ok(listener) => {
                    let bound = listener
                        .local_addr()
                        .map(|addr| addr.port())
                        .unwrap_or(try_port);
                    let _ = shared
                        .notification_tx
                        .send(BridgeNotification::ServerStarted { port: bound });

                    tokio::spawn(Self::accept_loop(listener, shared));
                    return Ok(bound);
                }
                Err(e) => {
                    tracing::debug!("[Bridge] Port {} unavailable: {}", try_port, e);
                }
            }
        }

        Err(format!(
            "Failed to bind to any port in range {}-{}",
            base_port,
            base_port.saturating_add(attempts.saturating_sub(1))
        ))
    }

    async fn accept_loop(listener: TcpListener, shared: Shared) {
        loop {
            if shared.shutdown.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::info!("[Bridge] New connection from: {}", addr);
                            let shared = shared.clone();
                            tokio::spawn(async move {
                                if let Err(e) = Self::handle_connection(stream, shared).await {
                                    tracing::error!("[Bridge] Connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            if !shared.shutdown.load(Ordering::SeqCst) {
                                tracing::error!("[Bridge] Accept error: {}", e);
                            }
                        }
                    }
                }
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    // Check shutdown flag periodically
                }
            }
        }
    }

    async fn handle_connection(stream: TcpStream, shared: Shared) -> Result<(), String> {
        let ws_stream = accept_async(stream)
            .await
            .map_err(|e| format!("WebSocket handshake failed: {e}"))?;

        let (mut write, mut read) = ws_stream.split();

        let handshake = tokio::time::timeout(HANDSHAKE_TIMEOUT, read.next())
            .await
            .map_err(|_| "Handshake timeout")?
            .ok_or("Connection closed before handshake")?
            .map_err(|e| format!("Failed to receive handshake: {e}"))?;

        let handshake_text = match handshake {
            Message::Text(text) => text.to_string(),
            _ => return Err("Expected text message for handshake".to_string()),
        };

        let handshake_msg: HandshakeMessage = serde_json::from_str(&handshake_text)
            .map_err(|e| format!("Invalid handshake JSON: {e}"))?;

        if !handshake_msg.is_valid() {
            let ack = HandshakeAck::failure(format!(
                "Protocol version mismatch: expected {}, got {}",
                PROTOCOL_VERSION, handshake_msg.version
            ));
            if let Ok(ack_json) = serde_json::to_string(&ack) {
                let _ = write.send(Message::Text(ack_json.into())).await;
            }
            return Err("Protocol version mismatch".to_string());
        }

        let session_id = Uuid::new_v4().to_string();

        let ack = HandshakeAck::success(session_id.clone());
        let ack_json = serde_json::to_string(&ack)
            .map_err(|e| format!("Failed to serialize handshake ack: {e}"))?;
        write
            .send(Message::Text(ack_json.into()))
            .await
            .map_err(|e| format!("Failed to send handshake ack: {e}"))?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let session = HostSession {
            session_id: session_id.clone(),
            host_name: handshake_msg.host_name,
            project_path: handshake_msg.project_path,
            scene_name: handshake_msg.scene_name,
            pid: handshake_msg.pid,
            connected_at: now,
        };

        let (tx, mut rx) = mpsc::channel::<String>(32);

        shared
            .clients
            .write()
            .insert(session_id.clone(), ClientState { tx });
        shared.rpc.client_connected();

        tracing::info!(
            "[Bridge] Host connected: {} ({}, scene '{}')",
            session_id,
            session.project_path,
            session.scene_name
        );
        let _ = shared
            .notification_tx
            .send(BridgeNotification::HostConnected(session));

        let session_id_sender = session_id.clone();
        let shutdown_sender = shared.shutdown.clone();
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if shutdown_sender.load(Ordering::SeqCst) {
                    break;
                }
                if write.send(Message::Text(msg.into())).await.is_err() {
                    tracing::warn!("[Bridge] Failed to send message to host {}", session_id_sender);
                    break;
                }
            }
        });

        while let Some(msg_result) = read.next().await {
            if shared.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match msg_result {
                Ok(Message::Text(text)) => {
                    let reply: BridgeReply = match serde_json::from_str(text.as_str()) {
                        Ok(reply) => reply,
                        Err(e) => {
                            tracing::warn!("[Bridge] Ignoring unexpected frame from {}: {}", session_id, e);
                            continue;
                        }
                    };
                    let pending = shared.pending_commands.lock().remove(&reply.request_id);
                    match pending {
                        Some(pending) => shared.rpc.handle_response(pending.rpc_id, Ok(reply.result)),
                        None => tracing::debug!(
                            "[Bridge] Reply for unknown request {}",
                            reply.request_id
                        ),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Ping(_)) => {
                    // Pong is handled automatically by tungstenite
                    tracing::trace!("[Bridge] Received ping from {}", session_id);
                }
                Err(e) => {
                    tracing::error!("[Bridge] WebSocket error for {}: {}", session_id, e);
                    break;
                }
                _ => {}
            }
        }

        if shared.clients.write().shift_remove(&session_id).is_some() {
            shared.rpc.client_disconnected();
        }
        shared.fail_pending(|p| p.session_id == session_id, "Scene host disconnected");
        let _ = shared
            .notification_tx
            .send(BridgeNotification::HostDisconnected {
                session_id: session_id.clone(),
            });

        tracing::info!("[Bridge] Host disconnected: {}", session_id);

        Ok(())
    }

    async fn do_send_command(
        shared: Shared,
        rpc_id: RequestId,
        command: String,
        parameters: Map<String, Value>,
    ) {
        let request_id = Uuid::new_v4().to_string();

        let frame = BridgeCommand {
            request_id: request_id.clone(),
            command,
            parameters,
        };

        let frame_json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                shared
                    .rpc
                    .handle_response(rpc_id, Err(format!("Failed to serialize command: {e}")));
                return;
            }
        };

        // The first host that connected gets the command
        let target = shared
            .clients
            .read()
            .iter()
            .next()
            .map(|(sid, c)| (sid.clone(), c.tx.clone()));

        match target {
            Some((session_id, tx)) => {
                shared
                    .pending_commands
                    .lock()
                    .insert(request_id.clone(), PendingCommand { session_id, rpc_id });
                if !shared.rpc.is_pending(rpc_id) {
                    // The caller gave up before the command went out
                    shared.pending_commands.lock().remove(&request_id);
                    return;
                }

                if let Err(e) = tx.send(frame_json).await {
                    shared.pending_commands.lock().remove(&request_id);
                    shared
                        .rpc
                        .handle_response(rpc_id, Err(format!("Failed to send command: {e}")));
                }
            }
            None => {
                shared
                    .rpc
                    .handle_response(rpc_id, Err("No scene host connected".to_string()));
            }
        }
    }
}

/// Start the bridge runtime in a background thread
pub fn start_bridge_runtime(
    rpc: BridgeRpcHandler,
    notification_tx: Sender<BridgeNotification>,
    base_port: u16,
    port_attempts: u16,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("BridgeRuntime".to_string())
        .spawn(move || {
            BridgeRuntime::new(rpc, notification_tx, base_port, port_attempts).run();
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_tungstenite::connect_async;

    /// Start a runtime on an ephemeral port and return the port.
    fn start(rpc: &BridgeRpcHandler) -> (u16, Receiver<BridgeNotification>) {
        let (tx, rx) = unbounded();
        start_bridge_runtime(rpc.clone(), tx, 0, 1).unwrap();
        rpc.start();
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            BridgeNotification::ServerStarted { port } => (port, rx),
            other => panic!("unexpected notification {other:?}"),
        }
    }

    fn wait_connected(rx: &Receiver<BridgeNotification>) {
        loop {
            if let BridgeNotification::HostConnected(_) =
                rx.recv_timeout(Duration::from_secs(5)).unwrap()
            {
                return;
            }
        }
    }

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_host_connected() {
        let rpc = BridgeRpcHandler::new();
        let _ = start(&rpc);
        let err = rpc.send_command("scene.Find", Map::new()).await.unwrap_err();
        assert_eq!(err, "No scene host connected");
        assert!(!rpc.is_connected());

        let (tx, rx) = crossbeam_channel::bounded(1);
        rpc.send_command_async("scene.Find".to_string(), Map::new(), move |result| {
            let _ = tx.send(result);
        });
        let result = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap_err(), "No scene host connected");
        rpc.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_version_mismatch_rejected() {
        let rpc = BridgeRpcHandler::new();
        let (port, _notifications) = start(&rpc);

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}")).await.unwrap();
        let handshake = HandshakeMessage {
            version: 999,
            ..HandshakeMessage::new("fake", "/p", "Main")
        };
        ws.send(Message::Text(serde_json::to_string(&handshake).unwrap().into()))
            .await
            .unwrap();
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected ack");
        };
        let ack: HandshakeAck = serde_json::from_str(text.as_str()).unwrap();
        assert!(!ack.success);
        assert!(ack.error.unwrap().contains("expected 1, got 999"));
        rpc.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reply_routed_by_request_id() {
        let rpc = BridgeRpcHandler::new();
        let (port, notifications) = start(&rpc);

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}")).await.unwrap();
        let handshake = HandshakeMessage::new("fake", "/p", "Main");
        ws.send(Message::Text(serde_json::to_string(&handshake).unwrap().into()))
            .await
            .unwrap();
        let _ack = ws.next().await;
        let notifications =
            tokio::task::spawn_blocking(move || {
                wait_connected(&notifications);
                notifications
            })
            .await
            .unwrap();
        assert!(rpc.is_connected());

        // Fake host: echo the command name back in an envelope
        let host = tokio::spawn(async move {
            let Some(Ok(Message::Text(text))) = ws.next().await else {
                return;
            };
            let command: BridgeCommand = serde_json::from_str(text.as_str()).unwrap();
            let reply = BridgeReply {
                request_id: command.request_id,
                result: ResultEnvelope::ok().with("command", command.command),
            };
            ws.send(Message::Text(serde_json::to_string(&reply).unwrap().into()))
                .await
                .unwrap();
            // Then hang up on the next command
            let _ = ws.next().await;
            let _ = ws.close(None).await;
        });

        let envelope = rpc
            .send_command("scene.Find", params(json!({ "path": "A" })))
            .await
            .unwrap();
        assert_eq!(envelope.get("command"), Some(&json!("scene.Find")));

        let err = rpc.send_command("scene.Find", Map::new()).await.unwrap_err();
        assert_eq!(err, "Scene host disconnected");

        host.await.unwrap();
        drop(notifications);
        rpc.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_command_timeout() {
        let rpc = BridgeRpcHandler::new().with_timeout(Duration::from_millis(200));
        let (port, notifications) = start(&rpc);

        let (mut ws, _) = connect_async(format!("ws://127.0.0.1:{port}")).await.unwrap();
        let handshake = HandshakeMessage::new("silent", "/p", "Main");
        ws.send(Message::Text(serde_json::to_string(&handshake).unwrap().into()))
            .await
            .unwrap();
        let _ack = ws.next().await;
        tokio::task::spawn_blocking(move || wait_connected(&notifications))
            .await
            .unwrap();

        let err = rpc.send_command("scene.Find", Map::new()).await.unwrap_err();
        assert!(err.starts_with("Command timed out"));
        assert_eq!(rpc.in_flight_count(), 0);

        // The host's frame still arrived; a late reply to it goes nowhere
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected a command frame");
        };
        let command: BridgeCommand = serde_json::from_str(text.as_str()).unwrap();
        let late = BridgeReply {
            request_id: command.request_id,
            result: ResultEnvelope::ok(),
        };
        ws.send(Message::Text(serde_json::to_string(&late).unwrap().into()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(rpc.in_flight_count(), 0);
        rpc.shutdown();
    }
}
