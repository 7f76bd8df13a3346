//! Scene host bridge
//!
//! WebSocket server the scene host connects to. Runs on its own thread with a
//! private tokio runtime; the rest of the app talks to it through
//! [`BridgeRpcHandler`].
//!
//! ```text
//! scene host --WebSocket 27020--> BridgeRuntime (tokio thread)
//!                                       |
//!                                crossbeam channels
//!                                       |
//!                                BridgeRpcHandler <-- MCP tool executor
//! ```
//!
//! ## Modules
//!
//! - `types`: sessions and notifications
//! - `runtime`: the server thread and the rpc handler

mod runtime;
mod types;

pub use runtime::{
    BridgeCallback, BridgeRpc, BridgeRpcHandler, BridgeRuntime, RequestId, start_bridge_runtime,
};
pub use types::{BridgeNotification, HostSession};
