use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, anyhow};
use clap::Parser;
use crossbeam_channel::Receiver;
use scenebridge_core::directory::Directory;
use scenebridge_core::logging;

use crate::bridge::{BridgeNotification, BridgeRpcHandler, start_bridge_runtime};
use crate::config::AppConfig;
use crate::mcp::{McpServer, ToolCatalog, start_mcp_server};

#[derive(Parser, Debug)]
#[clap(name = "scenebridge")]
#[clap(version)]
#[clap(about = "MCP server that forwards scene tools to a connected scene host")]
pub struct Cli {
    /// Config file to use instead of app.toml in the config directory
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// First MCP HTTP port to try
    #[clap(long)]
    pub port: Option<u16>,

    /// First bridge WebSocket port to try
    #[clap(long)]
    pub bridge_port: Option<u16>,
}

impl Cli {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.mcp_base_port = port;
        }
        if let Some(port) = self.bridge_port {
            config.bridge_base_port = port;
        }
    }
}

/// Log bridge events until the runtime goes away.
fn spawn_notification_logger(rx: Receiver<BridgeNotification>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("BridgeNotifications".to_string())
        .spawn(move || {
            for notification in rx.iter() {
                match notification {
                    BridgeNotification::ServerStarted { port } => {
                        tracing::info!("[Bridge] Waiting for a scene host on port {}", port)
                    }
                    BridgeNotification::ServerStopped => tracing::info!("[Bridge] Server stopped"),
                    BridgeNotification::HostConnected(session) => tracing::info!(
                        "[Bridge] Scene host {} (pid {}) connected, scene '{}'",
                        session.host_name,
                        session.pid,
                        session.scene_name
                    ),
                    BridgeNotification::HostDisconnected { session_id } => {
                        tracing::info!("[Bridge] Scene host {} disconnected", session_id)
                    }
                    BridgeNotification::Error { message } => {
                        tracing::error!("[Bridge] {}", message)
                    }
                }
            }
        })
}

pub fn launch() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init("scenebridge", Directory::logs_directory());

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let bridge = BridgeRpcHandler::new().with_timeout(config.command_timeout());
    let (notification_tx, notification_rx) = crossbeam_channel::unbounded();
    let bridge_thread = start_bridge_runtime(
        bridge.clone(),
        notification_tx,
        config.bridge_base_port,
        config.port_attempts,
    )
    .context("Failed to spawn bridge runtime")?;
    let _logger = spawn_notification_logger(notification_rx)
        .context("Failed to spawn notification logger")?;
    bridge.start();

    let server = McpServer::new(
        ToolCatalog::builtin(),
        Arc::new(bridge.clone()),
        config.tool_timeout(),
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let result = runtime.block_on(async {
        let port = start_mcp_server(server, config.mcp_base_port, config.port_attempts)
            .await
            .map_err(|e| anyhow!(e))?;
        tracing::info!("[MCP] Listening on http://127.0.0.1:{}/mcp", port);

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")
    });

    tracing::info!("[App] Shutting down");
    bridge.shutdown();
    let _ = bridge_thread.join();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["scenebridge", "--port", "28030", "--bridge-port", "28020"]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.mcp_base_port, 28030);
        assert_eq!(config.bridge_base_port, 28020);
        assert_eq!(config.port_attempts, 10);
    }
}
