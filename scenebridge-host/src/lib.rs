//! Scene host
//!
//! Owns the scene graph and executes bridge commands against it.
//!
//! ```text
//! app --WebSocket--> connection (tokio) --crossbeam--> EditorLoop (thread)
//!                                                          |
//!                                                     Dispatcher
//!                                                          |
//!                                            scene / asset CommandHandlers
//! ```
//!
//! ## Modules
//!
//! - [`params`]: typed parameter reads
//! - [`handler`]: the handler trait and per-action errors
//! - [`handlers`]: `scene` and `asset` families
//! - [`dispatch`]: prefix routing
//! - [`editor`]: editor state and the single command thread
//! - [`connection`]: WebSocket client towards the app
//! - [`config`], [`cli`]: startup settings

pub mod cli;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod editor;
pub mod handler;
pub mod handlers;
pub mod params;

use anyhow::Context;
use clap::Parser;
use scenebridge_core::directory::Directory;
use scenebridge_core::logging;

use crate::cli::Cli;
use crate::config::HostConfig;
use crate::connection::BridgeClient;
use crate::dispatch::Dispatcher;
use crate::editor::{Editor, EditorRpcHandler, start_editor_thread};

pub fn launch() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init("scenebridge-host", Directory::logs_directory());

    let mut config = HostConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    tracing::info!(
        "[Host] Project {} (bridge ports from {})",
        config.project_root.display(),
        config.bridge_base_port
    );

    let editor = Editor::from_config(&config)?;
    let rpc = EditorRpcHandler::new();
    let editor_thread = start_editor_thread(editor, Dispatcher::with_defaults(), rpc.clone())
        .context("Failed to spawn editor thread")?;

    let client = BridgeClient {
        base_port: config.bridge_base_port,
        port_attempts: config.port_attempts,
        project_path: config.project_root.display().to_string(),
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    runtime.block_on(async {
        tokio::select! {
            _ = client.run(rpc.clone()) => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("[Host] Failed to listen for ctrl-c: {}", e);
                }
            }
        }
    });

    tracing::info!("[Host] Shutting down");
    rpc.shutdown();
    let _ = editor_thread.join();
    Ok(())
}
