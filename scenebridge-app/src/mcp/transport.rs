use async_trait::async_trait;
use scenebridge_rpc::ResultEnvelope;
use serde_json::{Map, Value};

use crate::bridge::BridgeRpcHandler;

/// Carries one command to the scene host and brings back its envelope.
///
/// Transport failures never surface as `Err`: they become failed envelopes so
/// callers always have something to relay.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn send(&self, command: &str, parameters: Map<String, Value>) -> ResultEnvelope;
}

#[async_trait]
impl CommandTransport for BridgeRpcHandler {
    async fn send(&self, command: &str, parameters: Map<String, Value>) -> ResultEnvelope {
        if !self.is_connected() {
            return ResultEnvelope::error(
                "Scene host is not connected. Start scenebridge-host first.",
            );
        }

        match self.send_command(command, parameters).await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("[MCP] Command {} failed in transport: {}", command, e);
                ResultEnvelope::error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::bridge::{BridgeNotification, start_bridge_runtime};
    use crate::mcp::{ToolCatalog, execute_tool};
    use scenebridge_host::config::HostConfig;
    use scenebridge_host::connection::BridgeClient;
    use scenebridge_host::dispatch::Dispatcher;
    use scenebridge_host::editor::{Editor, EditorRpcHandler, start_editor_thread};
    use serde_json::json;

    #[tokio::test]
    async fn test_disconnected_bridge_fails_fast() {
        let bridge = BridgeRpcHandler::new();
        let envelope = bridge.send("scene.Find", Map::new()).await;
        assert!(!envelope.success);
        assert!(envelope.error_message().contains("not connected"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_tools_reach_a_real_host() {
        let project = tempfile::tempdir().unwrap();
        let config = HostConfig {
            project_root: project.path().to_path_buf(),
            ..HostConfig::default()
        };
        let editor_rpc = EditorRpcHandler::new();
        let _editor_thread = start_editor_thread(
            Editor::from_config(&config).unwrap(),
            Dispatcher::with_defaults(),
            editor_rpc.clone(),
        )
        .unwrap();

        let bridge = BridgeRpcHandler::new();
        let (tx, notifications) = crossbeam_channel::unbounded();
        start_bridge_runtime(bridge.clone(), tx, 0, 1).unwrap();
        bridge.start();
        let port = match notifications.recv_timeout(Duration::from_secs(5)).unwrap() {
            BridgeNotification::ServerStarted { port } => port,
            other => panic!("unexpected notification {other:?}"),
        };

        let client = BridgeClient {
            base_port: port,
            port_attempts: 1,
            project_path: project.path().display().to_string(),
        };
        tokio::spawn(async move {
            let (socket, _) = client.connect().await?;
            client.serve(socket, editor_rpc).await
        });
        for _ in 0..100 {
            if bridge.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(bridge.is_connected());

        let catalog = ToolCatalog::builtin();
        let call = |name: &'static str, args: Value| {
            let catalog = catalog.clone();
            let bridge = bridge.clone();
            async move { execute_tool(&catalog, &bridge, name, args).await }
        };

        let root = call("scene_CreateGameObject", json!({ "name": "Root" })).await;
        assert!(root.success, "{root:?}");
        let child = call(
            "scene_CreateGameObject",
            json!({ "name": "Child", "parentPath": "Root" }),
        )
        .await;
        assert_eq!(child.get("path"), Some(&json!("Root/Child")));

        let found = call("scene_Find", json!({ "path": "Root/Child" })).await;
        assert_eq!(found.get("instanceId"), child.get("instanceId"));

        let moved = call("scene_SetParent", json!({ "path": "Root/Child" })).await;
        assert_eq!(moved.get("path"), Some(&json!("Child")));

        let roots = call("scene_ListRootObjects", json!({})).await;
        assert_eq!(roots.get("rootNames"), Some(&json!(["Root", "Child"])));

        let missing = call("scene_Find", json!({ "path": "Nope" })).await;
        assert_eq!(missing.error_message(), "GameObject not found: Nope");

        let search = call("asset_Search", json!({ "query": "anything" })).await;
        assert!(search.success, "{search:?}");
        assert_eq!(search.get("count"), Some(&json!(0)));

        bridge.shutdown();
    }
}
