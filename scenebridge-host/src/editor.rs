//! The editor thread
//!
//! Every command runs on one dedicated thread that owns the scene graph. Other
//! threads talk to it through [`EditorRpcHandler`], which follows the same
//! channel + pending-map shape as the app's bridge handler: requests go over a
//! crossbeam channel, replies come back through the handler registered under
//! the request id.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use scenebridge_core::assets::{AssetDatabase, ContentIndex};
use scenebridge_core::document::SceneStore;
use scenebridge_core::registry::{TypeCatalog, TypeRegistry};
use scenebridge_core::scene::{MemoryScene, SceneGraph, UndoHistory};
use scenebridge_rpc::{CommandRequest, ResultEnvelope};

use crate::config::HostConfig;
use crate::dispatch::Dispatcher;

/// Everything a command handler may touch.
pub struct Editor {
    pub scene: Box<dyn SceneGraph>,
    pub undo: UndoHistory,
    pub types: TypeRegistry,
    pub assets: Box<dyn ContentIndex>,
    pub store: SceneStore,
}

impl Editor {
    pub fn new(
        scene: Box<dyn SceneGraph>,
        types: TypeRegistry,
        assets: Box<dyn ContentIndex>,
        store: SceneStore,
        undo_limit: usize,
    ) -> Self {
        Self {
            scene,
            undo: UndoHistory::new(undo_limit),
            types,
            assets,
            store,
        }
    }

    /// Build the editor described by `config`: engine types plus the
    /// configured catalogs, the project's asset database, and the start
    /// scene if one is configured.
    pub fn from_config(config: &HostConfig) -> anyhow::Result<Self> {
        let root = &config.project_root;

        let mut types = TypeRegistry::builtin();
        for catalog in &config.type_catalogs {
            let path = if catalog.is_absolute() {
                catalog.clone()
            } else {
                root.join(catalog)
            };
            types.add_catalog(TypeCatalog::load(&path)?);
        }

        let assets = AssetDatabase::new(root, &config.asset_ignore)
            .context("Invalid asset ignore pattern")?;
        let store = SceneStore::new(root);

        let mut scene: Box<dyn SceneGraph> = Box::new(MemoryScene::default());
        if let Some(start) = &config.scene {
            store
                .open(start, scene.as_mut())
                .with_context(|| format!("Failed to open start scene {start}"))?;
        }

        Ok(Self::new(
            scene,
            types,
            Box::new(assets),
            store,
            config.undo_limit,
        ))
    }
}

/// Request ID for tracking pending commands
pub type RequestId = u64;

pub enum EditorRpc {
    Execute { id: RequestId, request: CommandRequest },
    Shutdown,
}

pub trait EditorCallback: Send + FnOnce(ResultEnvelope) {}
impl<F: Send + FnOnce(ResultEnvelope)> EditorCallback for F {}

enum ResponseHandler {
    Callback(Box<dyn EditorCallback>),
    Chan(Sender<ResultEnvelope>),
}

impl ResponseHandler {
    fn invoke(self, result: ResultEnvelope) {
        match self {
            ResponseHandler::Callback(f) => f(result),
            ResponseHandler::Chan(tx) => {
                let _ = tx.send(result);
            }
        }
    }
}

#[derive(Clone)]
pub struct EditorRpcHandler {
    tx: Sender<EditorRpc>,
    rx: Receiver<EditorRpc>,
    id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<RequestId, ResponseHandler>>>,
}

impl EditorRpcHandler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx,
            rx,
            id: Arc::new(AtomicU64::new(0)),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run a command on the editor thread and block until it is done.
    pub fn execute(&self, request: CommandRequest) -> ResultEnvelope {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        self.pending.lock().insert(id, ResponseHandler::Chan(tx));

        if self.tx.send(EditorRpc::Execute { id, request }).is_err() {
            self.pending.lock().remove(&id);
            return ResultEnvelope::error("Editor thread is not running");
        }

        rx.recv()
            .unwrap_or_else(|_| ResultEnvelope::error("Editor thread stopped before replying"))
    }

    pub fn execute_async(&self, request: CommandRequest, callback: impl EditorCallback + 'static) {
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        self.pending
            .lock()
            .insert(id, ResponseHandler::Callback(Box::new(callback)));

        if self.tx.send(EditorRpc::Execute { id, request }).is_err() {
            self.handle_response(id, ResultEnvelope::error("Editor thread is not running"));
        }
    }

    pub fn rx(&self) -> &Receiver<EditorRpc> {
        &self.rx
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(EditorRpc::Shutdown);
    }

    pub fn handle_response(&self, id: RequestId, result: ResultEnvelope) {
        let handler = self.pending.lock().remove(&id);
        if let Some(handler) = handler {
            handler.invoke(result);
        }
    }
}

impl Default for EditorRpcHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the editor state; drains the rpc channel one command at a time.
pub struct EditorLoop {
    editor: Editor,
    dispatcher: Dispatcher,
    rpc: EditorRpcHandler,
}

impl EditorLoop {
    pub fn new(editor: Editor, dispatcher: Dispatcher, rpc: EditorRpcHandler) -> Self {
        Self {
            editor,
            dispatcher,
            rpc,
        }
    }

    pub fn run(mut self) {
        tracing::info!(
            "[Editor] Ready with handlers: {}",
            self.dispatcher.prefixes().collect::<Vec<_>>().join(", ")
        );
        let rx = self.rpc.rx().clone();
        for msg in rx.iter() {
            match msg {
                EditorRpc::Execute { id, request } => {
                    let result = self.execute(&request);
                    self.rpc.handle_response(id, result);
                }
                EditorRpc::Shutdown => break,
            }
        }
        tracing::info!("[Editor] Stopped");
    }

    fn execute(&mut self, request: &CommandRequest) -> ResultEnvelope {
        tracing::debug!("[Editor] Executing {}", request.command);
        let editor = &mut self.editor;
        let dispatcher = &self.dispatcher;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatcher.dispatch(editor, &request.command, &request.parameters)
        }));
        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!("[Editor] {} panicked: {}", request.command, message);
            ResultEnvelope::error(format!("Command {} panicked: {message}", request.command))
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Start the editor loop on its own thread.
pub fn start_editor_thread(
    editor: Editor,
    dispatcher: Dispatcher,
    rpc: EditorRpcHandler,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("EditorLoop".to_string())
        .spawn(move || EditorLoop::new(editor, dispatcher, rpc).run())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::handler::CommandHandler;
    use scenebridge_core::assets::AssetEntry;
    use scenebridge_core::document::NodeDocument;
    use scenebridge_core::scene::HostError;
    use serde_json::{Map, Value, json};

    /// Content index with a fixed set of entries and templates.
    #[derive(Default)]
    pub(crate) struct FixedIndex {
        pub entries: Vec<AssetEntry>,
        pub templates: Vec<(String, NodeDocument)>,
    }

    impl ContentIndex for FixedIndex {
        fn search(&self, query: &str) -> Result<Vec<AssetEntry>, HostError> {
            let query = scenebridge_core::assets::AssetQuery::parse(query);
            Ok(self
                .entries
                .iter()
                .filter(|e| {
                    query
                        .terms
                        .iter()
                        .all(|t| e.name.to_lowercase().contains(t.as_str()))
                        && (query.types.is_empty()
                            || query.types.contains(&e.type_name.to_lowercase()))
                })
                .cloned()
                .collect())
        }

        fn load_template(&self, path: &str) -> Result<Option<NodeDocument>, HostError> {
            Ok(self
                .templates
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, doc)| doc.clone()))
        }
    }

    pub(crate) fn editor_with(scene: MemoryScene, index: FixedIndex) -> Editor {
        Editor::new(
            Box::new(scene),
            TypeRegistry::builtin(),
            Box::new(index),
            SceneStore::new(std::env::temp_dir()),
            64,
        )
    }

    pub(crate) fn editor() -> Editor {
        editor_with(MemoryScene::new("Main"), FixedIndex::default())
    }

    struct Exploding;

    impl CommandHandler for Exploding {
        fn prefix(&self) -> &'static str {
            "boom"
        }

        fn description(&self) -> &'static str {
            "Always panics"
        }

        fn execute(&self, _: &mut Editor, action: &str, _: &Map<String, Value>) -> ResultEnvelope {
            panic!("handler exploded on {action}");
        }
    }

    fn request(command: &str, parameters: Value) -> CommandRequest {
        match parameters {
            Value::Object(map) => CommandRequest::new(command, map),
            _ => CommandRequest::new(command, Map::new()),
        }
    }

    #[test]
    fn test_commands_run_in_order() {
        let rpc = EditorRpcHandler::new();
        let handle = start_editor_thread(editor(), Dispatcher::with_defaults(), rpc.clone()).unwrap();

        let created = rpc.execute(request("scene.CreateGameObject", json!({ "name": "Root" })));
        assert!(created.success, "{created:?}");
        let child = rpc.execute(request(
            "scene.CreateGameObject",
            json!({ "name": "X", "parentPath": "Root" }),
        ));
        assert_eq!(child.get("path"), Some(&json!("Root/X")));

        let found = rpc.execute(request("scene.Find", json!({ "path": "Root/X" })));
        assert_eq!(found.get("instanceId"), child.get("instanceId"));

        rpc.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_panic_becomes_failed_envelope() {
        let rpc = EditorRpcHandler::new();
        let mut dispatcher = Dispatcher::with_defaults();
        dispatcher.register(Box::new(Exploding)).unwrap();
        let handle = start_editor_thread(editor(), dispatcher, rpc.clone()).unwrap();

        let result = rpc.execute(request("boom.Now", json!({})));
        assert!(!result.success);
        assert!(result.error_message().contains("handler exploded on Now"));

        // The thread survived
        let alive = rpc.execute(request("scene.GetActiveSceneName", json!({})));
        assert!(alive.success);
        assert_eq!(alive.get("sceneName"), Some(&json!("Main")));

        rpc.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_execute_async_callback() {
        let rpc = EditorRpcHandler::new();
        let handle = start_editor_thread(editor(), Dispatcher::with_defaults(), rpc.clone()).unwrap();

        let (tx, rx) = crossbeam_channel::bounded(1);
        rpc.execute_async(request("scene.ListRootObjects", json!({})), move |result| {
            let _ = tx.send(result);
        });
        let result = rx.recv().unwrap();
        assert_eq!(result.get("count"), Some(&json!(0)));

        rpc.shutdown();
        handle.join().unwrap();
    }

    #[test]
    fn test_from_config_opens_start_scene() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("Assets/Scenes")).unwrap();
        std::fs::write(
            temp.path().join("Assets/Scenes/Start.scene"),
            r#"{"name":"Start","roots":[{"name":"Ground"}]}"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("game.toml"),
            "name = \"Game\"\n\n[[types]]\nname = \"Citizen\"\nfull_name = \"Game.Citizen\"\nkind = \"component\"\n",
        )
        .unwrap();

        let config = HostConfig {
            project_root: temp.path().to_path_buf(),
            scene: Some("Assets/Scenes/Start.scene".to_string()),
            type_catalogs: vec!["game.toml".into()],
            ..HostConfig::default()
        };
        let editor = Editor::from_config(&config).unwrap();
        assert_eq!(editor.scene.info().name, "Start");
        assert_eq!(editor.scene.roots().len(), 1);
        assert!(editor.types.resolve("Citizen").is_some());
    }
}
