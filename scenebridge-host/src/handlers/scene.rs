use std::str::FromStr;

use scenebridge_core::registry::TypeKind;
use scenebridge_core::scene::{HostError, NodeId, SceneGraph, Vec3, node_path, resolve_path};
use scenebridge_rpc::ResultEnvelope;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::editor::Editor;
use crate::handler::{CommandError, CommandHandler, CommandResult, finish};
use crate::params::Params;

/// Actions of the `scene` family. Names match exactly (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum SceneAction {
    CreateGameObject,
    AddComponent,
    SetPosition,
    SetParent,
    Find,
    SaveScene,
    OpenScene,
    GetActiveSceneName,
    InstantiatePrefab,
    ListRootObjects,
}

pub struct SceneCommandHandler;

impl CommandHandler for SceneCommandHandler {
    fn prefix(&self) -> &'static str {
        "scene"
    }

    fn description(&self) -> &'static str {
        "Create and modify GameObjects in the active scene; save/open scene; get active scene name"
    }

    fn execute(
        &self,
        editor: &mut Editor,
        action: &str,
        parameters: &Map<String, Value>,
    ) -> ResultEnvelope {
        let Ok(parsed) = SceneAction::from_str(action) else {
            let valid: Vec<String> = SceneAction::iter().map(|a| a.to_string()).collect();
            return ResultEnvelope::error(format!(
                "Unknown action: {action}. Valid actions: {}",
                valid.join(", ")
            ));
        };

        let params = Params::new(parameters);
        let result = match parsed {
            SceneAction::CreateGameObject => create_game_object(editor, params),
            SceneAction::AddComponent => add_component(editor, params),
            SceneAction::SetPosition => set_position(editor, params),
            SceneAction::SetParent => set_parent(editor, params),
            SceneAction::Find => find(editor, params),
            SceneAction::SaveScene => save_scene(editor),
            SceneAction::OpenScene => open_scene(editor, params),
            SceneAction::GetActiveSceneName => active_scene(editor),
            SceneAction::InstantiatePrefab => instantiate_prefab(editor, params),
            SceneAction::ListRootObjects => list_root_objects(editor),
        };
        finish(self.prefix(), action, result)
    }
}

fn lookup(scene: &dyn SceneGraph, path: &str) -> Result<NodeId, CommandError> {
    resolve_path(scene, Some(path)).ok_or_else(|| CommandError::NodeNotFound(path.to_string()))
}

fn required_path(params: Params) -> Result<String, CommandError> {
    params
        .non_empty("path")
        .ok_or(CommandError::Invalid("path is required"))
}

fn require_loaded(scene: &dyn SceneGraph) -> Result<(), CommandError> {
    if scene.info().is_loaded {
        Ok(())
    } else {
        Err(CommandError::NoActiveScene)
    }
}

fn position_value(position: Vec3) -> Value {
    json!([position.x, position.y, position.z])
}

/// A missing or unresolvable parent leaves the new node at the root.
fn create_game_object(editor: &mut Editor, params: Params) -> CommandResult {
    let name = params
        .string("name")
        .unwrap_or_else(|| "GameObject".to_string());
    let scene = editor.scene.as_mut();

    let node = scene.create_node(&name);
    editor.undo.record_created(node, "Create GameObject");

    if let Some(parent_path) = params.non_empty("parentPath") {
        match resolve_path(&*scene, Some(&parent_path)) {
            Some(parent) => scene.set_parent(node, Some(parent), false)?,
            None => tracing::debug!(
                "[Scene] Parent '{}' not found, '{}' stays at the root",
                parent_path,
                name
            ),
        }
    }

    Ok(ResultEnvelope::ok()
        .with("path", node_path(&*scene, node))
        .with("name", name)
        .with("instanceId", scene.instance_id(node)))
}

fn add_component(editor: &mut Editor, params: Params) -> CommandResult {
    let (Some(path), Some(type_name)) = (params.non_empty("path"), params.non_empty("componentType"))
    else {
        return Err(CommandError::Invalid("path and componentType are required"));
    };
    let node = lookup(editor.scene.as_ref(), &path)?;
    let ty = editor
        .types
        .resolve(&type_name)
        .cloned()
        .ok_or_else(|| CommandError::TypeNotFound(type_name.clone()))?;
    if ty.kind != TypeKind::Component {
        return Err(HostError::NotAComponent(ty.full_name).into());
    }

    editor
        .undo
        .record_state(editor.scene.as_ref(), node, "Add Component")?;
    editor.scene.add_component(node, &ty)?;

    Ok(ResultEnvelope::ok()
        .with("path", path)
        .with("componentType", type_name))
}

/// Partial update of the world position: absent axes keep their value.
fn set_position(editor: &mut Editor, params: Params) -> CommandResult {
    let path = required_path(params)?;
    let node = lookup(editor.scene.as_ref(), &path)?;

    let mut position = editor.scene.world_position(node)?;
    if let Some(x) = params.number("x") {
        position.x = x as f32;
    }
    if let Some(y) = params.number("y") {
        position.y = y as f32;
    }
    if let Some(z) = params.number("z") {
        position.z = z as f32;
    }

    editor
        .undo
        .record_state(editor.scene.as_ref(), node, "Set Position")?;
    editor.scene.set_world_position(node, position)?;

    Ok(ResultEnvelope::ok()
        .with("path", path)
        .with("position", position_value(position)))
}

/// Reparent keeping the world position. An empty parent path moves the node
/// to the root, and so does a parent path that resolves to nothing.
fn set_parent(editor: &mut Editor, params: Params) -> CommandResult {
    let path = required_path(params)?;
    let node = lookup(editor.scene.as_ref(), &path)?;
    let parent = params
        .non_empty("parentPath")
        .and_then(|p| resolve_path(editor.scene.as_ref(), Some(&p)));

    // A rejected reparent (cycle) must not leave a history entry behind
    let before = editor.scene.snapshot(node)?;
    editor.scene.set_parent(node, parent, true)?;
    editor.undo.record_snapshot(node, before, "Set Parent");

    Ok(ResultEnvelope::ok().with("path", node_path(editor.scene.as_ref(), node)))
}

fn find(editor: &mut Editor, params: Params) -> CommandResult {
    let path = required_path(params)?;
    let scene = editor.scene.as_ref();
    let node = lookup(scene, &path)?;

    Ok(ResultEnvelope::ok()
        .with("path", node_path(scene, node))
        .with("name", scene.name(node).unwrap_or_default())
        .with("instanceId", scene.instance_id(node))
        .with("childCount", scene.children(node).len())
        .with("components", scene.components(node).to_vec()))
}

fn save_scene(editor: &mut Editor) -> CommandResult {
    let scene = editor.scene.as_ref();
    require_loaded(scene)?;
    let info = scene.info();
    if !editor.store.save(scene)? {
        return Err(CommandError::SaveFailed(info.name));
    }
    Ok(ResultEnvelope::ok()
        .with("sceneName", info.name)
        .with("path", info.path))
}

/// Replaces the whole scene. Undo records point at nodes that no longer
/// exist afterwards, so the history is dropped.
fn open_scene(editor: &mut Editor, params: Params) -> CommandResult {
    let path = params
        .non_empty("path")
        .ok_or(CommandError::Invalid("path is required (e.g. Assets/Scenes/BaseScene.scene)"))?;
    let info = editor.store.open(&path, editor.scene.as_mut())?;
    editor.undo.clear();
    Ok(ResultEnvelope::ok()
        .with("sceneName", info.name)
        .with("path", info.path))
}

fn active_scene(editor: &mut Editor) -> CommandResult {
    let info = editor.scene.info();
    Ok(ResultEnvelope::ok()
        .with("sceneName", info.name)
        .with("path", info.path)
        .with("isLoaded", info.is_loaded))
}

fn instantiate_prefab(editor: &mut Editor, params: Params) -> CommandResult {
    let prefab_path = params
        .non_empty("prefabPath")
        .ok_or(CommandError::Invalid("prefabPath is required (e.g. Assets/Prefabs/MyPrefab.prefab)"))?;
    let template = editor
        .assets
        .load_template(&prefab_path)?
        .ok_or_else(|| CommandError::TemplateNotFound(prefab_path.clone()))?;
    require_loaded(editor.scene.as_ref())?;

    let scene = editor.scene.as_mut();
    let node = scene.instantiate(&template);
    editor.undo.record_created(node, "Instantiate Prefab");

    if let Some(parent) = params
        .non_empty("parentPath")
        .and_then(|p| resolve_path(&*scene, Some(&p)))
    {
        scene.set_parent(node, Some(parent), true)?;
    }

    Ok(ResultEnvelope::ok()
        .with("path", node_path(&*scene, node))
        .with("name", scene.name(node).unwrap_or_default())
        .with("prefabPath", prefab_path))
}

fn list_root_objects(editor: &mut Editor) -> CommandResult {
    let scene = editor.scene.as_ref();
    require_loaded(scene)?;
    let names: Vec<&str> = scene
        .roots()
        .iter()
        .filter_map(|&root| scene.name(root))
        .collect();
    Ok(ResultEnvelope::ok()
        .with("sceneName", scene.info().name)
        .with("count", names.len())
        .with("rootNames", names))
}
