//! On-disk scene and template documents, and scene container persistence.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scene::{HostError, SceneGraph, SceneInfo, Vec3};

/// Extension of scene container files.
pub const SCENE_EXTENSION: &str = "scene";
/// Extension of template (prefab) files.
pub const TEMPLATE_EXTENSION: &str = "prefab";

/// A stored node tree. Also the whole content of a template file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roots: Vec<NodeDocument>,
}

/// Join a project-relative path onto `root`, refusing anything that would
/// leave the project directory.
pub fn project_file(root: &Path, relative: &str) -> Result<PathBuf, HostError> {
    let rel = Path::new(relative);
    let escapes = rel.is_absolute()
        || rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(HostError::OutsideProject(relative.to_string()));
    }
    Ok(root.join(rel))
}

pub fn read_json<T: for<'de> Deserialize<'de>>(file: &Path, display: &str) -> Result<T, HostError> {
    let text = std::fs::read_to_string(file)?;
    serde_json::from_str(&text).map_err(|source| HostError::Document {
        path: display.to_string(),
        source,
    })
}

/// Saves and opens whole scene containers under a project directory.
pub struct SceneStore {
    root: PathBuf,
}

impl SceneStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the active scene back to its file.
    ///
    /// Returns `false` without touching the disk when the scene has no file
    /// yet.
    pub fn save(&self, scene: &dyn SceneGraph) -> Result<bool, HostError> {
        let info = scene.info();
        if info.path.is_empty() {
            tracing::warn!("[Scene] '{}' has no file path, not saving", info.name);
            return Ok(false);
        }
        let file = project_file(&self.root, &info.path)?;
        if let Some(dir) = file.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(&scene.to_document()).map_err(|source| {
            HostError::Document {
                path: info.path.clone(),
                source,
            }
        })?;
        std::fs::write(&file, text)?;
        tracing::info!("[Scene] Saved '{}' to {}", info.name, info.path);
        Ok(true)
    }

    /// Replace the active scene with the one stored at `path`.
    pub fn open(&self, path: &str, scene: &mut dyn SceneGraph) -> Result<SceneInfo, HostError> {
        let file = project_file(&self.root, path)?;
        if !file.is_file() {
            return Err(HostError::SceneNotFound(path.to_string()));
        }
        let document: SceneDocument = read_json(&file, path)?;
        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.name.clone());
        let normalized = path.replace('\\', "/");
        scene.load_document(&name, &normalized, document);
        tracing::info!("[Scene] Opened '{}' from {}", name, normalized);
        Ok(scene.info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Hierarchy, MemoryScene, resolve_path};
    use tempfile::TempDir;

    #[test]
    fn test_project_file_rejects_escapes() {
        let root = Path::new("/project");
        assert!(project_file(root, "Assets/Main.scene").is_ok());
        assert!(matches!(
            project_file(root, "../secret"),
            Err(HostError::OutsideProject(_))
        ));
        assert!(project_file(root, "/etc/passwd").is_err());
    }

    #[test]
    fn test_save_untitled_is_refused() {
        let temp = TempDir::new().unwrap();
        let store = SceneStore::new(temp.path());
        let scene = MemoryScene::new("Untitled");
        assert!(!store.save(&scene).unwrap());
    }

    #[test]
    fn test_save_then_open() {
        let temp = TempDir::new().unwrap();
        let store = SceneStore::new(temp.path());
        let scene_path = "Assets/Scenes/Main.scene";
        std::fs::create_dir_all(temp.path().join("Assets/Scenes")).unwrap();
        std::fs::write(temp.path().join(scene_path), r#"{"name":"Main","roots":[]}"#).unwrap();

        let mut scene = MemoryScene::default();
        let info = store.open(scene_path, &mut scene).unwrap();
        assert_eq!(info.name, "Main");
        assert_eq!(info.path, scene_path);

        let root = scene.spawn("Root", None, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        scene.spawn("Child", Some(root), Vec3::ZERO).unwrap();
        assert!(store.save(&scene).unwrap());

        let mut reopened = MemoryScene::default();
        store.open(scene_path, &mut reopened).unwrap();
        assert_eq!(reopened.roots().len(), 1);
        assert!(resolve_path(&reopened, Some("Root/Child")).is_some());
    }

    #[test]
    fn test_open_missing_scene() {
        let temp = TempDir::new().unwrap();
        let store = SceneStore::new(temp.path());
        let mut scene = MemoryScene::default();
        let err = store.open("Assets/Nope.scene", &mut scene).unwrap_err();
        assert_eq!(err.to_string(), "Scene file not found: Assets/Nope.scene");
    }

    #[test]
    fn test_open_invalid_document() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Broken.scene"), "not json").unwrap();
        let store = SceneStore::new(temp.path());
        let mut scene = MemoryScene::default();
        assert!(matches!(
            store.open("Broken.scene", &mut scene),
            Err(HostError::Document { .. })
        ));
    }
}
