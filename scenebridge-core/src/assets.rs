//! Content index over the project's asset files.
//!
//! Independent of the live scene graph: it only knows files, their derived
//! ids and their asset type.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::document::{self, NodeDocument, SCENE_EXTENSION, TEMPLATE_EXTENSION};
use crate::scene::HostError;

/// Ignore patterns used when the host config does not provide any.
pub const DEFAULT_IGNORE: &[&str] = &[".git/**", "target/**", "Library/**", "Temp/**"];

/// One indexed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    pub guid: String,
    /// Project-relative, `/`-separated.
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A parsed search string: free-text terms plus `t:<Type>` filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetQuery {
    pub terms: Vec<String>,
    pub types: Vec<String>,
}

impl AssetQuery {
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        for token in query.split_whitespace() {
            match token.strip_prefix("t:") {
                Some(ty) if !ty.is_empty() => parsed.types.push(ty.to_lowercase()),
                _ => parsed.terms.push(token.to_lowercase()),
            }
        }
        parsed
    }

    fn matches(&self, entry: &AssetEntry) -> bool {
        let name = entry.name.to_lowercase();
        let type_name = entry.type_name.to_lowercase();
        self.terms.iter().all(|t| name.contains(t.as_str()))
            && (self.types.is_empty() || self.types.iter().any(|t| *t == type_name))
    }
}

/// Read-only view of the project's assets.
pub trait ContentIndex: Send {
    /// All assets matching `query`, in index order.
    fn search(&self, query: &str) -> Result<Vec<AssetEntry>, HostError>;

    /// Load the template stored at `path`, `None` if there is no such template.
    fn load_template(&self, path: &str) -> Result<Option<NodeDocument>, HostError>;
}

/// Asset type name derived from the file extension.
pub fn asset_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        TEMPLATE_EXTENSION => "Prefab",
        SCENE_EXTENSION => "Scene",
        "rs" | "cs" | "lua" => "Script",
        "png" | "jpg" | "jpeg" | "tga" | "psd" => "Texture2D",
        "mat" => "Material",
        "wav" | "ogg" | "mp3" => "AudioClip",
        "fbx" | "obj" | "gltf" | "glb" => "Mesh",
        "shader" | "wgsl" => "Shader",
        "json" | "txt" | "toml" | "md" => "TextAsset",
        _ => "DefaultAsset",
    }
}

/// Stable id of an asset: the first 128 bits of SHA-256 over its relative path.
pub fn asset_guid(relative: &str) -> String {
    let digest = Sha256::digest(relative.as_bytes());
    digest[..16].iter().map(|b| format!("{b:02x}")).collect()
}

/// File-system backed content index rooted at the project directory.
pub struct AssetDatabase {
    root: PathBuf,
    ignore: GlobSet,
}

impl AssetDatabase {
    pub fn new(root: impl Into<PathBuf>, ignore: &[String]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in ignore {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            root: root.into(),
            ignore: builder.build()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(rel.to_string_lossy().replace('\\', "/"))
    }

    /// Every non-ignored file, sorted by path.
    fn entries(&self) -> Result<Vec<AssetEntry>, HostError> {
        let mut entries = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| match self.relative(e.path()) {
                Some(rel) if !rel.is_empty() => {
                    !self.ignore.is_match(&rel) && !self.ignore.is_match(format!("{rel}/"))
                }
                _ => true,
            });
        for entry in walker {
            let entry = entry.map_err(|e| HostError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(path) = self.relative(entry.path()) else {
                continue;
            };
            let name = entry
                .path()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(AssetEntry {
                guid: asset_guid(&path),
                type_name: asset_type(entry.path()).to_string(),
                name,
                path,
            });
        }
        Ok(entries)
    }
}

impl ContentIndex for AssetDatabase {
    fn search(&self, query: &str) -> Result<Vec<AssetEntry>, HostError> {
        let query = AssetQuery::parse(query);
        let matches: Vec<AssetEntry> = self
            .entries()?
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        tracing::debug!("[Assets] {:?} matched {} assets", query, matches.len());
        Ok(matches)
    }

    fn load_template(&self, path: &str) -> Result<Option<NodeDocument>, HostError> {
        let file = document::project_file(&self.root, path)?;
        if !file.is_file() || asset_type(&file) != "Prefab" {
            return Ok(None);
        }
        document::read_json(&file, path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("Assets/Prefabs")).unwrap();
        fs::create_dir_all(root.join("Assets/Scenes")).unwrap();
        fs::create_dir_all(root.join("Library/Cache")).unwrap();
        fs::write(
            root.join("Assets/Prefabs/Tree.prefab"),
            r#"{"name":"Tree","children":[{"name":"Leaves"}]}"#,
        )
        .unwrap();
        fs::write(root.join("Assets/Prefabs/TreeStump.prefab"), r#"{"name":"TreeStump"}"#).unwrap();
        fs::write(root.join("Assets/Scenes/Forest.scene"), r#"{"roots":[]}"#).unwrap();
        fs::write(root.join("Assets/tree_bark.png"), b"png").unwrap();
        fs::write(root.join("Library/Cache/Tree.prefab"), "{}").unwrap();
        temp
    }

    fn database(temp: &TempDir) -> AssetDatabase {
        let ignore: Vec<String> = DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect();
        AssetDatabase::new(temp.path(), &ignore).unwrap()
    }

    #[test]
    fn test_query_parse() {
        let query = AssetQuery::parse("t:Prefab  Tree big");
        assert_eq!(query.types, vec!["prefab"]);
        assert_eq!(query.terms, vec!["tree", "big"]);
    }

    #[test]
    fn test_search_by_name_skips_ignored() {
        let temp = project();
        let db = database(&temp);
        let results = db.search("tree").unwrap();
        let paths: Vec<_> = results.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "Assets/Prefabs/Tree.prefab",
                "Assets/Prefabs/TreeStump.prefab",
                "Assets/tree_bark.png",
            ]
        );
        assert_eq!(results[2].type_name, "Texture2D");
        assert_eq!(results[0].guid, asset_guid("Assets/Prefabs/Tree.prefab"));
        assert_eq!(results[0].guid.len(), 32);
    }

    #[test]
    fn test_search_with_type_filter() {
        let temp = project();
        let db = database(&temp);
        let results = db.search("t:Prefab tree").unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.type_name == "Prefab"));

        let scenes = db.search("t:scene forest").unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].name, "Forest");
    }

    #[test]
    fn test_load_template() {
        let temp = project();
        let db = database(&temp);
        let tree = db.load_template("Assets/Prefabs/Tree.prefab").unwrap().unwrap();
        assert_eq!(tree.name, "Tree");
        assert_eq!(tree.children[0].name, "Leaves");

        assert!(db.load_template("Assets/Prefabs/Missing.prefab").unwrap().is_none());
        // Exists, but is not a template
        assert!(db.load_template("Assets/Scenes/Forest.scene").unwrap().is_none());
    }
}
