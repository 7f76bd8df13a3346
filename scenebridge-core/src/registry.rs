//! Type registry
//!
//! Component types are looked up by short or fully qualified name across
//! every loaded catalog. Catalogs are searched in load order and the first
//! match wins. The registry is built once at startup and read-only after.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Can be attached to a node.
    Component,
    /// Plain data type, known to the registry but not attachable.
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub full_name: String,
    pub kind: TypeKind,
}

impl TypeRef {
    pub fn component(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: format!("{namespace}.{name}"),
            kind: TypeKind::Component,
        }
    }

    pub fn value(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: format!("{namespace}.{name}"),
            kind: TypeKind::Value,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.name == query || self.full_name == query
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read type catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid type catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// A named group of types, e.g. the engine's built-ins or a game module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCatalog {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeRef>,
}

impl TypeCatalog {
    /// Load a catalog from a TOML file:
    ///
    /// ```toml
    /// name = "Game"
    ///
    /// [[types]]
    /// name = "CitizenManager"
    /// full_name = "Game.CitizenManager"
    /// kind = "component"
    /// ```
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| RegistryError::Parse {
            path: display,
            source,
        })
    }

    fn engine() -> Self {
        const NS: &str = "Engine";
        Self {
            name: NS.to_string(),
            types: vec![
                TypeRef::component("Rigidbody", NS),
                TypeRef::component("BoxCollider", NS),
                TypeRef::component("SphereCollider", NS),
                TypeRef::component("CapsuleCollider", NS),
                TypeRef::component("MeshFilter", NS),
                TypeRef::component("MeshRenderer", NS),
                TypeRef::component("Camera", NS),
                TypeRef::component("Light", NS),
                TypeRef::component("AudioSource", NS),
                TypeRef::component("AudioListener", NS),
                TypeRef::component("Animator", NS),
                TypeRef::component("Canvas", NS),
                TypeRef::value("Vector3", NS),
                TypeRef::value("Quaternion", NS),
                TypeRef::value("Color", NS),
            ],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    catalogs: Vec<TypeCatalog>,
}

impl TypeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding only the engine catalog.
    pub fn builtin() -> Self {
        Self {
            catalogs: vec![TypeCatalog::engine()],
        }
    }

    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.add_catalog(catalog);
        self
    }

    pub fn add_catalog(&mut self, catalog: TypeCatalog) {
        tracing::debug!(
            "[Types] Loaded catalog '{}' ({} types)",
            catalog.name,
            catalog.types.len()
        );
        self.catalogs.push(catalog);
    }

    pub fn catalogs(&self) -> &[TypeCatalog] {
        &self.catalogs
    }

    /// First type whose short or full name equals `name`, across all catalogs.
    pub fn resolve(&self, name: &str) -> Option<&TypeRef> {
        self.catalogs
            .iter()
            .flat_map(|c| c.types.iter())
            .find(|t| t.matches(name))
    }
}
