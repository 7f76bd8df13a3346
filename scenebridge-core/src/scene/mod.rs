//! Scene graph model
//!
//! The command layer never owns the scene graph; it talks to it through
//! [`SceneGraph`]. [`MemoryScene`] is the in-process implementation used by
//! the host binary and by tests.
//!
//! ## Modules
//!
//! - [`path`]: slash-delimited path addressing
//! - [`memory`]: arena-backed scene graph
//! - [`undo`]: undo history sink
//! - [`transform`]: positions

mod memory;
pub mod path;
mod transform;
mod undo;

use serde::Serialize;
use thiserror::Error;

use crate::document::{NodeDocument, SceneDocument};
use crate::registry::TypeRef;

pub use memory::MemoryScene;
pub use path::{HierarchyPath, node_path, resolve_path};
pub use transform::Vec3;
pub use undo::{UndoHistory, UndoRecord};

slotmap::new_key_type! {
    /// Handle to a live node. Stale handles are detected by the arena.
    pub struct NodeId;
}

/// Failure raised by the host scene graph or its persistence layer.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Node no longer exists")]
    StaleNode,
    #[error("Cannot parent '{child}' under its own descendant '{parent}'")]
    CyclicParent { child: String, parent: String },
    #[error("'{0}' is not a component type")]
    NotAComponent(String),
    #[error("Scene file not found: {0}")]
    SceneNotFound(String),
    #[error("Path escapes the project directory: {0}")]
    OutsideProject(String),
    #[error("Invalid document {path}: {source}")]
    Document {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata of the active scene container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInfo {
    pub name: String,
    /// Project-relative file path, empty for a scene that was never saved.
    pub path: String,
    pub is_loaded: bool,
}

/// Everything needed to put a node back the way it was.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeState {
    pub name: String,
    pub parent: Option<NodeId>,
    pub sibling_index: usize,
    pub local_position: Vec3,
    pub components: Vec<String>,
}

/// Read access to the forest structure. This is all path resolution needs.
pub trait Hierarchy {
    /// Root nodes of the active scene, in enumeration order.
    fn roots(&self) -> &[NodeId];

    /// Direct children in order. Empty for unknown nodes.
    fn children(&self, node: NodeId) -> &[NodeId];

    fn name(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;
}

/// Mutation primitives of the host scene graph.
pub trait SceneGraph: Hierarchy + Send {
    fn info(&self) -> SceneInfo;

    fn instance_id(&self, node: NodeId) -> Option<i64>;

    fn components(&self, node: NodeId) -> &[String];

    /// Create a node at the end of the root list.
    fn create_node(&mut self, name: &str) -> NodeId;

    /// Remove a node together with its subtree.
    fn destroy(&mut self, node: NodeId) -> Result<(), HostError>;

    /// Move `node` under `parent` (`None` = root). With `keep_world` the world
    /// position is preserved, otherwise the local position is.
    fn set_parent(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        keep_world: bool,
    ) -> Result<(), HostError>;

    fn add_component(&mut self, node: NodeId, ty: &TypeRef) -> Result<(), HostError>;

    fn local_position(&self, node: NodeId) -> Result<Vec3, HostError>;

    fn world_position(&self, node: NodeId) -> Result<Vec3, HostError>;

    fn set_world_position(&mut self, node: NodeId, position: Vec3) -> Result<(), HostError>;

    fn snapshot(&self, node: NodeId) -> Result<NodeState, HostError>;

    fn restore(&mut self, node: NodeId, state: &NodeState) -> Result<(), HostError>;

    /// Clone a stored node tree into the scene as a new root.
    fn instantiate(&mut self, template: &NodeDocument) -> NodeId;

    fn to_document(&self) -> SceneDocument;

    /// Replace the whole scene with `document`, now living at `path`.
    fn load_document(&mut self, name: &str, path: &str, document: SceneDocument);
}
