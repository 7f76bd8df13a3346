use slotmap::SlotMap;

use super::{HostError, Hierarchy, NodeId, NodeState, SceneGraph, SceneInfo, Vec3};
use crate::document::{NodeDocument, SceneDocument};
use crate::registry::{TypeKind, TypeRef};

struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vec3,
    components: Vec<String>,
    instance_id: i64,
}

/// Arena-backed scene graph holding one active scene.
pub struct MemoryScene {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
    name: String,
    path: String,
    loaded: bool,
    next_instance_id: i64,
}

impl MemoryScene {
    /// An empty, loaded scene that has never been saved.
    pub fn new(name: &str) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
            name: name.to_string(),
            path: String::new(),
            loaded: true,
            next_instance_id: 1,
        }
    }

    /// A host with no scene loaded at all.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::new("")
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Create a node with the given local position, optionally under `parent`.
    pub fn spawn(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        position: Vec3,
    ) -> Result<NodeId, HostError> {
        if let Some(parent) = parent {
            self.node(parent)?;
        }
        Ok(self.insert(name, parent, position))
    }

    /// `parent`, if any, must be live.
    fn insert(&mut self, name: &str, parent: Option<NodeId>, position: Vec3) -> NodeId {
        let instance_id = self.next_instance_id;
        self.next_instance_id += 1;
        let id = self.nodes.insert(Node {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            position,
            components: Vec::new(),
            instance_id,
        });
        self.siblings_mut(parent).push(id);
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, HostError> {
        self.nodes.get(id).ok_or(HostError::StaleNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, HostError> {
        self.nodes.get_mut(id).ok_or(HostError::StaleNode)
    }

    /// The list `node` lives in: its parent's children or the root list.
    fn siblings_mut(&mut self, parent: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        }
    }

    fn detach(&mut self, id: NodeId) -> Result<(), HostError> {
        let parent = self.node(id)?.parent;
        self.siblings_mut(parent).retain(|&n| n != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn attach(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) -> Result<(), HostError> {
        self.node_mut(id)?.parent = parent;
        let siblings = self.siblings_mut(parent);
        match index {
            Some(i) if i < siblings.len() => siblings.insert(i, id),
            _ => siblings.push(id),
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn sibling_index(&self, id: NodeId) -> usize {
        let parent = self.nodes.get(id).and_then(|n| n.parent);
        let siblings = match parent.and_then(|p| self.nodes.get(p)) {
            Some(parent) => &parent.children,
            None => &self.roots,
        };
        siblings.iter().position(|&n| n == id).unwrap_or(0)
    }

    fn spawn_tree(&mut self, doc: &NodeDocument, parent: Option<NodeId>) -> NodeId {
        let id = self.insert(&doc.name, parent, doc.position);
        if let Some(node) = self.nodes.get_mut(id) {
            node.components = doc.components.clone();
        }
        for child in &doc.children {
            self.spawn_tree(child, Some(id));
        }
        id
    }

    fn document_of(&self, id: NodeId) -> NodeDocument {
        let node = &self.nodes[id];
        NodeDocument {
            name: node.name.clone(),
            position: node.position,
            components: node.components.clone(),
            children: node.children.iter().map(|&c| self.document_of(c)).collect(),
        }
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Hierarchy for MemoryScene {
    fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    fn name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).map(|n| n.name.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }
}

impl SceneGraph for MemoryScene {
    fn info(&self) -> SceneInfo {
        SceneInfo {
            name: self.name.clone(),
            path: self.path.clone(),
            is_loaded: self.loaded,
        }
    }

    fn instance_id(&self, node: NodeId) -> Option<i64> {
        self.nodes.get(node).map(|n| n.instance_id)
    }

    fn components(&self, node: NodeId) -> &[String] {
        self.nodes
            .get(node)
            .map(|n| n.components.as_slice())
            .unwrap_or_default()
    }

    fn create_node(&mut self, name: &str) -> NodeId {
        self.insert(name, None, Vec3::ZERO)
    }

    fn destroy(&mut self, node: NodeId) -> Result<(), HostError> {
        self.detach(node)?;
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                pending.extend(removed.children);
            }
        }
        Ok(())
    }

    fn set_parent(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        keep_world: bool,
    ) -> Result<(), HostError> {
        let current = self.node(node)?.parent;
        if let Some(parent) = parent {
            self.node(parent)?;
            if self.is_ancestor_or_self(node, parent) {
                return Err(HostError::CyclicParent {
                    child: self.nodes[node].name.clone(),
                    parent: self.nodes[parent].name.clone(),
                });
            }
        }
        if current == parent {
            return Ok(());
        }

        let world = self.world_position(node)?;
        self.detach(node)?;
        self.attach(node, parent, None)?;

        if keep_world {
            let origin = match parent {
                Some(p) => self.world_position(p)?,
                None => Vec3::ZERO,
            };
            self.node_mut(node)?.position = world - origin;
        }
        Ok(())
    }

    fn add_component(&mut self, node: NodeId, ty: &TypeRef) -> Result<(), HostError> {
        if ty.kind != TypeKind::Component {
            return Err(HostError::NotAComponent(ty.full_name.clone()));
        }
        self.node_mut(node)?.components.push(ty.name.clone());
        Ok(())
    }

    fn local_position(&self, node: NodeId) -> Result<Vec3, HostError> {
        Ok(self.node(node)?.position)
    }

    fn world_position(&self, node: NodeId) -> Result<Vec3, HostError> {
        let mut world = Vec3::ZERO;
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id)?;
            world = world + n.position;
            current = n.parent;
        }
        Ok(world)
    }

    fn set_world_position(&mut self, node: NodeId, position: Vec3) -> Result<(), HostError> {
        let origin = match self.node(node)?.parent {
            Some(parent) => self.world_position(parent)?,
            None => Vec3::ZERO,
        };
        self.node_mut(node)?.position = position - origin;
        Ok(())
    }

    fn snapshot(&self, node: NodeId) -> Result<NodeState, HostError> {
        let n = self.node(node)?;
        Ok(NodeState {
            name: n.name.clone(),
            parent: n.parent,
            sibling_index: self.sibling_index(node),
            local_position: n.position,
            components: n.components.clone(),
        })
    }

    fn restore(&mut self, node: NodeId, state: &NodeState) -> Result<(), HostError> {
        self.node(node)?;
        if let Some(parent) = state.parent {
            self.node(parent)?;
        }
        self.detach(node)?;
        self.attach(node, state.parent, Some(state.sibling_index))?;

        let n = self.node_mut(node)?;
        n.name = state.name.clone();
        n.position = state.local_position;
        n.components = state.components.clone();
        Ok(())
    }

    fn instantiate(&mut self, template: &NodeDocument) -> NodeId {
        self.spawn_tree(template, None)
    }

    fn to_document(&self) -> SceneDocument {
        SceneDocument {
            name: self.name.clone(),
            roots: self.roots.iter().map(|&r| self.document_of(r)).collect(),
        }
    }

    fn load_document(&mut self, name: &str, path: &str, document: SceneDocument) {
        self.nodes.clear();
        self.roots.clear();
        self.name = name.to_string();
        self.path = path.to_string();
        self.loaded = true;
        for root in &document.roots {
            self.spawn_tree(root, None);
        }
    }
}
