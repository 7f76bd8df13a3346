use std::collections::VecDeque;

use super::{HostError, NodeId, NodeState, SceneGraph};

const DEFAULT_LIMIT: usize = 256;

/// One reversible step, recorded before the mutation it describes.
#[derive(Debug, Clone)]
pub enum UndoRecord {
    /// A node (and its subtree) was brought into existence.
    Created { node: NodeId, label: String },
    /// A node is about to change; `before` is its prior state.
    Modified {
        node: NodeId,
        before: NodeState,
        label: String,
    },
}

impl UndoRecord {
    pub fn label(&self) -> &str {
        match self {
            UndoRecord::Created { label, .. } | UndoRecord::Modified { label, .. } => label,
        }
    }
}

/// Bounded undo stack. Oldest records are dropped once the limit is reached.
#[derive(Debug)]
pub struct UndoHistory {
    records: VecDeque<UndoRecord>,
    limit: usize,
}

impl UndoHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            records: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn record_created(&mut self, node: NodeId, label: &str) {
        self.push(UndoRecord::Created {
            node,
            label: label.to_string(),
        });
    }

    /// Snapshot `node` so that a following mutation can be reverted.
    pub fn record_state(
        &mut self,
        scene: &dyn SceneGraph,
        node: NodeId,
        label: &str,
    ) -> Result<(), HostError> {
        let before = scene.snapshot(node)?;
        self.record_snapshot(node, before, label);
        Ok(())
    }

    /// Record a state captured earlier with [`SceneGraph::snapshot`], once
    /// the mutation it guards has succeeded.
    pub fn record_snapshot(&mut self, node: NodeId, before: NodeState, label: &str) {
        self.push(UndoRecord::Modified {
            node,
            before,
            label: label.to_string(),
        });
    }

    fn push(&mut self, record: UndoRecord) {
        tracing::trace!("[Undo] Recording '{}'", record.label());
        if self.records.len() == self.limit {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Revert the most recent record. Returns its label, or `None` when empty.
    pub fn undo(&mut self, scene: &mut dyn SceneGraph) -> Result<Option<String>, HostError> {
        let Some(record) = self.records.pop_back() else {
            return Ok(None);
        };
        match &record {
            UndoRecord::Created { node, .. } => scene.destroy(*node)?,
            UndoRecord::Modified { node, before, .. } => scene.restore(*node, before)?,
        }
        Ok(Some(record.label().to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest first.
    pub fn records(&self) -> impl Iterator<Item = &UndoRecord> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}
