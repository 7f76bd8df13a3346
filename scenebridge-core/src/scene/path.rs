//! Slash-delimited node addressing.
//!
//! A path is a search, not an identifier: the first segment is matched
//! against the root nodes, every further segment against the direct children
//! of the node found so far. Names are compared exactly and the first match in
//! enumeration order wins, even when siblings share a name.

use std::fmt;

use super::{Hierarchy, NodeId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HierarchyPath {
    segments: Vec<String>,
}

impl HierarchyPath {
    /// Split on `/` and drop empty segments.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn resolve<H: Hierarchy + ?Sized>(&self, tree: &H) -> Option<NodeId> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = find_named(tree, tree.roots(), first)?;
        for segment in rest {
            current = find_named(tree, tree.children(current), segment)?;
        }
        Some(current)
    }
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn find_named<H: Hierarchy + ?Sized>(tree: &H, candidates: &[NodeId], name: &str) -> Option<NodeId> {
    candidates
        .iter()
        .copied()
        .find(|&node| tree.name(node) == Some(name))
}

/// Resolve a possibly absent path string against `tree`.
pub fn resolve_path<H: Hierarchy + ?Sized>(tree: &H, path: Option<&str>) -> Option<NodeId> {
    let path = path.filter(|p| !p.is_empty())?;
    HierarchyPath::parse(path).resolve(tree)
}

/// The path a node would be addressed by: ancestor names joined with `/`.
///
/// Resolving the result yields `node` only if no earlier sibling along the
/// chain shares a name with it.
pub fn node_path<H: Hierarchy + ?Sized>(tree: &H, node: NodeId) -> String {
    let mut names = Vec::new();
    let mut current = Some(node);
    while let Some(id) = current {
        names.push(tree.name(id).unwrap_or_default());
        current = tree.parent(id);
    }
    names.reverse();
    names.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MemoryScene, Vec3};

    fn nested_scene() -> (MemoryScene, NodeId, NodeId, NodeId) {
        let mut scene = MemoryScene::new("Test");
        let a = scene.spawn("A", None, Vec3::ZERO).unwrap();
        let b = scene.spawn("B", Some(a), Vec3::ZERO).unwrap();
        let inner_b = scene.spawn("B", Some(b), Vec3::ZERO).unwrap();
        (scene, a, b, inner_b)
    }

    #[test]
    fn test_parse_drops_empty_segments() {
        let path = HierarchyPath::parse("/Canvas//Panel/");
        assert_eq!(path.segments(), &["Canvas".to_string(), "Panel".to_string()]);
        assert_eq!(path.to_string(), "Canvas/Panel");
        assert!(HierarchyPath::parse("///").is_empty());
    }

    #[test]
    fn test_resolve_walks_depth_first_match() {
        let (scene, a, b, inner_b) = nested_scene();
        assert_eq!(resolve_path(&scene, Some("A")), Some(a));
        assert_eq!(resolve_path(&scene, Some("A/B")), Some(b));
        assert_eq!(resolve_path(&scene, Some("A/B/B")), Some(inner_b));
    }

    #[test]
    fn test_resolve_not_found() {
        let (scene, ..) = nested_scene();
        assert_eq!(resolve_path(&scene, Some("")), None);
        assert_eq!(resolve_path(&scene, None), None);
        assert_eq!(resolve_path(&scene, Some("/")), None);
        assert_eq!(resolve_path(&scene, Some("Nonexistent")), None);
        assert_eq!(resolve_path(&scene, Some("A/Missing")), None);
        // No fallback to a partial match
        assert_eq!(resolve_path(&scene, Some("A/B/B/B")), None);
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let (scene, ..) = nested_scene();
        assert_eq!(resolve_path(&scene, Some("a")), None);
        assert_eq!(resolve_path(&scene, Some("A/b")), None);
    }

    #[test]
    fn test_first_match_wins_among_siblings() {
        let mut scene = MemoryScene::new("Test");
        let first = scene.spawn("Dup", None, Vec3::ZERO).unwrap();
        let second = scene.spawn("Dup", None, Vec3::ZERO).unwrap();
        let child = scene.spawn("Child", Some(second), Vec3::ZERO).unwrap();

        assert_eq!(resolve_path(&scene, Some("Dup")), Some(first));
        // The child hangs off the second root, which is never reached
        assert_eq!(resolve_path(&scene, Some("Dup/Child")), None);
        assert_eq!(node_path(&scene, child), "Dup/Child");
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let (scene, ..) = nested_scene();
        let once = resolve_path(&scene, Some("A/B"));
        let twice = resolve_path(&scene, Some("A/B"));
        assert!(once.is_some());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_node_path() {
        let (scene, a, _, inner_b) = nested_scene();
        assert_eq!(node_path(&scene, a), "A");
        assert_eq!(node_path(&scene, inner_b), "A/B/B");
    }
}
