use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::geometry::Vec3;

/// Newtype wrapper for scene node handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A collaborator call failed. Callers treat this like missing data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccessError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("node {0} no longer exists")]
    StaleNode(NodeId),
    #[error("entity handle {0} no longer resolves")]
    StaleEntity(u64),
}

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The node under the cursor plus its position in whatever repeating
/// list it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusContext {
    pub node: NodeId,
    pub index: usize,
}

impl FocusContext {
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

/// Read-only view of the host's scene graph.
///
/// The graph is owned by the host; the narrator only ever holds `NodeId`s
/// and asks for fresh data on every request.
pub trait SceneAccessor {
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, AccessError>;

    /// Children in sibling order.
    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, AccessError>;

    fn name(&self, node: NodeId) -> Result<String, AccessError>;

    fn is_active(&self, node: NodeId) -> Result<bool, AccessError>;

    /// The text value attached to `node` under `role`, if any.
    fn attached_text(&self, node: NodeId, role: &str) -> Result<Option<String>, AccessError>;

    /// Every text value attached directly to `node`, in attach order.
    fn attached_texts(&self, node: NodeId) -> Result<Vec<String>, AccessError>;

    fn world_position(&self, node: NodeId) -> Result<Option<Vec3>, AccessError>;

    /// First node, in depth-first order, accepted by `predicate`.
    fn find_first(
        &self,
        predicate: &mut dyn FnMut(NodeId) -> bool,
    ) -> Result<Option<NodeId>, AccessError>;
}

/// One text value attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachedText {
    pub role: String,
    pub text: String,
}

/// Flat storage for a single node of a [`SceneTree`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub active: bool,
    pub texts: Vec<AttachedText>,
    pub position: Option<Vec3>,
}

/// An in-memory scene graph. Hosts with their own graph implement
/// [`SceneAccessor`] directly; this one backs tests and the preview tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneTree {
    nodes: Vec<SceneNode>,
    roots: Vec<NodeId>,
}

// Nested RON shape used for fixtures, flattened on load.
#[derive(Debug, Deserialize)]
#[serde(rename = "Node")]
struct RonNode {
    name: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    texts: BTreeMap<String, String>,
    #[serde(default)]
    position: Option<(f32, f32, f32)>,
    #[serde(default)]
    children: Vec<RonNode>,
}

fn default_active() -> bool {
    true
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a scene from a RON file holding a list of root `Node(..)`s.
    pub fn load_from_ron(path: &Path) -> Result<SceneTree, SceneLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<SceneTree, SceneLoadError> {
        let raw: Vec<RonNode> = ron::from_str(input)?;
        let mut tree = SceneTree::new();
        for root in raw {
            tree.insert_ron(None, root);
        }
        Ok(tree)
    }

    fn insert_ron(&mut self, parent: Option<NodeId>, raw: RonNode) -> NodeId {
        let id = match parent {
            Some(p) => self.add_child(p, &raw.name),
            None => self.add_root(&raw.name),
        };
        let node = &mut self.nodes[id.0 as usize];
        node.active = raw.active;
        node.position = raw.position.map(|(x, y, z)| Vec3::new(x, y, z));
        node.texts = raw
            .texts
            .into_iter()
            .map(|(role, text)| AttachedText { role, text })
            .collect();
        for child in raw.children {
            self.insert_ron(Some(id), child);
        }
        id
    }

    pub fn add_root(&mut self, name: &str) -> NodeId {
        let id = self.push(name, None);
        self.roots.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.push(name, Some(parent));
        if let Some(p) = self.nodes.get_mut(parent.0 as usize) {
            p.children.push(id);
        }
        id
    }

    fn push(&mut self, name: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SceneNode {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            active: true,
            texts: Vec::new(),
            position: None,
        });
        id
    }

    /// Attach (or replace) the text stored under `role`.
    pub fn set_text(&mut self, node: NodeId, role: &str, text: &str) -> &mut Self {
        if let Some(n) = self.nodes.get_mut(node.0 as usize) {
            match n.texts.iter_mut().find(|t| t.role == role) {
                Some(existing) => existing.text = text.to_string(),
                None => n.texts.push(AttachedText {
                    role: role.to_string(),
                    text: text.to_string(),
                }),
            }
        }
        self
    }

    pub fn set_active(&mut self, node: NodeId, active: bool) -> &mut Self {
        if let Some(n) = self.nodes.get_mut(node.0 as usize) {
            n.active = active;
        }
        self
    }

    pub fn set_position(&mut self, node: NodeId, position: Vec3) -> &mut Self {
        if let Some(n) = self.nodes.get_mut(node.0 as usize) {
            n.position = Some(position);
        }
        self
    }

    pub fn get(&self, node: NodeId) -> Option<&SceneNode> {
        self.nodes.get(node.0 as usize)
    }

    /// First node with the given name, depth-first from the roots.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut pred = |id: NodeId| self.nodes[id.0 as usize].name == name;
        self.walk(&mut pred)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, node: NodeId) -> Result<&SceneNode, AccessError> {
        self.nodes
            .get(node.0 as usize)
            .ok_or(AccessError::StaleNode(node))
    }

    fn walk(&self, predicate: &mut dyn FnMut(NodeId) -> bool) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if predicate(id) {
                return Some(id);
            }
            if let Some(n) = self.nodes.get(id.0 as usize) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        None
    }
}

impl SceneAccessor for SceneTree {
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, AccessError> {
        Ok(self.node(node)?.parent)
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, AccessError> {
        Ok(self.node(node)?.children.clone())
    }

    fn name(&self, node: NodeId) -> Result<String, AccessError> {
        Ok(self.node(node)?.name.clone())
    }

    fn is_active(&self, node: NodeId) -> Result<bool, AccessError> {
        Ok(self.node(node)?.active)
    }

    fn attached_text(&self, node: NodeId, role: &str) -> Result<Option<String>, AccessError> {
        Ok(self
            .node(node)?
            .texts
            .iter()
            .find(|t| t.role == role)
            .map(|t| t.text.clone()))
    }

    fn attached_texts(&self, node: NodeId) -> Result<Vec<String>, AccessError> {
        Ok(self.node(node)?.texts.iter().map(|t| t.text.clone()).collect())
    }

    fn world_position(&self, node: NodeId) -> Result<Option<Vec3>, AccessError> {
        Ok(self.node(node)?.position)
    }

    fn find_first(
        &self,
        predicate: &mut dyn FnMut(NodeId) -> bool,
    ) -> Result<Option<NodeId>, AccessError> {
        Ok(self.walk(predicate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_query() {
        let mut tree = SceneTree::new();
        let root = tree.add_root("Canvas");
        let menu = tree.add_child(root, "Menu");
        let label = tree.add_child(menu, "Label");
        tree.set_text(label, "text", "Items");

        assert_eq!(tree.parent(label).unwrap(), Some(menu));
        assert_eq!(tree.children(root).unwrap(), vec![menu]);
        assert_eq!(tree.name(menu).unwrap(), "Menu");
        assert_eq!(
            tree.attached_text(label, "text").unwrap().as_deref(),
            Some("Items")
        );
        assert_eq!(tree.attached_text(label, "value").unwrap(), None);
        assert_eq!(tree.find_by_name("Label"), Some(label));
    }

    #[test]
    fn set_text_replaces_same_role() {
        let mut tree = SceneTree::new();
        let root = tree.add_root("Root");
        tree.set_text(root, "text", "a").set_text(root, "text", "b");
        assert_eq!(tree.attached_texts(root).unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn stale_node_errors() {
        let tree = SceneTree::new();
        assert_eq!(
            tree.name(NodeId(7)),
            Err(AccessError::StaleNode(NodeId(7)))
        );
    }

    #[test]
    fn find_first_is_depth_first() {
        let mut tree = SceneTree::new();
        let root = tree.add_root("Root");
        let a = tree.add_child(root, "A");
        let _b = tree.add_child(root, "Target");
        let a_child = tree.add_child(a, "Target");
        let found = tree
            .find_first(&mut |id| tree.get(id).map(|n| n.name == "Target").unwrap_or(false))
            .unwrap();
        assert_eq!(found, Some(a_child));
    }

    #[test]
    fn parse_nested_ron() {
        let input = r#"[
            Node(
                name: "Canvas",
                children: [
                    Node(name: "Title", texts: {"text": "Config"}),
                    Node(name: "Hidden", active: false, position: Some((1.0, 2.0, 0.0))),
                ],
            ),
        ]"#;
        let tree = SceneTree::parse_ron(input).unwrap();
        assert_eq!(tree.len(), 3);
        let title = tree.find_by_name("Title").unwrap();
        assert_eq!(
            tree.attached_text(title, "text").unwrap().as_deref(),
            Some("Config")
        );
        let hidden = tree.find_by_name("Hidden").unwrap();
        assert!(!tree.is_active(hidden).unwrap());
        assert_eq!(
            tree.world_position(hidden).unwrap(),
            Some(Vec3::new(1.0, 2.0, 0.0))
        );
    }
}
