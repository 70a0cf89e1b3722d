//! Arena storage for YAML documents.
//!
//! A [`YamlTree`] owns every node of one parsed input stream, including all of
//! its documents. Nodes are addressed by [`NodeId`]. Node identity is the id,
//! never the node's value, so two equal scalars at different positions are
//! distinct nodes.
//!
//! Every tree also carries a process-unique [`TreeId`]. Paired with a node id
//! it forms a [`RootRef`], which is how path matchers remember which document
//! root their cached results belong to.
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::node::YamlNode;
//! use yamlwalk::document::tree::YamlTree;
//!
//! let mut tree = YamlTree::new();
//! let key = tree.push(YamlNode::scalar("name"));
//! let value = tree.push(YamlNode::scalar("Alice"));
//! let map = tree.push(YamlNode::mapping().with_content(vec![key, value]));
//! let doc = tree.push_document(YamlNode::document().with_content(vec![map]));
//!
//! assert_eq!(tree.documents(), &[doc]);
//! assert_eq!(tree.mapping_get(map, "name"), Some(value));
//! ```

use super::node::{NodeKind, YamlNode};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a node inside a [`YamlTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the node in its tree's arena.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique identifier of a [`YamlTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What `$` stands for when a path is evaluated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathRoot {
    /// A node of the tree. A document stands for its content.
    Node(NodeId),
    /// A lone key/value pair read as a one-entry mapping. The mapping has no
    /// node of its own in the tree.
    Pair { key: NodeId, value: NodeId },
}

impl fmt::Display for PathRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRoot::Node(node) => write!(f, "{}", node),
            PathRoot::Pair { key, value } => write!(f, "{{{}: {}}}", key, value),
        }
    }
}

/// A path root identified across trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootRef {
    pub tree: TreeId,
    pub root: PathRoot,
}

/// Arena holding every node of a YAML stream.
///
/// Cloning a tree copies its nodes but assigns a fresh [`TreeId`], so caches
/// keyed on the original never apply to the copy.
#[derive(Debug)]
pub struct YamlTree {
    id: TreeId,
    nodes: Vec<YamlNode>,
    documents: Vec<NodeId>,
}

impl Clone for YamlTree {
    fn clone(&self) -> Self {
        Self {
            id: TreeId::next(),
            nodes: self.nodes.clone(),
            documents: self.documents.clone(),
        }
    }
}

impl Default for YamlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlTree {
    /// Creates an empty tree with no documents.
    pub fn new() -> Self {
        Self {
            id: TreeId::next(),
            nodes: Vec::new(),
            documents: Vec::new(),
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Adds a node to the arena and returns its id.
    pub fn push(&mut self, node: YamlNode) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds a node and records it as the next top-level document.
    pub fn push_document(&mut self, node: YamlNode) -> NodeId {
        let id = self.push(node);
        self.documents.push(id);
        id
    }

    /// Top-level documents in input order.
    pub fn documents(&self) -> &[NodeId] {
        &self.documents
    }

    pub fn get(&self, id: NodeId) -> Option<&YamlNode> {
        self.nodes.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut YamlNode> {
        self.nodes.get_mut(id.index())
    }

    /// Returns true if `id` addresses a node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of nodes in the arena, including unreachable ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of `id`, or an empty slice for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.content.as_slice()).unwrap_or(&[])
    }

    /// Returns the cross-tree reference for `node`.
    pub fn root_ref(&self, node: NodeId) -> RootRef {
        RootRef {
            tree: self.id,
            root: PathRoot::Node(node),
        }
    }

    /// Returns a root for the single pair `key: value`, without adding a
    /// mapping node for it.
    pub fn pair_root_ref(&self, key: NodeId, value: NodeId) -> RootRef {
        RootRef {
            tree: self.id,
            root: PathRoot::Pair { key, value },
        }
    }

    /// Key/value pairs of a mapping, in document order.
    pub fn pairs(&self, mapping: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        let content = match self.get(mapping) {
            Some(node) if node.kind == NodeKind::Mapping => node.content.as_slice(),
            _ => &[],
        };
        content.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }

    /// Value of the first pair in `mapping` whose scalar key equals `key`.
    pub fn mapping_get(&self, mapping: NodeId, key: &str) -> Option<NodeId> {
        self.pairs(mapping)
            .find(|(k, _)| {
                self.get(*k)
                    .map(|n| n.kind == NodeKind::Scalar && n.value == key)
                    .unwrap_or(false)
            })
            .map(|(_, v)| v)
    }

    /// Follows alias links until a non-alias node is reached.
    ///
    /// Returns `None` for dangling or cyclic alias chains.
    pub fn resolve_alias(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let node = self.get(current)?;
            match (node.kind, node.alias) {
                (NodeKind::Alias, Some(target)) => current = target,
                (NodeKind::Alias, None) => return None,
                _ => return Some(current),
            }
        }
        None
    }
}

impl Index<NodeId> for YamlTree {
    type Output = YamlNode;

    fn index(&self, id: NodeId) -> &YamlNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for YamlTree {
    fn index_mut(&mut self, id: NodeId) -> &mut YamlNode {
        &mut self.nodes[id.index()]
    }
}
