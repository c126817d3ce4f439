//! The tree model both sides of a sync are read into.
//!
//! A [`Tree`] is a subtree: an ordered-by-name mapping from segment names to
//! [`Node`]s. A node is either another subtree or a leaf holding an opaque
//! byte value. A whole side that does not exist at all is represented as
//! `Option<Tree>::None`, which is distinct from an empty tree.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::TypeResult;
use crate::path::{validate_name, TreePath};

/// Which variant a node is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Subtree,
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subtree => write!(f, "directory"),
            Self::Leaf => write!(f, "value"),
        }
    }
}

/// A single entry in a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A directory of named children.
    Subtree(Tree),
    /// An opaque byte value.
    Leaf(Vec<u8>),
}

impl Node {
    /// Create a leaf from raw bytes.
    pub fn leaf(value: impl Into<Vec<u8>>) -> Self {
        Self::Leaf(value.into())
    }

    /// Wrap a tree as a subtree node.
    pub fn subtree(tree: Tree) -> Self {
        Self::Subtree(tree)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Subtree(_) => NodeKind::Subtree,
            Self::Leaf(_) => NodeKind::Leaf,
        }
    }

    pub fn is_subtree(&self) -> bool {
        matches!(self, Self::Subtree(_))
    }

    /// The children of a subtree node.
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Self::Subtree(tree) => Some(tree),
            Self::Leaf(_) => None,
        }
    }

    /// The bytes of a leaf node.
    pub fn as_value(&self) -> Option<&[u8]> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Subtree(_) => None,
        }
    }

    /// Look up a direct child. Always `None` for leaves.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.as_tree().and_then(|tree| tree.get(name))
    }
}

impl From<Tree> for Node {
    fn from(tree: Tree) -> Self {
        Self::Subtree(tree)
    }
}

/// A subtree: named children kept in name order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    children: BTreeMap<String, Node>,
}

impl Tree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(name, node)` pairs.
    ///
    /// Fails on the first name that is empty or contains `/`. Later pairs
    /// with a duplicate name replace earlier ones.
    pub fn from_entries<I, K>(entries: I) -> TypeResult<Self>
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let mut tree = Self::new();
        for (name, node) in entries {
            tree.insert(name, node)?;
        }
        Ok(tree)
    }

    /// Insert a child, returning the node previously stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, node: Node) -> TypeResult<Option<Node>> {
        let name = name.into();
        validate_name(&name)?;
        Ok(self.children.insert(name, node))
    }

    /// Look up a direct child by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Resolve a path relative to this tree. The root path has no node and
    /// resolves to `None`.
    pub fn lookup(&self, path: &TreePath) -> Option<&Node> {
        let mut segments = path.segments();
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = node.get(segment)?;
        }
        Some(node)
    }

    /// Iterate children in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Node> {
        self.children.iter()
    }

    /// Child names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves anywhere below this tree.
    pub fn leaf_count(&self) -> usize {
        self.children
            .values()
            .map(|node| match node {
                Node::Leaf(_) => 1,
                Node::Subtree(tree) => tree.leaf_count(),
            })
            .sum()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = (&'a String, &'a Node);
    type IntoIter = btree_map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeError;

    fn sample() -> Tree {
        let inner = Tree::from_entries([("x", Node::leaf("hi"))]).unwrap();
        Tree::from_entries([
            ("b", Node::leaf(vec![2u8])),
            ("d", Node::subtree(inner)),
            ("a", Node::leaf(vec![1u8])),
        ])
        .unwrap()
    }

    #[test]
    fn children_iterate_in_name_order() {
        let tree = sample();
        assert_eq!(tree.names().collect::<Vec<_>>(), vec!["a", "b", "d"]);
        assert_eq!(tree.len(), 3);
        assert!(!tree.is_empty());
    }

    #[test]
    fn node_reports_its_variant() {
        let tree = sample();
        assert_eq!(tree.get("a").unwrap().kind(), NodeKind::Leaf);
        assert_eq!(tree.get("d").unwrap().kind(), NodeKind::Subtree);
        assert_eq!(tree.get("a").unwrap().as_value(), Some(&[1u8][..]));
        assert!(tree.get("d").unwrap().as_value().is_none());
    }

    #[test]
    fn missing_child_is_absent_not_error() {
        let tree = sample();
        assert!(tree.get("zzz").is_none());
        assert!(tree.get("a").unwrap().get("anything").is_none());
        assert!(!tree.contains("zzz"));
    }

    #[test]
    fn lookup_walks_nested_paths() {
        let tree = sample();
        let path = TreePath::parse("/d/x").unwrap();
        assert_eq!(tree.lookup(&path), Some(&Node::leaf("hi")));
        assert!(tree.lookup(&TreePath::root()).is_none());
        assert!(tree.lookup(&TreePath::parse("/a/x").unwrap()).is_none());
    }

    #[test]
    fn insert_rejects_invalid_names() {
        let mut tree = Tree::new();
        assert_eq!(
            tree.insert("a/b", Node::leaf("v")),
            Err(TypeError::InvalidName("a/b".into()))
        );
        assert!(tree.insert("", Node::leaf("v")).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn insert_returns_replaced_node() {
        let mut tree = Tree::new();
        assert_eq!(tree.insert("k", Node::leaf("1")).unwrap(), None);
        assert_eq!(tree.insert("k", Node::leaf("2")).unwrap(), Some(Node::leaf("1")));
    }

    #[test]
    fn empty_tree_differs_from_absent() {
        let absent: Option<Tree> = None;
        let empty = Some(Tree::new());
        assert_ne!(absent, empty);
    }

    #[test]
    fn leaf_count_is_recursive() {
        assert_eq!(sample().leaf_count(), 3);
        assert_eq!(Tree::new().leaf_count(), 0);
    }

    #[test]
    fn node_kind_display() {
        assert_eq!(NodeKind::Subtree.to_string(), "directory");
        assert_eq!(NodeKind::Leaf.to_string(), "value");
    }
}
