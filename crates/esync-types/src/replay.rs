//! Replaying an edit script against an in-memory tree.
//!
//! Replay enforces the same preconditions a real backend would: parents
//! must exist before children are created, directories must be empty before
//! they are removed, and a value cannot overwrite a directory. An absent root
//! is created on the first write below it.

use crate::error::{TypeError, TypeResult};
use crate::operation::{EditScript, Operation};
use crate::path::TreePath;
use crate::tree::{Node, Tree};

impl EditScript {
    /// Replay every operation in order on `base`, stopping at the first
    /// failure.
    pub fn replay(&self, base: Option<Tree>) -> TypeResult<Option<Tree>> {
        let mut root = base;
        for op in self {
            replay_operation(&mut root, op)?;
        }
        Ok(root)
    }
}

/// Apply a single operation to `root` in place.
pub fn replay_operation(root: &mut Option<Tree>, op: &Operation) -> TypeResult<()> {
    let path = op.path();
    let fail = |reason: &str| TypeError::Replay {
        kind: op.kind().to_string(),
        path: path.to_string(),
        reason: reason.to_owned(),
    };

    let Some(name) = path.file_name() else {
        return replay_on_root(root, op).map_err(fail);
    };

    if root.is_none() {
        match op {
            Operation::MakeDirectory(_) | Operation::SetValue(..) => *root = Some(Tree::new()),
            Operation::RemoveDirectory(_) | Operation::DeleteValue(_) => {
                return Err(fail("not found"))
            }
        }
    }
    let root_tree = root.get_or_insert_with(Tree::new);
    let parent_path = path.parent().unwrap_or_default();
    let parent =
        subtree_mut(root_tree, &parent_path).ok_or_else(|| fail("parent directory does not exist"))?;

    match op {
        Operation::MakeDirectory(_) => {
            if parent.contains(name) {
                return Err(fail("already exists"));
            }
            parent.insert(name, Node::Subtree(Tree::new()))?;
        }
        Operation::RemoveDirectory(_) => match parent.get(name) {
            Some(Node::Subtree(tree)) if tree.is_empty() => {
                parent.remove(name);
            }
            Some(Node::Subtree(_)) => return Err(fail("directory not empty")),
            Some(Node::Leaf(_)) => return Err(fail("not a directory")),
            None => return Err(fail("not found")),
        },
        Operation::SetValue(_, value) => {
            if parent.get(name).is_some_and(Node::is_subtree) {
                return Err(fail("is a directory"));
            }
            parent.insert(name, Node::Leaf(value.clone()))?;
        }
        Operation::DeleteValue(_) => match parent.get(name) {
            Some(Node::Leaf(_)) => {
                parent.remove(name);
            }
            Some(Node::Subtree(_)) => return Err(fail("is a directory")),
            None => return Err(fail("not found")),
        },
    }
    Ok(())
}

fn replay_on_root(root: &mut Option<Tree>, op: &Operation) -> Result<(), &'static str> {
    match op {
        Operation::MakeDirectory(_) if root.is_some() => Err("already exists"),
        Operation::MakeDirectory(_) => {
            *root = Some(Tree::new());
            Ok(())
        }
        Operation::RemoveDirectory(_) => match root {
            Some(tree) if tree.is_empty() => {
                *root = None;
                Ok(())
            }
            Some(_) => Err("directory not empty"),
            None => Err("not found"),
        },
        Operation::SetValue(..) | Operation::DeleteValue(_) => Err("the root is always a directory"),
    }
}

fn subtree_mut<'a>(tree: &'a mut Tree, path: &TreePath) -> Option<&'a mut Tree> {
    let mut current = tree;
    for segment in path.segments() {
        current = match current.get_mut(segment)? {
            Node::Subtree(child) => child,
            Node::Leaf(_) => return None,
        };
    }
    Some(current)
}
