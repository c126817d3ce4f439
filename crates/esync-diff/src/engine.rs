//! Tree-level diff: compare a base and a target tree and produce the edit
//! script that turns one into the other.
//!
//! The walk is depth-first and visits children in name order, so the output
//! is deterministic. Each level runs a removal pass over the base followed by
//! an addition pass over the target:
//!
//! - a directory that disappears has all of its contents removed before its
//!   own `RMDIR`;
//! - a directory that appears gets its `MKDIR` before anything inside it.
//!
//! These orderings come from the order of emission, not from sorting the
//! script afterwards.
//!
//! The root path (`""`) is the sync location itself. It is never created or
//! removed; an absent side is equivalent to an empty root when replayed.

use esync_types::{EditScript, Node, Operation, Tree, TreePath};

use crate::error::{DiffError, DiffResult};

/// Compute the edit script that transforms `base` into `target`.
///
/// Either side may be absent (`None`), meaning the location does not exist
/// at all. Fails with [`DiffError::TypeConflict`] when a path is a directory
/// on one side and a value on the other; no partial script is returned.
pub fn diff(base: Option<&Tree>, target: Option<&Tree>) -> DiffResult<EditScript> {
    let mut script = EditScript::new();
    diff_level(base, target, &TreePath::root(), &mut script)?;
    Ok(script)
}

fn diff_level(
    base: Option<&Tree>,
    target: Option<&Tree>,
    path: &TreePath,
    script: &mut EditScript,
) -> DiffResult<()> {
    if let Some(base) = base {
        for (name, base_node) in base {
            let child = path.child(name);
            match (base_node, target.and_then(|t| t.get(name))) {
                (Node::Leaf(_), None) => script.push(Operation::DeleteValue(child)),
                (Node::Subtree(old), None) => diff_level(Some(old), None, &child, script)?,
                (Node::Leaf(old), Some(Node::Leaf(new))) => {
                    if old != new {
                        script.push(Operation::SetValue(child, new.clone()));
                    }
                }
                (Node::Subtree(old), Some(Node::Subtree(new))) => {
                    diff_level(Some(old), Some(new), &child, script)?
                }
                (old, Some(new)) => {
                    return Err(DiffError::TypeConflict {
                        path: child,
                        base: old.kind(),
                        target: new.kind(),
                    })
                }
            }
        }

        // Every descendant has been removed by now.
        if target.is_none() && !path.is_root() {
            script.push(Operation::RemoveDirectory(path.clone()));
        }
    }

    if let Some(target) = target {
        for (name, target_node) in target {
            if base.is_some_and(|b| b.contains(name)) {
                continue;
            }
            let child = path.child(name);
            match target_node {
                Node::Leaf(value) => script.push(Operation::SetValue(child, value.clone())),
                Node::Subtree(new) => {
                    script.push(Operation::MakeDirectory(child.clone()));
                    diff_level(None, Some(new), &child, script)?;
                }
            }
        }
    }

    Ok(())
}
