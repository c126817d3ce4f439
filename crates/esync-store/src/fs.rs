//! Local filesystem backend.
//!
//! Directories map to subtrees and regular files to leaves holding the file
//! contents. Anything else (symlinks, sockets, devices) is skipped with a
//! warning. All filesystem work runs on tokio's blocking pool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use esync_types::{Node, Operation, Tree, TreePath};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::traits::TreeStore;

/// A directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsTreeStore {
    root: Arc<PathBuf>,
}

impl FsTreeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem path an operation path refers to.
    pub fn resolve(&self, path: &TreePath) -> PathBuf {
        path.segments().fold(self.root.to_path_buf(), |mut acc, segment| {
            acc.push(segment);
            acc
        })
    }

    fn read_blocking(root: &Path) -> StoreResult<Option<Tree>> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::NotADirectory(root.display().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(root, e)),
        }

        // `open` holds the directories being filled, outermost first; the
        // entry at walk depth `d` belongs to `open[d - 2]`, or to `root_tree`
        // when `d == 1`.
        let mut root_tree = Tree::new();
        let mut open: Vec<(String, Tree)> = Vec::new();

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            while open.len() >= entry.depth() {
                close_directory(&mut root_tree, &mut open)?;
            }

            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| StoreError::NonUtf8Name(entry.path().to_path_buf()))?
                .to_owned();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                open.push((name, Tree::new()));
            } else if file_type.is_file() {
                let value = fs::read(entry.path()).map_err(|e| StoreError::io(entry.path(), e))?;
                innermost(&mut root_tree, &mut open).insert(name, Node::Leaf(value))?;
            } else {
                warn!(path = %entry.path().display(), "skipping entry that is neither a file nor a directory");
            }
        }
        while !open.is_empty() {
            close_directory(&mut root_tree, &mut open)?;
        }

        debug!(root = %root.display(), leaves = root_tree.leaf_count(), "read filesystem tree");
        Ok(Some(root_tree))
    }

    fn apply_blocking(&self, op: &Operation) -> StoreResult<()> {
        let target = self.resolve(op.path());
        let io_err = |e| StoreError::io(&target, e);

        match op {
            Operation::MakeDirectory(path) if path.is_root() => {
                fs::create_dir_all(&target).map_err(io_err)
            }
            Operation::MakeDirectory(path) => {
                self.ensure_root_for(path)?;
                fs::create_dir(&target).map_err(io_err)
            }
            Operation::RemoveDirectory(_) => fs::remove_dir(&target).map_err(io_err),
            Operation::SetValue(path, value) => {
                self.ensure_root_for(path)?;
                fs::write(&target, value).map_err(io_err)
            }
            Operation::DeleteValue(_) => fs::remove_file(&target).map_err(io_err),
        }
    }

    /// An absent root is created on the first write directly below it.
    fn ensure_root_for(&self, path: &TreePath) -> StoreResult<()> {
        if path.depth() == 1 {
            fs::create_dir_all(self.root.as_path()).map_err(|e| StoreError::io(self.root.as_path(), e))?;
        }
        Ok(())
    }
}

fn innermost<'a>(root_tree: &'a mut Tree, open: &'a mut [(String, Tree)]) -> &'a mut Tree {
    match open.last_mut() {
        Some((_, tree)) => tree,
        None => root_tree,
    }
}

fn close_directory(root_tree: &mut Tree, open: &mut Vec<(String, Tree)>) -> StoreResult<()> {
    if let Some((name, tree)) = open.pop() {
        innermost(root_tree, open).insert(name, Node::Subtree(tree))?;
    }
    Ok(())
}

#[async_trait]
impl TreeStore for FsTreeStore {
    async fn read_tree(&self) -> StoreResult<Option<Tree>> {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || Self::read_blocking(&root)).await?
    }

    async fn apply_operation(&self, op: &Operation) -> StoreResult<()> {
        let store = self.clone();
        let op = op.clone();
        tokio::task::spawn_blocking(move || store.apply_blocking(&op)).await?
    }

    fn location(&self) -> String {
        self.root().display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esync_diff::diff;
    use esync_types::EditScript;
    use tempfile::TempDir;

    fn p(raw: &str) -> TreePath {
        TreePath::parse(raw).unwrap()
    }

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("d/e")).unwrap();
        fs::create_dir_all(dir.join("empty")).unwrap();
        fs::write(dir.join("top"), b"1").unwrap();
        fs::write(dir.join("d/x"), b"hi").unwrap();
        fs::write(dir.join("d/e/y"), b"deep").unwrap();
        fs::write(dir.join("z"), b"last").unwrap();
    }

    #[tokio::test]
    async fn reads_nested_directories() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());

        let tree = FsTreeStore::new(tmp.path()).read_tree().await.unwrap().unwrap();
        assert_eq!(tree.names().collect::<Vec<_>>(), vec!["d", "empty", "top", "z"]);
        assert_eq!(tree.lookup(&p("/d/x")), Some(&Node::leaf("hi")));
        assert_eq!(tree.lookup(&p("/d/e/y")), Some(&Node::leaf("deep")));
        assert_eq!(tree.lookup(&p("/empty")), Some(&Node::subtree(Tree::new())));
        assert_eq!(tree.lookup(&p("/z")), Some(&Node::leaf("last")));
        assert_eq!(tree.leaf_count(), 4);
    }

    #[tokio::test]
    async fn missing_root_is_absent() {
        let tmp = TempDir::new().unwrap();
        let store = FsTreeStore::new(tmp.path().join("nope"));
        assert!(store.read_tree().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_root_is_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let tree = FsTreeStore::new(tmp.path()).read_tree().await.unwrap();
        assert_eq!(tree, Some(Tree::new()));
    }

    #[tokio::test]
    async fn file_root_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"x").unwrap();
        let err = FsTreeStore::new(&file).read_tree().await.unwrap_err();
        assert!(matches!(err, StoreError::NotADirectory(_)));
    }

    #[test]
    fn resolve_joins_segments() {
        let store = FsTreeStore::new("/srv/data");
        assert_eq!(store.root(), Path::new("/srv/data"));
        assert_eq!(store.location(), "/srv/data");
        assert_eq!(store.resolve(&p("/a/b")), PathBuf::from("/srv/data/a/b"));
        assert_eq!(store.resolve(&TreePath::root()), PathBuf::from("/srv/data"));
    }

    #[tokio::test]
    async fn apply_creates_tree_under_missing_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("out");
        let store = FsTreeStore::new(&root);

        let target = Tree::from_entries([
            ("k", Node::leaf("v")),
            (
                "d",
                Node::subtree(Tree::from_entries([("x", Node::leaf("hi"))]).unwrap()),
            ),
        ])
        .unwrap();
        let script = diff(None, Some(&target)).unwrap();
        store.apply(&script).await.unwrap();

        assert_eq!(fs::read(root.join("d/x")).unwrap(), b"hi");
        assert_eq!(store.read_tree().await.unwrap(), Some(target));
    }

    #[tokio::test]
    async fn apply_converges_existing_directory() {
        let tmp = TempDir::new().unwrap();
        populate(tmp.path());
        let store = FsTreeStore::new(tmp.path());

        let target = Tree::from_entries([
            ("top", Node::leaf("2")),
            ("new", Node::subtree(Tree::from_entries([("n", Node::leaf("x"))]).unwrap())),
        ])
        .unwrap();
        let base = store.read_tree().await.unwrap();
        let script = diff(base.as_ref(), Some(&target)).unwrap();
        store.apply(&script).await.unwrap();

        assert_eq!(store.read_tree().await.unwrap(), Some(target));
        assert!(!tmp.path().join("d").exists());
    }

    #[tokio::test]
    async fn failed_operation_reports_index_and_path() {
        let tmp = TempDir::new().unwrap();
        let store = FsTreeStore::new(tmp.path());
        let script = EditScript::from_iter([
            Operation::SetValue(p("/ok"), b"1".to_vec()),
            Operation::DeleteValue(p("/never-existed")),
        ]);

        let err = store.apply(&script).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Operation { index: 1, ref path, .. } if *path == p("/never-existed")
        ));
        assert!(tmp.path().join("ok").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real"), b"r").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real"), tmp.path().join("link")).unwrap();

        let tree = FsTreeStore::new(tmp.path()).read_tree().await.unwrap().unwrap();
        assert_eq!(tree.names().collect::<Vec<_>>(), vec!["real"]);
    }
}
