use std::sync::RwLock;

use async_trait::async_trait;
use esync_types::{replay_operation, Operation, Tree};

use crate::error::StoreResult;
use crate::traits::TreeStore;

/// In-memory tree store.
///
/// Intended for tests and embedding. Operations are replayed with the same
/// preconditions a real backend enforces, so a script that applies cleanly
/// here is correctly ordered.
pub struct MemoryTreeStore {
    tree: RwLock<Option<Tree>>,
    location: String,
}

impl MemoryTreeStore {
    /// Create a store holding `tree` (`None` for a location that does not
    /// exist yet).
    pub fn new(tree: Option<Tree>) -> Self {
        Self {
            tree: RwLock::new(tree),
            location: String::new(),
        }
    }

    /// Create a store whose location does not exist.
    pub fn absent() -> Self {
        Self::new(None)
    }

    /// Set the prefix reported by [`TreeStore::location`].
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// A copy of the current tree.
    pub fn snapshot(&self) -> Option<Tree> {
        self.tree.read().expect("lock poisoned").clone()
    }
}

impl Default for MemoryTreeStore {
    fn default() -> Self {
        Self::absent()
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn read_tree(&self) -> StoreResult<Option<Tree>> {
        Ok(self.snapshot())
    }

    async fn apply_operation(&self, op: &Operation) -> StoreResult<()> {
        let mut tree = self.tree.write().expect("lock poisoned");
        replay_operation(&mut tree, op)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

impl std::fmt::Debug for MemoryTreeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let leaves = self
            .tree
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(Tree::leaf_count);
        f.debug_struct("MemoryTreeStore")
            .field("location", &self.location)
            .field("leaves", &leaves)
            .finish()
    }
}
