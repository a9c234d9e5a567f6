//! In-memory name index and per-object control blocks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock as ObjectLock};

/// Per-object metadata and lock.
///
/// Writers hold the exclusive side of `lock` for a whole upload; readers
/// hold the shared side for a whole download. A block is *committed* once a
/// complete file is visible at `path`; uncommitted blocks exist only while a
/// first upload for a new name is in flight (or after it failed).
pub struct ControlBlock {
    name: String,
    path: PathBuf,
    lock: Arc<ObjectLock<()>>,
    committed: AtomicBool,
}

impl ControlBlock {
    fn new(name: String, path: PathBuf, committed: bool) -> Self {
        Self {
            name,
            path,
            lock: Arc::new(ObjectLock::new(())),
            committed: AtomicBool::new(committed),
        }
    }

    /// The object name (index key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final on-disk location of the object.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a complete object is visible at [`path`](Self::path).
    pub fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_committed(&self) {
        self.committed.store(true, Ordering::Release);
    }

    /// Acquire the exclusive (writer) side of the object lock. The guard is
    /// owned so a commit task can keep holding it.
    pub(crate) async fn write_owned(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.lock).write_owned().await
    }

    /// Acquire the shared (reader) side; the guard may outlive this borrow.
    pub(crate) async fn read_owned(&self) -> OwnedRwLockReadGuard<()> {
        Arc::clone(&self.lock).read_owned().await
    }
}

impl std::fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBlock")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("committed", &self.is_committed())
            .finish()
    }
}

/// Process-wide mapping from object name to control block.
///
/// The map sits behind its own `RwLock`, held only for lookups and inserts
/// and never across I/O. Control blocks are never removed.
pub struct NameIndex {
    root: PathBuf,
    blocks: RwLock<HashMap<String, Arc<ControlBlock>>>,
}

impl NameIndex {
    /// Create an empty index for objects stored directly under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// The directory every object path resolves into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a committed object.
    pub fn lookup(&self, name: &str) -> Option<Arc<ControlBlock>> {
        let map = self.blocks.read().expect("name index lock poisoned");
        map.get(name).filter(|b| b.is_committed()).cloned()
    }

    /// Return the block for `name`, creating an uncommitted one if absent.
    ///
    /// Atomic per name: concurrent callers for the same unknown name all
    /// receive the same block, and exactly one of them sees `existed == false`.
    pub fn get_or_create(&self, name: &str) -> (Arc<ControlBlock>, bool) {
        {
            let map = self.blocks.read().expect("name index lock poisoned");
            if let Some(block) = map.get(name) {
                return (Arc::clone(block), true);
            }
        }

        let mut map = self.blocks.write().expect("name index lock poisoned");
        // Another caller may have inserted between the two lock acquisitions.
        if let Some(block) = map.get(name) {
            return (Arc::clone(block), true);
        }
        let block = Arc::new(ControlBlock::new(
            name.to_string(),
            self.root.join(name),
            false,
        ));
        map.insert(name.to_string(), Arc::clone(&block));
        (block, false)
    }

    /// Register an object that already exists on disk. Returns `false` if
    /// the name was already indexed.
    pub(crate) fn insert_committed(&self, name: &str) -> bool {
        let mut map = self.blocks.write().expect("name index lock poisoned");
        if map.contains_key(name) {
            return false;
        }
        let block = ControlBlock::new(name.to_string(), self.root.join(name), true);
        map.insert(name.to_string(), Arc::new(block));
        true
    }

    /// Names of all committed objects, in no particular order.
    pub fn names(&self) -> Vec<String> {
        let map = self.blocks.read().expect("name index lock poisoned");
        map.values()
            .filter(|b| b.is_committed())
            .map(|b| b.name.clone())
            .collect()
    }

    /// Number of committed objects.
    pub fn len(&self) -> usize {
        let map = self.blocks.read().expect("name index lock poisoned");
        map.values().filter(|b| b.is_committed()).count()
    }

    /// Returns `true` if no object has been committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for NameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameIndex")
            .field("root", &self.root)
            .field("object_count", &self.len())
            .finish()
    }
}
