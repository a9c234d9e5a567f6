use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backing directory, relative to the working directory.
pub const DEFAULT_ROOT: &str = "files";

/// Configuration for a [`BlobStore`](crate::BlobStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Flat directory holding one file per object.
    pub root: PathBuf,
    /// Create `root` (and parents) on open if it does not exist.
    pub create_root: bool,
    /// Size of the intermediate copy buffer used by uploads and downloads.
    pub buffer_size: usize,
    /// Upper bound on how long a single read from an upload stream may
    /// block. Zero disables the bound.
    pub stall_timeout_secs: u64,
    /// `fsync` uploaded data before it is committed.
    pub sync_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            create_root: true,
            buffer_size: 64 * 1024,
            stall_timeout_secs: 30,
            sync_on_commit: true,
        }
    }
}

impl StoreConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// The stall bound as a [`Duration`], or `None` when disabled.
    pub fn stall_timeout(&self) -> Option<Duration> {
        (self.stall_timeout_secs > 0).then(|| Duration::from_secs(self.stall_timeout_secs))
    }

    /// Copy buffer size, never zero.
    pub fn effective_buffer_size(&self) -> usize {
        self.buffer_size.max(1)
    }
}
