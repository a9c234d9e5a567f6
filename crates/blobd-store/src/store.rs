use std::io;
use std::path::Path;
use std::pin::pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::OwnedRwLockWriteGuard;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::index::{ControlBlock, NameIndex};
use crate::name::{sort_names, staging_name, validate_name};
use crate::reader::ObjectReader;
use crate::reconcile::{reconcile, ReconcileReport};
use crate::staging::{keep, staging_file, StagingFile};

/// Result of a successful [`BlobStore::put`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutOutcome {
    pub name: String,
    pub bytes_written: u64,
    /// `true` if no committed object existed under this name before.
    pub created: bool,
}

/// Named blob store over a flat directory.
///
/// Cloning is cheap; all clones share one index.
#[derive(Clone)]
pub struct BlobStore {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    index: NameIndex,
    /// Sequence number of the next staging file.
    next_staging: AtomicU64,
}

impl BlobStore {
    /// Open the store at `config.root` and reconcile the index with the
    /// files already there.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        Self::open_with_report(config).await.map(|(store, _)| store)
    }

    /// Like [`open`](Self::open), also returning what reconciliation found.
    pub async fn open_with_report(config: StoreConfig) -> StoreResult<(Self, ReconcileReport)> {
        if config.create_root {
            fs::create_dir_all(&config.root).await?;
        }
        let index = NameIndex::new(config.root.clone());
        let report = reconcile(&index).await?;
        let store = Self {
            inner: Arc::new(Inner {
                config,
                index,
                next_staging: AtomicU64::new(0),
            }),
        };
        Ok((store, report))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// The backing directory.
    pub fn root(&self) -> &Path {
        self.inner.index.root()
    }

    /// Number of committed objects.
    pub fn len(&self) -> usize {
        self.inner.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.index.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.index.lookup(name).is_some()
    }

    /// Store exactly `expected_len` bytes from `reader` under `name`,
    /// replacing any previous object atomically.
    ///
    /// Uploads to the same name run one at a time. A first upload for a new
    /// name streams straight into the final path, which must not exist yet;
    /// an overwrite streams into a staging file and renames it over the old
    /// object only after the byte count checks out. On any failure, or if
    /// this future is dropped before the commit starts, the partial file is
    /// removed and the previous object stays as it was.
    pub async fn put<R>(&self, name: &str, expected_len: u64, reader: R) -> StoreResult<PutOutcome>
    where
        R: AsyncRead,
    {
        validate_name(name)?;
        if expected_len == 0 {
            return Err(StoreError::EmptyObject);
        }

        let (block, existed) = self.inner.index.get_or_create(name);
        let write = block.write_owned().await;

        // Decided under the lock: a racing first writer may have committed
        // while this one waited.
        let overwrite = block.is_committed();
        let target = if overwrite {
            let id = self.inner.next_staging.fetch_add(1, Ordering::Relaxed);
            self.root().join(staging_name(id))
        } else {
            block.path().to_path_buf()
        };
        debug!(
            name,
            existed,
            overwrite,
            target = %target.display(),
            expected_len,
            "opening upload target"
        );

        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            // Never follow or clobber an entry this store did not create.
            options.create_new(true);
        }
        let file = options.open(&target).await?;
        let staging = staging_file(target);

        let reader = pin!(reader);
        let written = self.write_upload(reader, file, expected_len).await?;
        if written != expected_len {
            return Err(StoreError::LengthMismatch {
                expected: expected_len,
                actual: written,
            });
        }

        tokio::spawn(commit(Arc::clone(&block), write, staging, overwrite))
            .await
            .map_err(io::Error::other)??;

        info!(name, bytes = written, overwrite, "committed object");
        Ok(PutOutcome {
            name: name.to_string(),
            bytes_written: written,
            created: !overwrite,
        })
    }

    /// Copy `reader` into `file` through a fixed buffer, stopping early once
    /// more than `expected_len` bytes have arrived. The file is flushed (and
    /// synced if configured) and closed before returning.
    async fn write_upload<R>(&self, mut reader: R, mut file: File, expected_len: u64) -> StoreResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; self.inner.config.effective_buffer_size()];
        let stall = self.inner.config.stall_timeout();
        let mut written: u64 = 0;

        loop {
            let n = match stall {
                Some(limit) => tokio::time::timeout(limit, reader.read(&mut buf))
                    .await
                    .map_err(|_| StoreError::StalledStream(limit))??,
                None => reader.read(&mut buf).await?,
            };
            if n == 0 {
                break;
            }
            written += n as u64;
            if written > expected_len {
                return Err(StoreError::LengthMismatch {
                    expected: expected_len,
                    actual: written,
                });
            }
            file.write_all(&buf[..n]).await?;
        }

        file.flush().await?;
        if self.inner.config.sync_on_commit {
            file.sync_all().await?;
        }
        Ok(written)
    }

    /// Open a committed object for streaming.
    ///
    /// The returned reader holds the object's shared lock, so overwrites of
    /// this name wait until it is dropped.
    pub async fn open_object(&self, name: &str) -> StoreResult<ObjectReader> {
        validate_name(name)?;
        let block = self
            .inner
            .index
            .lookup(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let guard = block.read_owned().await;

        let file = File::open(block.path()).await?;
        let len = file.metadata().await?.len();
        debug!(name, len, "opened object for reading");

        Ok(ObjectReader::new(
            name.to_string(),
            file,
            len,
            self.inner.config.effective_buffer_size(),
            guard,
        ))
    }

    /// Stream the object `name` into `sink`, returning the bytes copied.
    pub async fn get<W>(&self, name: &str, sink: &mut W) -> StoreResult<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let reader = self.open_object(name).await?;
        let copied = reader.copy_to(sink).await?;
        debug!(name, bytes = copied, "served object");
        Ok(copied)
    }

    /// Names of all committed objects in listing order.
    pub fn list(&self) -> Vec<String> {
        let mut names = self.inner.index.names();
        sort_names(&mut names);
        names
    }
}

impl std::fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("root", &self.root())
            .field("object_count", &self.len())
            .finish()
    }
}

/// Make a verified upload visible and release the writer lock.
///
/// Runs as its own task: once started it finishes even if the `put` that
/// spawned it is dropped, so the lock is never released mid-rename.
async fn commit(
    block: Arc<ControlBlock>,
    write: OwnedRwLockWriteGuard<()>,
    staging: StagingFile,
    overwrite: bool,
) -> io::Result<()> {
    if overwrite {
        fs::rename(&*staging, block.path()).await?;
    }
    keep(staging);
    block.mark_committed();
    drop(write);
    Ok(())
}
