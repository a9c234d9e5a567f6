use std::io;
use std::path::PathBuf;

use scopeguard::ScopeGuard;
use tracing::{debug, warn};

/// A file an upload is streaming into.
///
/// Deleted on drop unless released with [`keep`], which covers error
/// returns and cancelled uploads alike. Derefs to the file's path.
pub(crate) type StagingFile = ScopeGuard<PathBuf, fn(PathBuf)>;

/// Guard a file this upload just created at `path`.
pub(crate) fn staging_file(path: PathBuf) -> StagingFile {
    scopeguard::guard(path, discard as fn(PathBuf))
}

/// The upload committed; leave whatever is at the path in place.
pub(crate) fn keep(file: StagingFile) -> PathBuf {
    ScopeGuard::into_inner(file)
}

fn discard(path: PathBuf) {
    match std::fs::remove_file(&path) {
        Ok(()) => debug!(path = %path.display(), "discarded staging file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "cannot discard staging file"),
    }
}
