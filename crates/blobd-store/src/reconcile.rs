//! Startup reconciliation of the name index against the backing directory.

use std::path::Path;

use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::StoreResult;
use crate::index::NameIndex;
use crate::name::{is_staging_name, validate_name};

/// Outcome of a [`reconcile`] pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files registered as objects.
    pub indexed: usize,
    /// Leftover staging files deleted.
    pub removed_staging: usize,
    /// Entries ignored (not regular files, or unusable names).
    pub skipped: usize,
}

/// What a reconcile pass may do to the directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcileMode {
    /// Delete leftover staging files. Only for the process that owns the
    /// directory.
    #[default]
    Repair,
    /// Leave the directory untouched; staging files are only skipped. Safe
    /// to run against the root of a live server.
    ReadOnly,
}

/// Populate `index` from the regular files directly under its root.
///
/// Leftover staging files from an interrupted overwrite are deleted, never
/// indexed. Failure to read the directory is returned as an error; failures
/// on individual entries are logged and skipped.
pub async fn reconcile(index: &NameIndex) -> StoreResult<ReconcileReport> {
    reconcile_with(index, ReconcileMode::Repair).await
}

/// [`reconcile`] with an explicit [`ReconcileMode`].
pub async fn reconcile_with(index: &NameIndex, mode: ReconcileMode) -> StoreResult<ReconcileReport> {
    let root = index.root();
    let mut report = ReconcileReport::default();
    let mut entries = fs::read_dir(root).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let file_type = match entry.file_type().await {
            Ok(ft) => ft,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat entry; skipping");
                report.skipped += 1;
                continue;
            }
        };
        if !file_type.is_file() {
            debug!(path = %path.display(), "not a regular file; skipping");
            report.skipped += 1;
            continue;
        }

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!(path = %path.display(), "file name is not valid UTF-8; skipping");
            report.skipped += 1;
            continue;
        };

        if is_staging_name(name) {
            match mode {
                ReconcileMode::Repair => remove_staging(&path, &mut report).await,
                ReconcileMode::ReadOnly => {
                    debug!(path = %path.display(), "staging file; skipping");
                    report.skipped += 1;
                }
            }
            continue;
        }

        if let Err(e) = validate_name(name) {
            warn!(path = %path.display(), error = %e, "unusable object name; skipping");
            report.skipped += 1;
            continue;
        }

        if index.insert_committed(name) {
            report.indexed += 1;
        }
    }

    info!(
        root = %root.display(),
        ?mode,
        indexed = report.indexed,
        removed_staging = report.removed_staging,
        skipped = report.skipped,
        "reconciled name index"
    );
    Ok(report)
}

async fn remove_staging(path: &Path, report: &mut ReconcileReport) {
    match fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "removed leftover staging file");
            report.removed_staging += 1;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot remove leftover staging file");
            report.skipped += 1;
        }
    }
}
