//! Local filesystem side effects: snapshot renames and archive cleanup.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::confirm::Confirm;
use crate::error::{Result, SnapError};
use crate::types::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The folder now lives at this path.
    Renamed(PathBuf),
    /// Nothing to rename.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Missing,
    Declined,
}

/// Move an existing folder to `<parent>/<base>_snapshot_<timestamp>`.
///
/// A path that does not exist (or is not a directory) is left alone. If the
/// snapshot name is already taken, `-1`, `-2`, ... is appended.
pub fn snapshot_rename(path: &Path, timestamp: Timestamp) -> Result<RenameOutcome> {
    if !path.is_dir() {
        debug!("{} does not exist, nothing to snapshot", path.display());
        return Ok(RenameOutcome::Missing);
    }

    let base = path.file_name().ok_or_else(|| {
        SnapError::Config(format!("cannot snapshot {}: no folder name", path.display()))
    })?;
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = format!("{}_snapshot_{timestamp}", base.to_string_lossy());

    let mut target = parent.join(&stem);
    let mut n = 1u32;
    while target.exists() {
        target = parent.join(format!("{stem}-{n}"));
        n += 1;
    }

    std::fs::rename(path, &target)?;
    debug!("renamed {} to {}", path.display(), target.display());
    Ok(RenameOutcome::Renamed(target))
}

/// Remove a local archive, asking `confirm` first.
pub fn delete_file(path: &Path, confirm: &mut dyn Confirm) -> Result<DeleteOutcome> {
    let question = format!("Ready to delete local tar file {}.", path.display());
    if !confirm.confirm(&question)? {
        return Ok(DeleteOutcome::Declined);
    }

    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("deleted {}", path.display());
            Ok(DeleteOutcome::Deleted)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::Missing),
        Err(e) => Err(e.into()),
    }
}
