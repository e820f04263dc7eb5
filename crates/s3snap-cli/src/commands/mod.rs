pub mod backup;
pub mod list;
pub mod restore;

use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::warn;

use s3snap_core::confirm::Confirm;
use s3snap_core::error::SnapError;
use s3snap_core::retention;
use s3snap_core::snapshot::DeleteOutcome;
use s3snap_core::types::RemoteObject;
use s3snap_storage::error::StoreError;
use s3snap_storage::provider::ObjectStore;

/// Everything a flow needs, built once in `main`.
pub struct Session<'a> {
    pub store: &'a dyn ObjectStore,
    pub confirm: &'a mut dyn Confirm,
    /// Where archives are written while in flight.
    pub work_dir: PathBuf,
    /// Retention keep count.
    pub keep: usize,
}

/// How a flow ended when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    UploadFailed,
    DownloadFailed,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Completed => 0,
            Outcome::UploadFailed | Outcome::DownloadFailed => 3,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("operation aborted by the user")]
    Aborted,

    #[error("no backups available to restore")]
    NoBackups,

    #[error("object key {0:?} cannot be used as a local file name")]
    InvalidKey(String),

    #[error("failed to set up the S3 client: {0:#}")]
    Client(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Snap(#[from] SnapError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlowError {
    /// Every error, an operator abort included, exits with 1. Exit code 2 is
    /// left to clap for usage errors.
    pub fn code(&self) -> u8 {
        1
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

pub type FlowResult = std::result::Result<Outcome, FlowError>;

/// Print a bucket listing the way every flow shows it.
fn print_objects(header: &str, objects: &[RemoteObject]) {
    println!("{header}");
    for obj in objects {
        println!("- {obj}");
    }
}

/// Keep the `session.keep` newest objects in the bucket and delete the rest,
/// after one confirmation for the whole batch.
async fn cleanup_snapshots(session: &mut Session<'_>) -> Result<(), FlowError> {
    let objects = session.store.list_objects().await?;
    if !objects.is_empty() {
        print_objects("The following files are present in the bucket:", &objects);
    }

    let plan = retention::select_for_deletion(&objects, session.keep);
    if plan.delete.is_empty() {
        println!("No files to delete.");
        return Ok(());
    }

    print_objects("The following files will be deleted from the bucket:", &plan.delete);
    let question = format!(
        "Ready to delete {} file(s) from {}.",
        plan.delete.len(),
        session.store.bucket()
    );
    if !session.confirm.confirm(&question)? {
        println!("Deletion aborted by the user.");
        return Ok(());
    }

    for obj in &plan.delete {
        match session.store.delete_object(&obj.key).await {
            Ok(()) => println!("Deleted {}", obj.key),
            Err(e) => {
                warn!("{e}");
                println!("Could not delete {}: {e}", obj.key);
            }
        }
    }
    Ok(())
}

fn report_local_delete(path: &Path, outcome: DeleteOutcome) {
    match outcome {
        DeleteOutcome::Deleted => println!("{} has been deleted locally.", path.display()),
        DeleteOutcome::Missing => println!("{} does not exist.", path.display()),
        DeleteOutcome::Declined => println!("tar deletion aborted by the user."),
    }
}

fn transfer_spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg);
    pb.tick();
    pb
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_documented_table() {
        assert_eq!(Outcome::Completed.code(), 0);
        assert_eq!(Outcome::UploadFailed.code(), 3);
        assert_eq!(Outcome::DownloadFailed.code(), 3);

        let errors = [
            FlowError::Aborted,
            FlowError::NoBackups,
            FlowError::InvalidKey("..".into()),
            FlowError::Client(anyhow::anyhow!("no credentials")),
            FlowError::Store(StoreError::list("bucket", anyhow::anyhow!("denied"))),
            FlowError::Snap(SnapError::SourceNotFound("/nope".into())),
            FlowError::Io(std::io::Error::other("disk full")),
        ];
        for e in &errors {
            assert_eq!(e.code(), 1, "{e}");
        }
    }
}
