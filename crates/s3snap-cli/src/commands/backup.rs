use std::path::Path;
use tracing::{info, warn};

use s3snap_core::archive;
use s3snap_core::snapshot;
use s3snap_core::types::{ArchiveName, Timestamp};

use super::{FlowError, FlowResult, Outcome, Session};

pub async fn run(session: &mut Session<'_>, folder_path: &Path, folder_name: &str) -> FlowResult {
    let key = ArchiveName::new(folder_name, Timestamp::now()).file_name();
    let archive_path = session.work_dir.join(&key);

    archive::compress(folder_path, &archive_path)?;
    info!(
        "archived {} into {}",
        folder_path.display(),
        archive_path.display()
    );

    let question = format!("Ready to upload {key} to {}.", session.store.bucket());
    if !session.confirm.confirm(&question)? {
        println!("Aborting operation.");
        discard(&archive_path);
        return Err(FlowError::Aborted);
    }

    let pb = super::transfer_spinner(format!("Uploading {key}"));
    let uploaded = session.store.upload(&archive_path, &key).await;
    pb.finish_and_clear();

    if let Err(e) = uploaded {
        warn!("{e}");
        println!("Upload failed.");
        println!("Local archive kept at {}", archive_path.display());
        return Ok(Outcome::UploadFailed);
    }
    println!("Upload successful.");

    if let Err(e) = super::cleanup_snapshots(session).await {
        println!("Local archive kept at {}", archive_path.display());
        return Err(e);
    }

    let outcome = snapshot::delete_file(&archive_path, session.confirm)?;
    super::report_local_delete(&archive_path, outcome);

    Ok(Outcome::Completed)
}

/// Drop an archive that will never be uploaded.
fn discard(archive_path: &Path) {
    if let Err(e) = std::fs::remove_file(archive_path) {
        warn!("could not remove {}: {e}", archive_path.display());
        println!("Local archive left at {}", archive_path.display());
    }
}
