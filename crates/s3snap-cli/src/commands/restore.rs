use std::path::Path;
use tracing::{info, warn};

use s3snap_core::archive;
use s3snap_core::retention;
use s3snap_core::snapshot::{self, RenameOutcome};
use s3snap_core::types::Timestamp;

use super::{FlowError, FlowResult, Outcome, Session};

pub async fn run(session: &mut Session<'_>, folder_path: &Path, folder_name: &str) -> FlowResult {
    let objects = session.store.list_objects().await?;
    let Some(latest) = retention::latest(&objects).cloned() else {
        println!("No backups available to restore.");
        return Err(FlowError::NoBackups);
    };
    super::print_objects("The following files are present in the bucket:", &objects);

    let local_name = Path::new(&latest.key)
        .file_name()
        .ok_or_else(|| FlowError::InvalidKey(latest.key.clone()))?;
    let archive_path = session.work_dir.join(local_name);

    let question = format!("Ready to restore {}.", latest.key);
    if !session.confirm.confirm(&question)? {
        println!("Aborting operation.");
        return Err(FlowError::Aborted);
    }

    // Never overwrite the current contents in place.
    let target = folder_path.join(folder_name);
    match snapshot::snapshot_rename(&target, Timestamp::now())? {
        RenameOutcome::Renamed(new_path) => println!(
            "Existing folder {} renamed to: {}",
            target.display(),
            new_path.display()
        ),
        RenameOutcome::Missing => println!("Folder '{}' does not exist.", target.display()),
    }

    let pb = super::transfer_spinner(format!("Downloading {}", latest.key));
    let downloaded = session.store.download(&latest.key, &archive_path).await;
    pb.finish_and_clear();

    if let Err(e) = downloaded {
        warn!("{e}");
        println!("Restore failed.");
        return Ok(Outcome::DownloadFailed);
    }
    println!("Downloaded {} from {}", latest.key, session.store.bucket());

    if let Err(e) = archive::extract(&archive_path, folder_path) {
        println!(
            "Extraction failed; downloaded archive kept at {}",
            archive_path.display()
        );
        return Err(e.into());
    }
    info!("restored {} into {}", latest.key, folder_path.display());
    println!("Restore successful.");

    let outcome = snapshot::delete_file(&archive_path, session.confirm)?;
    super::report_local_delete(&archive_path, outcome);

    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{BrokenListing, BrokenTransfers, Scripted, day, seed};
    use s3snap_core::confirm::AutoConfirm;
    use s3snap_storage::error::StoreOp;
    use s3snap_storage::local::DirObjectStore;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        dest: PathBuf,
        work_dir: PathBuf,
        scratch: PathBuf,
        store: DirObjectStore,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("data");
        let work_dir = tmp.path().join("work");
        let scratch = tmp.path().join("scratch");
        for d in [&dest, &work_dir, &scratch] {
            std::fs::create_dir_all(d).unwrap();
        }
        let store = DirObjectStore::new(&tmp.path().join("bucket")).unwrap();
        Fixture {
            dest,
            work_dir,
            scratch,
            store,
            _tmp: tmp,
        }
    }

    /// Build a real archive of an `app` folder holding one file.
    fn app_archive(scratch: &Path, tag: &str, content: &[u8]) -> Vec<u8> {
        let folder = scratch.join(tag).join("app");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("state.txt"), content).unwrap();
        let out = scratch.join(format!("{tag}.tar.gz"));
        archive::compress(&folder, &out).unwrap();
        std::fs::read(&out).unwrap()
    }

    fn session<'a>(
        store: &'a dyn s3snap_storage::provider::ObjectStore,
        confirm: &'a mut dyn s3snap_core::confirm::Confirm,
        work_dir: &Path,
    ) -> Session<'a> {
        Session {
            store,
            confirm,
            work_dir: work_dir.to_path_buf(),
            keep: 3,
        }
    }

    fn snapshot_dirs(dest: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dest)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("app_snapshot_"))
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn restores_newest_archive_and_snapshots_current_folder() {
        let fx = fixture();
        let old = app_archive(&fx.scratch, "old", b"v1");
        let new = app_archive(&fx.scratch, "new", b"v2");
        let newer = "app-snapshot-2020-01-02-12-00-00.tar.gz";
        let older = "app-snapshot-2020-01-01-12-00-00.tar.gz";
        seed(&fx.store, &fx.scratch, newer, &new, day(2)).await;
        seed(&fx.store, &fx.scratch, older, &old, day(1)).await;

        let current = fx.dest.join("app");
        std::fs::create_dir(&current).unwrap();
        std::fs::write(current.join("state.txt"), b"local edits").unwrap();

        let mut confirm = AutoConfirm;
        let mut s = session(&fx.store, &mut confirm, &fx.work_dir);
        let outcome = run(&mut s, &fx.dest, "app").await.unwrap();
        assert_eq!(outcome, Outcome::Completed);

        assert_eq!(std::fs::read(current.join("state.txt")).unwrap(), b"v2");
        let snaps = snapshot_dirs(&fx.dest);
        assert_eq!(snaps.len(), 1);
        assert_eq!(
            std::fs::read(fx.dest.join(&snaps[0]).join("state.txt")).unwrap(),
            b"local edits"
        );
        assert_eq!(std::fs::read_dir(&fx.work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_bucket_fails_without_touching_disk() {
        let fx = fixture();
        let current = fx.dest.join("app");
        std::fs::create_dir(&current).unwrap();

        let mut confirm = Scripted::default();
        let mut s = session(&fx.store, &mut confirm, &fx.work_dir);
        let err = run(&mut s, &fx.dest, "app").await.unwrap_err();
        assert!(matches!(err, FlowError::NoBackups));

        assert!(confirm.asked.is_empty());
        assert!(current.is_dir());
        assert!(snapshot_dirs(&fx.dest).is_empty());
        assert_eq!(std::fs::read_dir(&fx.work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn declined_restore_changes_nothing() {
        let fx = fixture();
        let data = app_archive(&fx.scratch, "only", b"v1");
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-00.tar.gz",
            &data,
            day(1),
        )
        .await;
        let current = fx.dest.join("app");
        std::fs::create_dir(&current).unwrap();
        std::fs::write(current.join("state.txt"), b"local").unwrap();

        let mut confirm = Scripted::new(&[false]);
        let mut s = session(&fx.store, &mut confirm, &fx.work_dir);
        let err = run(&mut s, &fx.dest, "app").await.unwrap_err();
        assert!(matches!(err, FlowError::Aborted));

        assert_eq!(
            confirm.asked,
            ["Ready to restore app-snapshot-2020-01-01-12-00-00.tar.gz."]
        );
        assert_eq!(std::fs::read(current.join("state.txt")).unwrap(), b"local");
        assert!(snapshot_dirs(&fx.dest).is_empty());
        assert_eq!(std::fs::read_dir(&fx.work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_download_stops_before_extraction() {
        let fx = fixture();
        let data = app_archive(&fx.scratch, "only", b"v1");
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-00.tar.gz",
            &data,
            day(1),
        )
        .await;
        let broken = BrokenTransfers(fx.store);

        let mut confirm = AutoConfirm;
        let mut s = session(&broken, &mut confirm, &fx.work_dir);
        let outcome = run(&mut s, &fx.dest, "app").await.unwrap();
        assert_eq!(outcome, Outcome::DownloadFailed);

        assert!(!fx.dest.join("app").exists());
        assert_eq!(std::fs::read_dir(&fx.work_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn equal_timestamps_restore_greatest_key() {
        let fx = fixture();
        let first = app_archive(&fx.scratch, "first", b"first");
        let second = app_archive(&fx.scratch, "second", b"second");
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-02.tar.gz",
            &second,
            day(1),
        )
        .await;
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-01.tar.gz",
            &first,
            day(1),
        )
        .await;

        let mut confirm = AutoConfirm;
        let mut s = session(&fx.store, &mut confirm, &fx.work_dir);
        run(&mut s, &fx.dest, "app").await.unwrap();

        assert_eq!(
            std::fs::read(fx.dest.join("app/state.txt")).unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn corrupt_archive_is_reported_and_kept() {
        let fx = fixture();
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-00.tar.gz",
            b"garbage",
            day(1),
        )
        .await;

        let mut confirm = AutoConfirm;
        let mut s = session(&fx.store, &mut confirm, &fx.work_dir);
        let err = run(&mut s, &fx.dest, "app").await.unwrap_err();
        assert!(matches!(err, FlowError::Snap(_)));
        assert!(
            fx.work_dir
                .join("app-snapshot-2020-01-01-12-00-00.tar.gz")
                .exists()
        );
    }

    #[tokio::test]
    async fn failed_listing_is_fatal_before_any_local_change() {
        let fx = fixture();
        let data = app_archive(&fx.scratch, "only", b"v1");
        seed(
            &fx.store,
            &fx.scratch,
            "app-snapshot-2020-01-01-12-00-00.tar.gz",
            &data,
            day(1),
        )
        .await;
        let current = fx.dest.join("app");
        std::fs::create_dir(&current).unwrap();
        std::fs::write(current.join("state.txt"), b"local").unwrap();
        let broken = BrokenListing(fx.store);

        let mut confirm = Scripted::default();
        let mut s = session(&broken, &mut confirm, &fx.work_dir);
        let err = run(&mut s, &fx.dest, "app").await.unwrap_err();
        match err {
            FlowError::Store(e) => assert_eq!(e.op(), StoreOp::List),
            other => panic!("unexpected error: {other}"),
        }

        assert!(confirm.asked.is_empty());
        assert_eq!(std::fs::read(current.join("state.txt")).unwrap(), b"local");
        assert!(snapshot_dirs(&fx.dest).is_empty());
        assert_eq!(std::fs::read_dir(&fx.work_dir).unwrap().count(), 0);
    }
}
