use s3snap_core::retention;
use s3snap_core::types::RemoteObject;

use super::{FlowResult, Outcome, Session};

pub async fn run(session: &mut Session<'_>) -> FlowResult {
    let objects = session.store.list_objects().await?;

    if objects.is_empty() {
        println!("No backups found in {}.", session.store.bucket());
        return Ok(Outcome::Completed);
    }

    let plan = retention::select_for_deletion(&objects, session.keep);

    println!("{:<50} {:<27} {:>10} {}", "KEY", "LAST MODIFIED", "SIZE", "RETAINED");
    println!("{}", "-".repeat(98));
    for obj in &plan.keep {
        print_row(obj, true);
    }
    for obj in &plan.delete {
        print_row(obj, false);
    }
    println!(
        "\n{} backups, {} beyond the keep count of {}",
        objects.len(),
        plan.delete.len(),
        session.keep
    );

    Ok(Outcome::Completed)
}

fn print_row(obj: &RemoteObject, retained: bool) {
    println!(
        "{:<50} {:<27} {:>10} {}",
        obj.key,
        obj.last_modified.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        format_bytes(obj.size),
        if retained { "yes" } else { "no" },
    );
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{Scripted, day, keys, seed};
    use s3snap_storage::local::DirObjectStore;
    use tempfile::TempDir;

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[tokio::test]
    async fn list_is_read_only_and_never_prompts() {
        let tmp = TempDir::new().unwrap();
        let store = DirObjectStore::new(&tmp.path().join("bucket")).unwrap();
        for d in 1..=5 {
            let key = format!("app-snapshot-2020-01-0{d}-12-00-00.tar.gz");
            seed(&store, tmp.path(), &key, b"x", day(d)).await;
        }

        let mut confirm = Scripted::default();
        let mut session = Session {
            store: &store,
            confirm: &mut confirm,
            work_dir: tmp.path().to_path_buf(),
            keep: 3,
        };
        assert_eq!(run(&mut session).await.unwrap(), Outcome::Completed);
        assert!(confirm.asked.is_empty());
        assert_eq!(keys(&store).await.len(), 5);
    }
}
