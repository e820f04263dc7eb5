use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use s3snap_core::types::RemoteObject;

use crate::error::{StoreError, StoreResult};
use crate::provider::ObjectStore;

/// Directory-backed object store: one file per key, file mtime as
/// last-modified. Stands in for a bucket in tests.
pub struct DirObjectStore {
    base_path: PathBuf,
    name: String,
}

impl DirObjectStore {
    pub fn new(base_path: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(base_path)?;
        let name = base_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| base_path.display().to_string());
        Ok(Self {
            base_path: base_path.to_path_buf(),
            name,
        })
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Pin an object's last-modified time.
    pub fn set_last_modified(&self, key: &str, at: DateTime<Utc>) -> std::io::Result<()> {
        let file = std::fs::File::options()
            .write(true)
            .open(self.object_path(key))?;
        file.set_modified(SystemTime::from(at))
    }
}

#[async_trait]
impl ObjectStore for DirObjectStore {
    async fn list_objects(&self) -> StoreResult<Vec<RemoteObject>> {
        let list_err = |e: std::io::Error| StoreError::list(&self.name, e);

        let mut objects = Vec::new();
        for entry in std::fs::read_dir(&self.base_path).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            let meta = entry.metadata().map_err(list_err)?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().map_err(list_err)?;
            objects.push(RemoteObject::new(
                entry.file_name().to_string_lossy(),
                DateTime::<Utc>::from(modified),
                meta.len(),
            ));
        }
        Ok(objects)
    }

    async fn upload(&self, local_file: &Path, key: &str) -> StoreResult<()> {
        std::fs::copy(local_file, self.object_path(key))
            .map_err(|e| StoreError::upload(&self.name, key, e))?;
        Ok(())
    }

    async fn download(&self, key: &str, local_file: &Path) -> StoreResult<()> {
        std::fs::copy(self.object_path(key), local_file)
            .map_err(|e| StoreError::download(&self.name, key, e))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        match std::fs::remove_file(self.object_path(key)) {
            Ok(()) => Ok(()),
            // Already gone counts as deleted, like S3.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::delete(&self.name, key, e)),
        }
    }

    fn bucket(&self) -> &str {
        &self.name
    }
}
