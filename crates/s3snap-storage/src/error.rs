use std::fmt;
use thiserror::Error;

/// Remote operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Upload,
    Download,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            StoreOp::List => "list",
            StoreOp::Upload => "upload",
            StoreOp::Download => "download",
            StoreOp::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// Uniform error for every store operation. Callers decide per call site
/// whether a given `op` is fatal.
#[derive(Debug, Error)]
#[error("failed to {op} {target}: {source}")]
pub struct StoreError {
    op: StoreOp,
    target: String,
    #[source]
    source: anyhow::Error,
}

impl StoreError {
    pub fn new(op: StoreOp, target: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            op,
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn list(bucket: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StoreOp::List, format!("bucket {bucket}"), source)
    }

    pub fn upload(bucket: &str, key: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StoreOp::Upload, format!("{bucket}/{key}"), source)
    }

    pub fn download(bucket: &str, key: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StoreOp::Download, format!("{bucket}/{key}"), source)
    }

    pub fn delete(bucket: &str, key: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::new(StoreOp::Delete, format!("{bucket}/{key}"), source)
    }

    pub fn op(&self) -> StoreOp {
        self.op
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_operation_and_target() {
        let err = StoreError::upload("backups", "a.tar.gz", anyhow::anyhow!("access denied"));
        assert_eq!(err.op(), StoreOp::Upload);
        assert_eq!(
            err.to_string(),
            "failed to upload backups/a.tar.gz: access denied"
        );
    }

    #[test]
    fn list_error_keeps_io_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = StoreError::list("backups", io);
        assert_eq!(err.op(), StoreOp::List);
        assert!(std::error::Error::source(&err).is_some());
    }
}
