use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::fmt;

/// Format used for snapshot folder names and archive filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

const ARCHIVE_INFIX: &str = "-snapshot-";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Local wall-clock time at one-second resolution, rendered `YYYY-MM-DD-HH-MM-SS`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::from(Local::now())
    }

    pub fn parse(s: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok().map(Self)
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<DateTime<Local>> for Timestamp {
    fn from(dt: DateTime<Local>) -> Self {
        Self(dt.naive_local())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Self(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}

/// Archive filename: `<folder_name>-snapshot-<timestamp>.tar.gz`.
///
/// Doubles as the remote object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub folder_name: String,
    pub timestamp: Timestamp,
}

impl ArchiveName {
    pub fn new(folder_name: &str, timestamp: Timestamp) -> Self {
        Self {
            folder_name: folder_name.to_string(),
            timestamp,
        }
    }

    /// Parse a key produced by this tool. Keys in any other shape return `None`.
    pub fn parse(key: &str) -> Option<Self> {
        let stem = key.strip_suffix(ARCHIVE_SUFFIX)?;
        let (folder_name, ts) = stem.rsplit_once(ARCHIVE_INFIX)?;
        if folder_name.is_empty() {
            return None;
        }
        Some(Self {
            folder_name: folder_name.to_string(),
            timestamp: Timestamp::parse(ts)?,
        })
    }

    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{ARCHIVE_INFIX}{}{ARCHIVE_SUFFIX}",
            self.folder_name, self.timestamp
        )
    }
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
    /// Size in bytes as reported by the store.
    pub size: u64,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>, size: u64) -> Self {
        Self {
            key: key.into(),
            last_modified,
            size,
        }
    }
}

impl fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.last_modified)
    }
}
