use crate::error::{Result, SnapError};
use crate::retention::DEFAULT_KEEP;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_BUCKET: &str = "AWS_BUCKET_NAME";
pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";

/// Top-level configuration, optionally stored as TOML.
///
/// Built once at startup and handed to whatever needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

/// Where archives live and how to reach them.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services (e.g. `http://localhost:9000`).
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Force path-style addressing. Defaults to on when `endpoint_url` is set.
    #[serde(default)]
    pub path_style: Option<bool>,
    /// Explicit access key. If None, the SDK's default credential chain is used.
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_keep")]
    pub keep: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep: DEFAULT_KEEP,
        }
    }
}

fn default_keep() -> usize {
    DEFAULT_KEEP
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("path_style", &self.path_style)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl StoreConfig {
    /// Overlay values from environment lookups. Unset or empty variables keep
    /// the current value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(v) = get(ENV_BUCKET) {
            self.bucket = v;
        }
        if let Some(v) = get(ENV_ACCESS_KEY) {
            self.access_key = Some(v);
        }
        if let Some(v) = get(ENV_SECRET_KEY) {
            self.secret_key = Some(v);
        }
        if let Some(v) = get(ENV_REGION) {
            self.region = Some(v);
        }
        if let Some(v) = get(ENV_ENDPOINT_URL) {
            self.endpoint_url = Some(v);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(SnapError::Config(format!(
                "bucket name is not set (use --bucket or {ENV_BUCKET})"
            )));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(SnapError::Config(format!(
                "{ENV_ACCESS_KEY} and {ENV_SECRET_KEY} must be set together"
            )));
        }
        Ok(())
    }

    pub fn use_path_style(&self) -> bool {
        self.path_style.unwrap_or(self.endpoint_url.is_some())
    }
}

impl SnapConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SnapError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SnapError::TomlDe(e.to_string()))
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    /// Environment variables are applied on top.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::load(&p)?,
                _ => Self::default(),
            },
        };
        config.store.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retention.keep == 0 {
            return Err(SnapError::Config(
                "retention keep count must be at least 1".to_string(),
            ));
        }
        self.store.validate()
    }

    /// `~/.s3snap/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".s3snap").join("config.toml"))
    }
}
