use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}")]
    ConfigNotFound(String),

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    // Archive
    #[error("Source folder not found: {0}")]
    SourceNotFound(String),

    #[error("Archive error for {path}: {source}")]
    Archive {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SnapError>;
