//! Custom error types for snapvault.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Corrupt metadata: {0}")]
    CorruptMetadata(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
