mod config;
mod format;
mod store;

pub use config::{Credential, ServerConfig, StorageClass};
pub use format::{FormatInfo, FormatStore};
pub use store::ConfigStore;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config not found: {0}")]
    ConfigNotFound(String),

    #[error("Staged config not found: {0}")]
    StagingNotFound(String),

    #[error("Invalid staging name: {0}")]
    InvalidStagingName(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Format not found: {0}")]
    FormatNotFound(String),

    #[error("Corrupted format: {0}")]
    Corruption(String),
}
