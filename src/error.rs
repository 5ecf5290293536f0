use thiserror::Error;

#[derive(Error, Debug)]
pub enum O3AdminError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Quorum error: {0}")]
    Quorum(#[from] quorum::QuorumError),

    #[error("Network error: {0}")]
    Network(#[from] network::NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("API error: {0}")]
    Api(#[from] api::ApiError),

    #[error("System error: {0}")]
    System(#[from] system::SystemError),

    #[error("Task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, O3AdminError>;
