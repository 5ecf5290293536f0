mod auth;
mod client;
mod messages;
mod remote;

pub use auth::{auth_token, verify_token};
pub use client::RpcClient;
pub use messages::{
    ActivateConfigArgs, AdminMethod, ConfigReply, ErrorReply, ReinitFormatArgs, SignalServiceArgs,
    StageConfigArgs, VoidReply,
};
pub use remote::RemoteAdmin;

use std::path::PathBuf;
use std::time::Duration;

/// Version of the peer admin RPC protocol; both ends must agree.
pub const RPC_VERSION: &str = "v1";
pub const RPC_VERSION_HEADER: &str = "x-admin-rpc-version";
pub const ADMIN_RPC_PATH: &str = "/rpc/admin/v1";

/// Credentials and transport settings shared by every node.
#[derive(Debug, Clone)]
pub struct SecurityContext {
    pub access_key: String,
    pub secret_key: String,
    pub tls: Option<TlsSettings>,
    pub connect_timeout: Duration,
}

impl SecurityContext {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            tls: None,
            connect_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn token(&self) -> String {
        auth_token(&self.access_key, &self.secret_key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TlsSettings {
    /// PEM bundle to trust in addition to the system roots.
    pub ca_file: Option<PathBuf>,
}

pub type Result<T> = std::result::Result<T, NetworkError>;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Remote error {code}: {message}")]
    Remote { code: String, message: String },
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout(err.to_string())
        } else if err.is_decode() {
            NetworkError::Protocol(err.to_string())
        } else {
            NetworkError::ConnectionFailed(err.to_string())
        }
    }
}
