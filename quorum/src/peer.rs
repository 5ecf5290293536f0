use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{PeerError, QuorumError};

/// Service-level signal an operator can send to the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceSignal {
    Status,
    Restart,
    Stop,
}

impl ServiceSignal {
    /// Only restart and stop ever leave the issuing node.
    pub fn dispatchable(self) -> Result<Self, QuorumError> {
        match self {
            ServiceSignal::Restart | ServiceSignal::Stop => Ok(self),
            other => Err(QuorumError::UnsupportedSignal(other.to_string())),
        }
    }
}

impl fmt::Display for ServiceSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceSignal::Status => "status",
            ServiceSignal::Restart => "restart",
            ServiceSignal::Stop => "stop",
        };
        f.write_str(name)
    }
}

impl FromStr for ServiceSignal {
    type Err = QuorumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "status" => Ok(ServiceSignal::Status),
            "restart" => Ok(ServiceSignal::Restart),
            "stop" => Ok(ServiceSignal::Stop),
            _ => Err(QuorumError::UnsupportedSignal(s.to_string())),
        }
    }
}

/// Snapshot of a node as reported by its admin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub address: String,
    pub version: String,
    pub boot_time: DateTime<Utc>,
    pub uptime: Duration,
}

/// Administrative capabilities of one node.
///
/// Implemented once for the node this process runs on (direct calls) and
/// once for remote nodes (RPC). Each call either completes or fails as a
/// whole.
#[async_trait]
pub trait PeerInvoker: Send + Sync {
    async fn signal_service(&self, signal: ServiceSignal) -> Result<(), PeerError>;

    async fn reinit_format(&self, dry_run: bool) -> Result<(), PeerError>;

    async fn server_info(&self) -> Result<ServerInfo, PeerError>;

    /// Current configuration document in its encoded form.
    async fn get_config(&self) -> Result<Vec<u8>, PeerError>;

    /// Durably write `payload` under `staging_name` without touching the
    /// active configuration.
    async fn stage_config(&self, staging_name: &str, payload: &[u8]) -> Result<(), PeerError>;

    /// Promote a staged payload to the active configuration.
    async fn activate_config(&self, staging_name: &str) -> Result<(), PeerError>;
}

/// A cluster member as seen by the issuing node.
#[derive(Clone)]
pub struct PeerHandle {
    address: String,
    is_local: bool,
    invoker: Arc<dyn PeerInvoker>,
}

impl PeerHandle {
    pub fn local(address: impl Into<String>, invoker: Arc<dyn PeerInvoker>) -> Self {
        Self {
            address: address.into(),
            is_local: true,
            invoker,
        }
    }

    pub fn remote(address: impl Into<String>, invoker: Arc<dyn PeerInvoker>) -> Self {
        Self {
            address: address.into(),
            is_local: false,
            invoker,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Rejects anything but restart/stop before the invoker sees it.
    pub async fn signal_service(&self, signal: ServiceSignal) -> Result<(), QuorumError> {
        let signal = signal.dispatchable()?;
        self.invoker
            .signal_service(signal)
            .await
            .map_err(|source| QuorumError::Peer {
                peer: self.address.clone(),
                source,
            })
    }

    pub async fn reinit_format(&self, dry_run: bool) -> Result<(), PeerError> {
        self.invoker.reinit_format(dry_run).await
    }

    pub async fn server_info(&self) -> Result<ServerInfo, PeerError> {
        self.invoker.server_info().await
    }

    pub async fn get_config(&self) -> Result<Vec<u8>, PeerError> {
        self.invoker.get_config().await
    }

    pub async fn stage_config(&self, staging_name: &str, payload: &[u8]) -> Result<(), PeerError> {
        self.invoker.stage_config(staging_name, payload).await
    }

    pub async fn activate_config(&self, staging_name: &str) -> Result<(), PeerError> {
        self.invoker.activate_config(staging_name).await
    }
}

impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerHandle")
            .field("address", &self.address)
            .field("is_local", &self.is_local)
            .finish_non_exhaustive()
    }
}
