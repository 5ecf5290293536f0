//! HTTP surface of a node: the peer admin RPC endpoint other nodes call,
//! and the operator admin API that fans commands out to the cluster.

mod admin;
mod auth;
mod error;
mod rpc;
mod server;

pub use error::{ApiError, ApiResult};
pub use server::Server;

use network::SecurityContext;
use quorum::{ClusterAdmin, PeerInvoker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use storage::ServerConfig;

/// Shared by every handler.
pub struct AppState {
    /// This node's own admin capabilities, served to peers.
    pub local: Arc<dyn PeerInvoker>,
    pub cluster: Arc<ClusterAdmin<ServerConfig>>,
    pub security: SecurityContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeResponse {
    pub uptime_seconds: u64,
}

impl From<Duration> for UptimeResponse {
    fn from(uptime: Duration) -> Self {
        Self {
            uptime_seconds: uptime.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub peers: usize,
}
