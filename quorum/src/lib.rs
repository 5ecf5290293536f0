//! Peer coordination and quorum resolution for cluster administration.
//!
//! Every administrative command is fanned out to all peers of a [`PeerSet`]
//! through a [`Dispatcher`]. Read-style answers are reduced to one value by
//! the quorum resolvers, write-style answers come back as one outcome per
//! peer.
//!
//! | Operation | Threshold |
//! |---|---|
//! | uptime | `N/2` valid samples |
//! | config | `N/2 + 1` agreeing documents |

mod admin;
mod config;
mod dispatch;
mod peer;
mod peers;
mod update;
mod uptime;

pub use admin::{ClusterAdmin, ConfigUpdate, PeerOutcome, PeerStatus};
pub use config::{
    resolve_config, resolve_config_payload, select_majority, ConfigDocument, DecodePolicy,
};
pub use dispatch::Dispatcher;
pub use peer::{PeerHandle, PeerInvoker, ServerInfo, ServiceSignal};
pub use peers::{PeerSet, Topology};
pub use update::{activate_config, stage_config};
pub use uptime::{resolve_uptime, select_uptime};

/// Strict majority of `n` peers.
pub fn write_quorum(n: usize) -> usize {
    n / 2 + 1
}

/// Half of `n` peers, rounded down.
pub fn read_quorum(n: usize) -> usize {
    n / 2
}

/// A value agreed on by `count` peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub count: usize,
}

pub type Result<T> = std::result::Result<T, QuorumError>;

/// Failure of a single peer invocation. Recorded per slot, never escalated
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    #[error("Peer unreachable: {0}")]
    Unreachable(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("Staged config not found: {0}")]
    StagingNotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Peer task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum QuorumError {
    #[error("Unsupported signal: {0}: only restart and stop signals are supported")]
    UnsupportedSignal(String),

    #[error("Insufficient read quorum: required {required}, available {available}")]
    InsufficientReadQuorum { required: usize, available: usize },

    #[error("Write quorum unavailable: required {required}, agreed {agreed}")]
    WriteQuorumUnavailable { required: usize, agreed: usize },

    #[error("Undecodable config from peer {peer}: {source}")]
    Decode {
        peer: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Peer {peer} failed: {source}")]
    Peer {
        peer: String,
        #[source]
        source: PeerError,
    },

    #[error("Invalid peer set: {0}")]
    InvalidPeerSet(String),
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_thresholds() {
        assert_eq!(write_quorum(1), 1);
        assert_eq!(write_quorum(4), 3);
        assert_eq!(write_quorum(5), 3);
        assert_eq!(read_quorum(4), 2);
        assert_eq!(read_quorum(5), 2);
        assert_eq!(read_quorum(1), 0);
    }
}
