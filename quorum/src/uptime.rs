use std::time::Duration;

use crate::dispatch::Dispatcher;
use crate::peers::PeerSet;
use crate::{read_quorum, PeerError, QuorumError, Result};

/// Uptime since the cluster last (re-)established read quorum.
///
/// Valid samples are ordered ascending and the one at which the running
/// count of valid samples reaches `N/2` wins, `N` counting failed peers too.
pub fn select_uptime(samples: Vec<std::result::Result<Duration, PeerError>>) -> Result<Duration> {
    let required = read_quorum(samples.len());

    let mut valid: Vec<Duration> = samples.into_iter().filter_map(|s| s.ok()).collect();
    valid.sort_unstable();

    if valid.len() < required {
        return Err(QuorumError::InsufficientReadQuorum {
            required,
            available: valid.len(),
        });
    }

    Ok(match required {
        0 => valid.first().copied().unwrap_or_default(),
        n => valid[n - 1],
    })
}

/// Asks every peer for its uptime and reduces the answers with
/// [`select_uptime`]. A single-node deployment reports its own uptime.
pub async fn resolve_uptime(peers: &PeerSet, dispatcher: &Dispatcher) -> Result<Duration> {
    if !peers.is_distributed() {
        let local = peers.local();
        return local
            .server_info()
            .await
            .map(|info| info.uptime)
            .map_err(|source| QuorumError::Peer {
                peer: local.address().to_string(),
                source,
            });
    }

    let samples = dispatcher
        .fan_out(peers, |peer| async move {
            peer.server_info().await.map(|info| info.uptime)
        })
        .await;

    for (peer, sample) in peers.iter().zip(&samples) {
        if let Err(e) = sample {
            tracing::warn!(peer = %peer.address(), error = %e, "uptime unavailable");
        }
    }

    select_uptime(samples)
}
