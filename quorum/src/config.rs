use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dispatch::Dispatcher;
use crate::peers::PeerSet;
use crate::{write_quorum, PeerError, QuorumError, Resolved, Result};

/// A configuration document that can be compared with another one.
pub trait ConfigDocument: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human readable differences; empty iff both documents are
    /// semantically the same.
    fn diff(&self, other: &Self) -> Vec<String>;

    fn same_as(&self, other: &Self) -> bool {
        self.diff(other).is_empty()
    }
}

/// What to do with a peer whose config payload cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Fail the whole round with the decode error.
    #[default]
    AbortRound,
    /// Drop that peer's vote, as if its fetch had failed.
    ExcludeVote,
}

/// Picks the document held by a strict majority (`N/2 + 1`) of the slots.
///
/// `None` slots are peers that did not vote. Equal documents are grouped
/// under the lowest index they occur at, e.g. `[c1, c2, c1, c1]` counts as
/// `[3, 1, 0, 0]`. Ties between groups go to the lower index.
pub fn select_majority<D: ConfigDocument>(docs: Vec<Option<D>>) -> Result<Resolved<D>> {
    let required = write_quorum(docs.len());
    let counts = group_counts(&docs);

    let mut winner = None;
    let mut agreed = 0;
    for (i, count) in counts.iter().enumerate() {
        if *count > agreed {
            agreed = *count;
            winner = Some(i);
        }
    }

    if agreed < required {
        return Err(QuorumError::WriteQuorumUnavailable { required, agreed });
    }

    docs.into_iter()
        .nth(winner.unwrap_or_default())
        .flatten()
        .map(|value| Resolved { value, count: agreed })
        .ok_or(QuorumError::WriteQuorumUnavailable { required, agreed: 0 })
}

// Invariants at the start of iteration i:
// - non-zero entries of counts[..i] are exactly the distinct documents seen;
// - the sum of counts[..i] is the number of voting slots seen.
fn group_counts<D: ConfigDocument>(docs: &[Option<D>]) -> Vec<usize> {
    let mut counts = vec![0usize; docs.len()];

    for (i, doc) in docs.iter().enumerate() {
        let Some(doc) = doc else { continue };

        let representative = docs[..i].iter().enumerate().find_map(|(j, other)| match other {
            Some(other) if counts[j] > 0 && doc.same_as(other) => Some(j),
            _ => None,
        });

        match representative {
            Some(j) => counts[j] += 1,
            None => counts[i] = 1,
        }
    }

    counts
}

/// Decodes fetched payloads into voting slots, index-aligned with `peers`.
fn decode_votes<D: ConfigDocument>(
    peers: &PeerSet,
    fetched: Vec<std::result::Result<Vec<u8>, PeerError>>,
    policy: DecodePolicy,
) -> Result<Vec<Option<D>>> {
    let mut votes = Vec::with_capacity(fetched.len());

    for (peer, payload) in peers.iter().zip(fetched) {
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    peer = %peer.address(),
                    error = %e,
                    "config fetch failed, peer excluded from vote"
                );
                votes.push(None);
                continue;
            }
        };

        match serde_json::from_slice::<D>(&payload) {
            Ok(doc) => votes.push(Some(doc)),
            Err(source) => {
                tracing::error!(peer = %peer.address(), error = %source, "undecodable config");
                match policy {
                    DecodePolicy::AbortRound => {
                        return Err(QuorumError::Decode {
                            peer: peer.address().to_string(),
                            source,
                        })
                    }
                    DecodePolicy::ExcludeVote => votes.push(None),
                }
            }
        }
    }

    Ok(votes)
}

/// Fetches every peer's config and returns the majority document.
///
/// A single-node deployment skips voting and returns its own document.
pub async fn resolve_config<D: ConfigDocument>(
    peers: &PeerSet,
    dispatcher: &Dispatcher,
    policy: DecodePolicy,
) -> Result<Resolved<D>> {
    if !peers.is_distributed() {
        let local = peers.local();
        let payload = local.get_config().await.map_err(|source| QuorumError::Peer {
            peer: local.address().to_string(),
            source,
        })?;
        let value = serde_json::from_slice(&payload).map_err(|source| QuorumError::Decode {
            peer: local.address().to_string(),
            source,
        })?;
        return Ok(Resolved { value, count: 1 });
    }

    let fetched = dispatcher
        .fan_out(peers, |peer| async move { peer.get_config().await })
        .await;

    let votes = decode_votes::<D>(peers, fetched, policy)?;
    let resolved = select_majority(votes);
    if let Err(e) = &resolved {
        tracing::error!(peers = peers.len(), error = %e, "no authoritative config");
    }
    resolved
}

/// Same as [`resolve_config`], re-encoded to the payload form. A single
/// node hands its payload back untouched.
pub async fn resolve_config_payload<D: ConfigDocument>(
    peers: &PeerSet,
    dispatcher: &Dispatcher,
    policy: DecodePolicy,
) -> Result<Resolved<Vec<u8>>> {
    if !peers.is_distributed() {
        let local = peers.local();
        let value = local.get_config().await.map_err(|source| QuorumError::Peer {
            peer: local.address().to_string(),
            source,
        })?;
        return Ok(Resolved { value, count: 1 });
    }

    let resolved = resolve_config::<D>(peers, dispatcher, policy).await?;
    Ok(Resolved {
        value: serde_json::to_vec(&resolved.value)?,
        count: resolved.count,
    })
}
