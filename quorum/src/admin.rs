use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{resolve_config, resolve_config_payload, ConfigDocument, DecodePolicy};
use crate::dispatch::Dispatcher;
use crate::peer::{ServerInfo, ServiceSignal};
use crate::peers::PeerSet;
use crate::update::{activate_config, stage_config};
use crate::uptime::resolve_uptime;
use crate::{PeerError, QuorumError, Resolved, Result};

/// Outcome of a write-style command on one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerOutcome {
    pub address: String,
    pub error: Option<String>,
}

impl PeerOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn collect(peers: &PeerSet, results: Vec<std::result::Result<(), PeerError>>) -> Vec<Self> {
        peers
            .iter()
            .zip(results)
            .map(|(peer, result)| PeerOutcome {
                address: peer.address().to_string(),
                error: result.err().map(|e| e.to_string()),
            })
            .collect()
    }
}

/// Status report of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    pub address: String,
    pub info: Option<ServerInfo>,
    pub error: Option<String>,
}

/// Per-node report of a two-phase config update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub staging_name: String,
    pub staged: Vec<PeerOutcome>,
    /// `None` when too few nodes staged the new config to go ahead.
    pub activated: Option<Vec<PeerOutcome>>,
}

impl ConfigUpdate {
    pub fn is_complete(&self) -> bool {
        self.activated
            .as_ref()
            .is_some_and(|outcomes| outcomes.iter().all(PeerOutcome::is_ok))
    }
}

/// Issues administrative commands against every node of the cluster.
pub struct ClusterAdmin<D> {
    peers: PeerSet,
    dispatcher: Dispatcher,
    decode_policy: DecodePolicy,
    _document: PhantomData<fn() -> D>,
}

impl<D: ConfigDocument> ClusterAdmin<D> {
    pub fn new(peers: PeerSet, dispatcher: Dispatcher) -> Self {
        Self {
            peers,
            dispatcher,
            decode_policy: DecodePolicy::default(),
            _document: PhantomData,
        }
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    /// Restarts or stops every node; this node goes last.
    pub async fn signal_service(&self, signal: ServiceSignal) -> Result<Vec<PeerOutcome>> {
        let signal = signal.dispatchable()?;
        tracing::info!(%signal, peers = self.peers.len(), "sending service signal to cluster");

        let results = self
            .dispatcher
            .fan_out_local_last(&self.peers, move |peer| async move {
                peer.signal_service(signal).await.map_err(|e| match e {
                    QuorumError::Peer { source, .. } => source,
                    other => PeerError::Operation(other.to_string()),
                })
            })
            .await;

        Ok(PeerOutcome::collect(&self.peers, results))
    }

    /// Re-initializes the storage format on remote nodes. The local node
    /// is left alone here and always reports success.
    pub async fn reinit_format(&self, dry_run: bool) -> Vec<PeerOutcome> {
        let results = self
            .dispatcher
            .fan_out(&self.peers, move |peer| async move {
                if peer.is_local() {
                    return Ok(());
                }
                peer.reinit_format(dry_run).await
            })
            .await;

        let outcomes = PeerOutcome::collect(&self.peers, results);
        for outcome in outcomes.iter().filter(|o| !o.is_ok()) {
            tracing::warn!(
                peer = %outcome.address,
                error = ?outcome.error,
                dry_run,
                "format reinit failed"
            );
        }
        outcomes
    }

    pub async fn server_info(&self) -> Vec<PeerStatus> {
        let results = self
            .dispatcher
            .fan_out(&self.peers, |peer| async move { peer.server_info().await })
            .await;

        self.peers
            .iter()
            .zip(results)
            .map(|(peer, result)| match result {
                Ok(info) => PeerStatus {
                    address: peer.address().to_string(),
                    info: Some(info),
                    error: None,
                },
                Err(e) => PeerStatus {
                    address: peer.address().to_string(),
                    info: None,
                    error: Some(e.to_string()),
                },
            })
            .collect()
    }

    pub async fn uptime(&self) -> Result<Duration> {
        resolve_uptime(&self.peers, &self.dispatcher).await
    }

    pub async fn get_config(&self) -> Result<Resolved<Vec<u8>>> {
        resolve_config_payload::<D>(&self.peers, &self.dispatcher, self.decode_policy).await
    }

    pub async fn get_config_document(&self) -> Result<Resolved<D>> {
        resolve_config(&self.peers, &self.dispatcher, self.decode_policy).await
    }

    /// Stages `doc` on every node and activates it once at least a write
    /// quorum of nodes staged it.
    pub async fn set_config(&self, doc: &D) -> Result<ConfigUpdate> {
        let payload = Bytes::from(serde_json::to_vec(doc)?);
        let staging_name = format!("config.json.{}", Uuid::new_v4());

        let staged = stage_config(&self.peers, &self.dispatcher, &staging_name, payload).await;
        let staged = PeerOutcome::collect(&self.peers, staged);

        let required = self.peers.write_quorum();
        let succeeded = staged.iter().filter(|o| o.is_ok()).count();
        if succeeded < required {
            tracing::warn!(
                staging = %staging_name,
                required,
                succeeded,
                "config staged on too few nodes, not activating"
            );
            return Ok(ConfigUpdate {
                staging_name,
                staged,
                activated: None,
            });
        }

        let activated = activate_config(&self.peers, &self.dispatcher, &staging_name).await;
        let activated = PeerOutcome::collect(&self.peers, activated);
        tracing::info!(
            staging = %staging_name,
            activated = activated.iter().filter(|o| o.is_ok()).count(),
            peers = self.peers.len(),
            "config update finished"
        );

        Ok(ConfigUpdate {
            staging_name,
            staged,
            activated: Some(activated),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPeer;
    use crate::PeerHandle;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        version: u32,
    }

    impl ConfigDocument for Doc {
        fn diff(&self, other: &Self) -> Vec<String> {
            if self.version == other.version {
                Vec::new()
            } else {
                vec![format!("version {} != {}", self.version, other.version)]
            }
        }
    }

    fn admin(mocks: &[Arc<MockPeer>]) -> ClusterAdmin<Doc> {
        let local = PeerHandle::local("n0", mocks[0].clone());
        let remotes = mocks[1..]
            .iter()
            .enumerate()
            .map(|(i, m)| PeerHandle::remote(format!("n{}", i + 1), m.clone()))
            .collect();
        ClusterAdmin::new(PeerSet::new(local, remotes).unwrap(), Dispatcher::new())
    }

    #[tokio::test]
    async fn test_unsupported_signal_never_dispatched() {
        let mocks = vec![MockPeer::new().arc(), MockPeer::new().arc(), MockPeer::new().arc()];
        let admin = admin(&mocks);

        let err = admin.signal_service(ServiceSignal::Status).await.unwrap_err();
        assert!(matches!(err, QuorumError::UnsupportedSignal(_)));
        assert!(mocks.iter().all(|m| m.signals().is_empty()));
    }

    #[tokio::test]
    async fn test_signal_reports_failed_nodes() {
        let mocks = vec![
            MockPeer::new().arc(),
            MockPeer::new().failing(PeerError::Unreachable("down".into())).arc(),
            MockPeer::new().arc(),
        ];
        let outcomes = admin(&mocks).signal_service(ServiceSignal::Stop).await.unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].address, "n1");
        assert!(!outcomes[1].is_ok());
        assert!(outcomes[2].is_ok());
        assert_eq!(mocks[0].signals(), vec![ServiceSignal::Stop]);
    }

    #[tokio::test]
    async fn test_reinit_format_skips_local() {
        let mocks = vec![MockPeer::new().arc(), MockPeer::new().arc(), MockPeer::new().arc()];
        let outcomes = admin(&mocks).reinit_format(true).await;

        assert!(outcomes.iter().all(PeerOutcome::is_ok));
        assert!(mocks[0].reinits().is_empty());
        assert_eq!(mocks[1].reinits(), vec![true]);
        assert_eq!(mocks[2].reinits(), vec![true]);
    }

    #[tokio::test]
    async fn test_set_config_two_phase() {
        let old = serde_json::to_vec(&Doc { version: 1 }).unwrap();
        let mocks = vec![
            MockPeer::new().config(&old).arc(),
            MockPeer::new().config(&old).arc(),
            MockPeer::new().config(&old).arc(),
        ];
        let admin = admin(&mocks);

        let update = admin.set_config(&Doc { version: 2 }).await.unwrap();
        assert!(update.is_complete());
        assert!(update.staging_name.starts_with("config.json."));

        let resolved = admin.get_config_document().await.unwrap();
        assert_eq!(resolved.value, Doc { version: 2 });
        assert_eq!(resolved.count, 3);
    }

    #[tokio::test]
    async fn test_set_config_needs_staging_quorum() {
        let old = serde_json::to_vec(&Doc { version: 1 }).unwrap();
        let down = || PeerError::Unreachable("down".into());
        let mocks = vec![
            MockPeer::new().config(&old).arc(),
            MockPeer::new().failing(down()).arc(),
            MockPeer::new().failing(down()).arc(),
        ];

        let update = admin(&mocks).set_config(&Doc { version: 2 }).await.unwrap();
        assert!(update.activated.is_none());
        assert!(!update.is_complete());
        assert_eq!(update.staged.iter().filter(|o| o.is_ok()).count(), 1);
        assert_eq!(mocks[0].active(), old);
    }

    #[tokio::test]
    async fn test_server_info_reports_every_node() {
        let mocks = vec![
            MockPeer::new().uptime(3).arc(),
            MockPeer::new().failing(PeerError::Timeout("slow".into())).arc(),
        ];
        let statuses = admin(&mocks).server_info().await;

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].info.as_ref().map(|i| i.uptime), Some(Duration::from_secs(3)));
        assert!(statuses[1].info.is_none());
        assert!(statuses[1].error.is_some());
    }
}
