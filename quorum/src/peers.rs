use std::sync::Arc;

use crate::peer::{PeerHandle, PeerInvoker};
use crate::{read_quorum, write_quorum, PeerError, QuorumError, Result};

/// Cluster membership as resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    /// `host:port` of this node as it appears in `endpoints`.
    pub local: String,
    /// Every node of the deployment, this one included, as `host:port`.
    pub endpoints: Vec<String>,
    /// Address remote nodes should use to reach this node, if it differs
    /// from `local` (e.g. `local` is a loopback address).
    pub advertise: Option<String>,
}

impl Topology {
    pub fn new(local: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            local: local.into(),
            endpoints,
            advertise: None,
        }
    }

    pub fn with_advertise(mut self, advertise: impl Into<String>) -> Self {
        self.advertise = Some(advertise.into());
        self
    }

    pub fn advertised_local(&self) -> &str {
        self.advertise.as_deref().unwrap_or(&self.local)
    }

    /// Endpoints naming neither the local nor the advertised address,
    /// de-duplicated, in input order.
    pub fn remote_peers(&self) -> Vec<String> {
        let mut remotes: Vec<String> = Vec::new();
        for endpoint in &self.endpoints {
            if self.is_self(endpoint) || remotes.contains(endpoint) {
                continue;
            }
            remotes.push(endpoint.clone());
        }
        remotes
    }

    pub fn is_distributed(&self) -> bool {
        !self.remote_peers().is_empty()
    }

    /// Whether this node appears in `endpoints` under either address.
    pub fn lists_local(&self) -> bool {
        self.endpoints.iter().any(|endpoint| self.is_self(endpoint))
    }

    fn is_self(&self, endpoint: &str) -> bool {
        endpoint == self.local || self.advertise.as_deref() == Some(endpoint)
    }
}

/// Ordered set of peers; index 0 is always the local node.
#[derive(Debug, Clone)]
pub struct PeerSet {
    peers: Vec<Arc<PeerHandle>>,
    distributed: bool,
}

impl PeerSet {
    pub fn new(local: PeerHandle, remotes: Vec<PeerHandle>) -> Result<Self> {
        if !local.is_local() {
            return Err(QuorumError::InvalidPeerSet(format!(
                "first peer {} is not local",
                local.address()
            )));
        }
        if let Some(peer) = remotes.iter().find(|peer| peer.is_local()) {
            return Err(QuorumError::InvalidPeerSet(format!(
                "more than one local peer: {}",
                peer.address()
            )));
        }

        let distributed = !remotes.is_empty();
        let mut peers = Vec::with_capacity(remotes.len() + 1);
        peers.push(Arc::new(local));
        peers.extend(remotes.into_iter().map(Arc::new));

        Ok(Self { peers, distributed })
    }

    /// A deployment with no other nodes.
    pub fn single(local: PeerHandle) -> Result<Self> {
        Self::new(local, Vec::new())
    }

    /// Builds the set from `topology`, calling `connect` once per remote
    /// endpoint. A remote that cannot be connected aborts construction.
    pub fn from_topology<F>(
        topology: &Topology,
        local_invoker: Arc<dyn PeerInvoker>,
        mut connect: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> std::result::Result<Arc<dyn PeerInvoker>, PeerError>,
    {
        if topology.is_distributed() && !topology.lists_local() {
            return Err(QuorumError::InvalidPeerSet(format!(
                "neither {} nor {} is listed among the endpoints",
                topology.local,
                topology.advertised_local()
            )));
        }

        let local = PeerHandle::local(topology.advertised_local(), local_invoker);

        let mut remotes = Vec::new();
        for address in topology.remote_peers() {
            let invoker = connect(&address).map_err(|source| QuorumError::Peer {
                peer: address.clone(),
                source,
            })?;
            tracing::debug!(peer = %address, "registered remote admin peer");
            remotes.push(PeerHandle::remote(address, invoker));
        }

        tracing::info!(
            local = %local.address(),
            remotes = remotes.len(),
            "admin peer set initialized"
        );
        Self::new(local, remotes)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Always false: the local peer is always present.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn is_distributed(&self) -> bool {
        self.distributed
    }

    pub fn local(&self) -> &Arc<PeerHandle> {
        &self.peers[0]
    }

    pub fn remotes(&self) -> &[Arc<PeerHandle>] {
        &self.peers[1..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PeerHandle>> {
        self.peers.iter()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.peers.iter().map(|peer| peer.address().to_string()).collect()
    }

    pub fn write_quorum(&self) -> usize {
        write_quorum(self.len())
    }

    pub fn read_quorum(&self) -> usize {
        read_quorum(self.len())
    }
}
