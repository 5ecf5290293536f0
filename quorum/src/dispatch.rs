use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

use crate::peer::PeerHandle;
use crate::peers::PeerSet;
use crate::PeerError;

/// Concurrent fan-out of one operation to every peer of a [`PeerSet`].
///
/// Each peer gets its own task; results come back index-aligned with the
/// peer set once every task has finished. A failing or panicking peer only
/// affects its own slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    call_timeout: Option<Duration>,
}

impl Dispatcher {
    /// Waits on every peer for as long as it takes.
    pub fn new() -> Self {
        Self { call_timeout: None }
    }

    /// Bounds each per-peer invocation; a late peer reports
    /// [`PeerError::Timeout`] for its slot only.
    pub fn with_call_timeout(timeout: Duration) -> Self {
        Self {
            call_timeout: Some(timeout),
        }
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    pub async fn fan_out<T, F, Fut>(&self, peers: &PeerSet, op: F) -> Vec<Result<T, PeerError>>
    where
        F: Fn(Arc<PeerHandle>) -> Fut,
        Fut: Future<Output = Result<T, PeerError>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = peers.iter().map(|peer| self.spawn(peer, &op)).collect();
        Self::join(handles).await
    }

    /// Like [`fan_out`](Self::fan_out), but the local peer is only invoked
    /// once every remote peer has returned.
    pub async fn fan_out_local_last<T, F, Fut>(
        &self,
        peers: &PeerSet,
        op: F,
    ) -> Vec<Result<T, PeerError>>
    where
        F: Fn(Arc<PeerHandle>) -> Fut,
        Fut: Future<Output = Result<T, PeerError>> + Send + 'static,
        T: Send + 'static,
    {
        let handles: Vec<_> = peers
            .remotes()
            .iter()
            .map(|peer| self.spawn(peer, &op))
            .collect();
        let remote_results = Self::join(handles).await;

        let local_result = flatten(self.spawn(peers.local(), &op).await);

        let mut results = Vec::with_capacity(peers.len());
        results.push(local_result);
        results.extend(remote_results);
        results
    }

    fn spawn<T, F, Fut>(&self, peer: &Arc<PeerHandle>, op: &F) -> JoinHandle<Result<T, PeerError>>
    where
        F: Fn(Arc<PeerHandle>) -> Fut,
        Fut: Future<Output = Result<T, PeerError>> + Send + 'static,
        T: Send + 'static,
    {
        let address = peer.address().to_string();
        tokio::spawn(bounded(self.call_timeout, address, op(peer.clone())))
    }

    async fn join<T>(handles: Vec<JoinHandle<Result<T, PeerError>>>) -> Vec<Result<T, PeerError>> {
        join_all(handles).await.into_iter().map(flatten).collect()
    }
}

fn flatten<T>(joined: Result<Result<T, PeerError>, JoinError>) -> Result<T, PeerError> {
    joined.unwrap_or_else(|e| Err(PeerError::TaskFailed(e.to_string())))
}

async fn bounded<T, Fut>(
    timeout: Option<Duration>,
    address: String,
    fut: Fut,
) -> Result<T, PeerError>
where
    Fut: Future<Output = Result<T, PeerError>>,
{
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(PeerError::Timeout(format!(
                "{} did not answer within {}ms",
                address,
                limit.as_millis()
            ))),
        },
        None => fut.await,
    };

    if let Err(e) = &result {
        tracing::debug!(peer = %address, error = %e, "admin call failed");
    }
    result
}
