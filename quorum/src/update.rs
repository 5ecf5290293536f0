use bytes::Bytes;
use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::peers::PeerSet;
use crate::PeerError;

/// Phase one of a config update: write `payload` under `staging_name` on
/// every peer. Partial failure does not stop the other peers.
pub async fn stage_config(
    peers: &PeerSet,
    dispatcher: &Dispatcher,
    staging_name: &str,
    payload: Bytes,
) -> Vec<Result<(), PeerError>> {
    if !peers.is_distributed() {
        return vec![peers.local().stage_config(staging_name, &payload).await];
    }

    let staging_name: Arc<str> = Arc::from(staging_name);
    dispatcher
        .fan_out(peers, |peer| {
            let staging_name = staging_name.clone();
            let payload = payload.clone();
            async move { peer.stage_config(&staging_name, &payload).await }
        })
        .await
}

/// Phase two: promote the staged payload on every peer. Nothing is rolled
/// back when some peers fail.
pub async fn activate_config(
    peers: &PeerSet,
    dispatcher: &Dispatcher,
    staging_name: &str,
) -> Vec<Result<(), PeerError>> {
    if !peers.is_distributed() {
        return vec![peers.local().activate_config(staging_name).await];
    }

    let staging_name: Arc<str> = Arc::from(staging_name);
    dispatcher
        .fan_out(peers, |peer| {
            let staging_name = staging_name.clone();
            async move { peer.activate_config(&staging_name).await }
        })
        .await
}
