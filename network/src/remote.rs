use async_trait::async_trait;
use quorum::{PeerError, PeerInvoker, ServerInfo, ServiceSignal};

use crate::{
    ActivateConfigArgs, AdminMethod, ConfigReply, ErrorReply, NetworkError, ReinitFormatArgs,
    Result, RpcClient, SecurityContext, SignalServiceArgs, StageConfigArgs, VoidReply,
};

/// Admin capabilities of a node reached over RPC.
#[derive(Debug, Clone)]
pub struct RemoteAdmin {
    client: RpcClient,
}

impl RemoteAdmin {
    pub fn new(client: RpcClient) -> Self {
        Self { client }
    }

    pub fn connect(host: &str, security: &SecurityContext) -> Result<Self> {
        Ok(Self::new(RpcClient::new(host, security)?))
    }
}

#[async_trait]
impl PeerInvoker for RemoteAdmin {
    async fn signal_service(&self, signal: ServiceSignal) -> std::result::Result<(), PeerError> {
        let _: VoidReply = self
            .client
            .call(AdminMethod::SignalService, &SignalServiceArgs { signal })
            .await?;
        Ok(())
    }

    async fn reinit_format(&self, dry_run: bool) -> std::result::Result<(), PeerError> {
        let _: VoidReply = self
            .client
            .call(AdminMethod::ReinitFormat, &ReinitFormatArgs { dry_run })
            .await?;
        Ok(())
    }

    async fn server_info(&self) -> std::result::Result<ServerInfo, PeerError> {
        Ok(self.client.call(AdminMethod::ServerInfo, &VoidReply {}).await?)
    }

    async fn get_config(&self) -> std::result::Result<Vec<u8>, PeerError> {
        let reply: ConfigReply = self.client.call(AdminMethod::GetConfig, &VoidReply {}).await?;
        Ok(reply.payload)
    }

    async fn stage_config(
        &self,
        staging_name: &str,
        payload: &[u8],
    ) -> std::result::Result<(), PeerError> {
        let args = StageConfigArgs {
            staging_name: staging_name.to_string(),
            payload: payload.to_vec(),
        };
        let _: VoidReply = self.client.call(AdminMethod::StageConfig, &args).await?;
        Ok(())
    }

    async fn activate_config(&self, staging_name: &str) -> std::result::Result<(), PeerError> {
        let args = ActivateConfigArgs {
            staging_name: staging_name.to_string(),
        };
        let _: VoidReply = self.client.call(AdminMethod::ActivateConfig, &args).await?;
        Ok(())
    }
}

impl From<NetworkError> for PeerError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::Io(e) => PeerError::Unreachable(e.to_string()),
            NetworkError::ConnectionFailed(msg) => PeerError::Unreachable(msg),
            NetworkError::Timeout(msg) => PeerError::Timeout(msg),
            NetworkError::Authentication(msg) => PeerError::Authentication(msg),
            NetworkError::Protocol(msg) | NetworkError::InvalidHost(msg) => {
                PeerError::ProtocolMismatch(msg)
            }
            NetworkError::Serialization(e) => PeerError::ProtocolMismatch(e.to_string()),
            NetworkError::Remote { code, message } if code == ErrorReply::STAGING_NOT_FOUND => {
                PeerError::StagingNotFound(message)
            }
            NetworkError::Remote { code, message } => {
                PeerError::Operation(format!("{}: {}", code, message))
            }
        }
    }
}
