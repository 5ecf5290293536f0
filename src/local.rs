use async_trait::async_trait;
use quorum::{PeerError, PeerInvoker, ServerInfo, ServiceSignal};
use std::sync::Arc;
use storage::{ConfigStore, FormatStore, StorageError};
use system::{BootClock, ServiceAction, ServiceControl};

/// Admin capabilities of the node this process runs, served directly.
pub struct LocalAdmin {
    address: String,
    configs: Arc<ConfigStore>,
    format: Arc<FormatStore>,
    clock: BootClock,
    control: ServiceControl,
}

impl LocalAdmin {
    pub fn new(
        address: impl Into<String>,
        configs: Arc<ConfigStore>,
        format: Arc<FormatStore>,
        clock: BootClock,
        control: ServiceControl,
    ) -> Self {
        Self {
            address: address.into(),
            configs,
            format,
            clock,
            control,
        }
    }
}

#[async_trait]
impl PeerInvoker for LocalAdmin {
    async fn signal_service(&self, signal: ServiceSignal) -> Result<(), PeerError> {
        let action = match signal {
            ServiceSignal::Restart => ServiceAction::Restart,
            ServiceSignal::Stop => ServiceAction::Stop,
            ServiceSignal::Status => {
                return Err(PeerError::Operation(format!("{} is not a service action", signal)))
            }
        };
        self.control
            .request(action)
            .map_err(|e| PeerError::Operation(e.to_string()))
    }

    async fn reinit_format(&self, dry_run: bool) -> Result<(), PeerError> {
        let info = self.format.reload(dry_run).await.map_err(peer_error)?;
        tracing::info!(
            "Format {} of deployment {} re-read (dry run: {})",
            info.format,
            info.deployment_id,
            dry_run
        );
        Ok(())
    }

    async fn server_info(&self) -> Result<ServerInfo, PeerError> {
        Ok(ServerInfo {
            address: self.address.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            boot_time: self.clock.boot_time(),
            uptime: self.clock.uptime(),
        })
    }

    async fn get_config(&self) -> Result<Vec<u8>, PeerError> {
        self.configs.read().await.map_err(peer_error)
    }

    async fn stage_config(&self, staging_name: &str, payload: &[u8]) -> Result<(), PeerError> {
        self.configs
            .write_staged(staging_name, payload)
            .await
            .map_err(peer_error)
    }

    async fn activate_config(&self, staging_name: &str) -> Result<(), PeerError> {
        self.configs.commit(staging_name).await.map_err(peer_error)
    }
}

fn peer_error(err: StorageError) -> PeerError {
    match err {
        StorageError::StagingNotFound(name) => PeerError::StagingNotFound(name),
        other => PeerError::Operation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::ServerConfig;
    use tempfile::TempDir;

    async fn setup(
        dir: &TempDir,
    ) -> (LocalAdmin, tokio::sync::mpsc::UnboundedReceiver<ServiceAction>) {
        let configs = Arc::new(ConfigStore::new(dir.path().join("config")).await.unwrap());
        configs.init(&ServerConfig::new("admin", "password123")).await.unwrap();
        let format = Arc::new(FormatStore::open(dir.path().join("data")).await.unwrap());
        let (control, actions) = ServiceControl::channel();
        let local = LocalAdmin::new("10.0.0.1:9000", configs, format, BootClock::start(), control);
        (local, actions)
    }

    #[tokio::test]
    async fn test_stage_and_activate() {
        let dir = TempDir::new().unwrap();
        let (local, _actions) = setup(&dir).await;

        let mut config = ServerConfig::new("admin", "password123");
        config.region = "eu-west-1".to_string();
        let payload = serde_json::to_vec(&config).unwrap();

        local.stage_config("config.json.abc", &payload).await.unwrap();
        let active = local.get_config().await.unwrap();
        let before: ServerConfig = serde_json::from_slice(&active).unwrap();
        assert_eq!(before.region, "us-east-1");

        local.activate_config("config.json.abc").await.unwrap();
        assert_eq!(local.get_config().await.unwrap(), payload);

        assert_eq!(
            local.activate_config("config.json.abc").await,
            Err(PeerError::StagingNotFound("config.json.abc".to_string()))
        );
    }

    #[tokio::test]
    async fn test_signals_reach_run_loop() {
        let dir = TempDir::new().unwrap();
        let (local, mut actions) = setup(&dir).await;

        local.signal_service(ServiceSignal::Restart).await.unwrap();
        assert_eq!(actions.recv().await, Some(ServiceAction::Restart));

        assert!(local.signal_service(ServiceSignal::Status).await.is_err());
    }

    #[tokio::test]
    async fn test_server_info_and_reinit() {
        let dir = TempDir::new().unwrap();
        let (local, _actions) = setup(&dir).await;

        let info = local.server_info().await.unwrap();
        assert_eq!(info.address, "10.0.0.1:9000");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));

        local.reinit_format(true).await.unwrap();
        local.reinit_format(false).await.unwrap();
    }
}
