use crate::config::Config;
use crate::error::{O3AdminError, Result};
use crate::local::LocalAdmin;
use network::{RemoteAdmin, SecurityContext};
use quorum::{ClusterAdmin, Dispatcher, PeerError, PeerInvoker, PeerSet, Topology};
use std::sync::Arc;
use storage::{ConfigStore, FormatStore, ServerConfig};
use system::{BootClock, ServiceAction, ServiceControl, SystemError};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

pub struct Node {
    config: Config,
    cluster: Arc<ClusterAdmin<ServerConfig>>,
    api_server: api::Server,
    actions: mpsc::UnboundedReceiver<ServiceAction>,
}

impl Node {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing admin node at {}", config.bind_address());

        let configs = Arc::new(ConfigStore::new(&config.config_dir).await?);
        configs
            .init(&ServerConfig::new(&config.access_key, &config.secret_key))
            .await?;
        let format = Arc::new(FormatStore::open(&config.data_dir).await?);

        let advertise = match &config.advertise {
            Some(advertise) => advertise.clone(),
            None => match system::advertise_address(&config.address) {
                Ok(advertise) => advertise,
                Err(SystemError::NoRoutableAddress) => {
                    warn!("No routable address found, advertising {}", config.address);
                    config.address.clone()
                }
                Err(e) => return Err(e.into()),
            },
        };

        let (control, actions) = ServiceControl::channel();
        let local: Arc<dyn PeerInvoker> = Arc::new(LocalAdmin::new(
            advertise.clone(),
            configs,
            format,
            BootClock::start(),
            control,
        ));

        let security = SecurityContext::from(config.clone());
        let topology = Topology::from(config.clone()).with_advertise(advertise);
        let peers = PeerSet::from_topology(&topology, local.clone(), |host| {
            let remote = RemoteAdmin::connect(host, &security).map_err(PeerError::from)?;
            Ok(Arc::new(remote) as Arc<dyn PeerInvoker>)
        })?;

        let cluster = Arc::new(
            ClusterAdmin::new(peers, Dispatcher::from(&config))
                .with_decode_policy(config.decode_policy),
        );
        let api_server = api::Server::new(local, cluster.clone(), security);

        Ok(Self {
            config,
            cluster,
            api_server,
            actions,
        })
    }

    pub fn cluster(&self) -> &Arc<ClusterAdmin<ServerConfig>> {
        &self.cluster
    }

    /// Binds the configured address and runs until stopped. A restart
    /// request replaces this process and does not return on success.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address()).await?;
        match self.serve(listener).await? {
            Some(ServiceAction::Restart) => Err(system::restart_process().into()),
            Some(ServiceAction::Stop) | None => {
                info!("Node stopped");
                Ok(())
            }
        }
    }

    /// Serves on `listener` until a service action or Ctrl-C arrives, then
    /// drains in-flight requests and reports the action.
    pub async fn serve(mut self, listener: TcpListener) -> Result<Option<ServiceAction>> {
        info!(
            "Starting admin node services ({} peers, distributed: {})",
            self.cluster.peers().len(),
            self.cluster.peers().is_distributed()
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = self.api_server;
        let mut api_task = tokio::spawn(async move {
            server
                .serve(listener, async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let action = tokio::select! {
            action = self.actions.recv() => action,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                Some(ServiceAction::Stop)
            }
            result = &mut api_task => {
                error!("API server stopped: {:?}", result);
                return match result {
                    Ok(result) => result.map(|_| None).map_err(O3AdminError::from),
                    Err(e) => Err(O3AdminError::TaskFailed(e.to_string())),
                };
            }
        };

        info!("Service action {:?} received, draining requests", action);
        let _ = shutdown_tx.send(());
        match api_task.await {
            Ok(result) => result?,
            Err(e) => error!("API server task failed: {}", e),
        }
        Ok(action)
    }
}
