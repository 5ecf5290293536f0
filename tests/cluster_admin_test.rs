//! Three in-process nodes talking admin RPC over real HTTP.

use anyhow::{bail, Context};
use o3admin::api::UptimeResponse;
use o3admin::network::{auth_token, ErrorReply};
use o3admin::quorum::{ConfigUpdate, PeerOutcome, PeerStatus};
use o3admin::storage::ServerConfig;
use o3admin::system::ServiceAction;
use o3admin::{Config, Node};
use reqwest::StatusCode;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const ACCESS_KEY: &str = "admin";
const SECRET_KEY: &str = "password123";

struct TestCluster {
    nodes: Vec<TestNode>,
    client: reqwest::Client,
    token: String,
}

struct TestNode {
    address: String,
    dir: TempDir,
    task: JoinHandle<o3admin::Result<Option<ServiceAction>>>,
}

impl TestCluster {
    async fn start(size: usize) -> anyhow::Result<Self> {
        let mut listeners = Vec::new();
        for _ in 0..size {
            listeners.push(TcpListener::bind("127.0.0.1:0").await?);
        }
        let endpoints = listeners
            .iter()
            .map(|l| l.local_addr().map(|a| a.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut nodes = Vec::new();
        for (listener, address) in listeners.into_iter().zip(&endpoints) {
            let dir = TempDir::new()?;
            let mut config = Config::new(address.clone(), endpoints.clone());
            config.advertise = Some(address.clone());
            config.config_dir = dir.path().join("config");
            config.data_dir = dir.path().join("data");
            config.access_key = ACCESS_KEY.to_string();
            config.secret_key = SECRET_KEY.to_string();
            config.call_timeout_ms = 5_000;

            let node = Node::new(config).await?;
            nodes.push(TestNode {
                address: address.clone(),
                dir,
                task: tokio::spawn(node.serve(listener)),
            });
        }

        let cluster = Self {
            nodes,
            client: reqwest::Client::new(),
            token: format!("Bearer {}", auth_token(ACCESS_KEY, SECRET_KEY)),
        };
        cluster.wait_until_healthy().await?;
        Ok(cluster)
    }

    async fn wait_until_healthy(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            let mut healthy = true;
            for node in &self.nodes {
                let url = format!("http://{}/health", node.address);
                if self.client.get(&url).send().await.is_err() {
                    healthy = false;
                }
            }
            if healthy {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        bail!("cluster did not become healthy")
    }

    fn url(&self, node: usize, path: &str) -> String {
        format!("http://{}/admin/v1{}", self.nodes[node].address, path)
    }

    async fn get(&self, node: usize, path: &str) -> anyhow::Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(node, path))
            .header("authorization", &self.token)
            .send()
            .await?)
    }

    async fn put_config(
        &self,
        node: usize,
        config: &ServerConfig,
    ) -> anyhow::Result<reqwest::Response> {
        Ok(self
            .client
            .put(self.url(node, "/config"))
            .header("authorization", &self.token)
            .json(config)
            .send()
            .await?)
    }

    async fn post(&self, node: usize, path: &str) -> anyhow::Result<reqwest::Response> {
        Ok(self
            .client
            .post(self.url(node, path))
            .header("authorization", &self.token)
            .send()
            .await?)
    }

    fn config_path(&self, node: usize) -> std::path::PathBuf {
        self.nodes[node].dir.path().join("config").join("config.json")
    }

    async fn active_config(&self, node: usize) -> anyhow::Result<ServerConfig> {
        let payload = tokio::fs::read(self.config_path(node)).await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    fn kill(&mut self, node: usize) {
        self.nodes[node].task.abort();
    }

    fn shutdown(self) {
        for node in self.nodes {
            node.task.abort();
        }
    }
}

#[tokio::test]
async fn test_config_read_agrees_across_nodes() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    let response = cluster.get(0, "/config").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-config-agreement"], "3");
    let config: ServerConfig = response.json().await?;
    assert_eq!(config.credential.access_key, ACCESS_KEY);

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_set_config_reaches_every_node() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    let mut next = ServerConfig::new(ACCESS_KEY, SECRET_KEY);
    next.region = "eu-west-1".to_string();
    let response = cluster.put_config(1, &next).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let update: ConfigUpdate = response.json().await?;
    assert!(update.is_complete(), "update not complete: {:?}", update);
    assert!(update.staging_name.starts_with("config.json."));

    for node in 0..3 {
        assert_eq!(cluster.active_config(node).await?.region, "eu-west-1");
    }

    let config: ServerConfig = cluster.get(2, "/config").await?.json().await?;
    assert_eq!(config.region, "eu-west-1");

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_diverged_configs_have_no_majority() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    for (node, region) in [(1, "eu-west-1"), (2, "ap-south-1")] {
        let mut config = cluster.active_config(node).await?;
        config.region = region.to_string();
        tokio::fs::write(cluster.config_path(node), serde_json::to_vec(&config)?).await?;
    }

    let response = cluster.get(0, "/config").await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let reply: ErrorReply = response.json().await?;
    assert_eq!(reply.code, ErrorReply::QUORUM_UNAVAILABLE);

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_one_node_down() -> anyhow::Result<()> {
    let mut cluster = TestCluster::start(3).await?;
    cluster.kill(2);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = cluster.get(0, "/config").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-config-agreement"], "2");

    let uptime = cluster.get(0, "/uptime").await?;
    assert_eq!(uptime.status(), StatusCode::OK);
    let _: UptimeResponse = uptime.json().await?;

    let statuses: Vec<PeerStatus> = cluster.get(0, "/info").await?.json().await?;
    assert_eq!(statuses.len(), 3);
    assert!(statuses[0].info.is_some());
    let down = statuses
        .iter()
        .find(|s| s.address == cluster.nodes[2].address)
        .context("missing status of stopped node")?;
    assert!(down.error.is_some());

    let mut next = ServerConfig::new(ACCESS_KEY, SECRET_KEY);
    next.region = "eu-west-1".to_string();
    let update: ConfigUpdate = cluster.put_config(0, &next).await?.json().await?;
    let activated = update.activated.context("update was not activated")?;
    assert_eq!(activated.iter().filter(|o| o.is_ok()).count(), 2);
    assert!(!update.staged.iter().all(PeerOutcome::is_ok));
    assert_eq!(cluster.active_config(1).await?.region, "eu-west-1");
    assert_eq!(cluster.active_config(2).await?.region, "us-east-1");

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_status_signal_rejected() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    let response = cluster.post(0, "/service?signal=status").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply: ErrorReply = response.json().await?;
    assert_eq!(reply.code, ErrorReply::UNSUPPORTED_SIGNAL);

    let response = cluster.post(0, "/service?signal=reboot").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_reinit_format_dry_run() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    let response = cluster.post(1, "/format/reinit?dry_run=true").await?;
    let outcomes: Vec<PeerOutcome> = response.json().await?;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(PeerOutcome::is_ok));

    cluster.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_stop_signal_stops_every_node() -> anyhow::Result<()> {
    let cluster = TestCluster::start(3).await?;

    let response = cluster.post(0, "/service?signal=stop").await?;
    assert_eq!(response.status(), StatusCode::OK);
    let outcomes: Vec<PeerOutcome> = response.json().await?;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(PeerOutcome::is_ok), "{:?}", outcomes);

    for node in cluster.nodes {
        let action = tokio::time::timeout(Duration::from_secs(10), node.task).await???;
        assert_eq!(action, Some(ServiceAction::Stop));
    }
    Ok(())
}

#[tokio::test]
async fn test_wrong_credentials_rejected() -> anyhow::Result<()> {
    let cluster = TestCluster::start(1).await?;

    let response = cluster
        .client
        .get(cluster.url(0, "/info"))
        .header("authorization", format!("Bearer {}", auth_token(ACCESS_KEY, "not-the-secret")))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    cluster.shutdown();
    Ok(())
}
