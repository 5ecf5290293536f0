use network::{SecurityContext, TlsSettings};
use quorum::{DecodePolicy, Dispatcher, Topology};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `host:port` this node listens on, as listed in `endpoints`.
    pub address: String,
    /// Every node of the deployment, this one included.
    pub endpoints: Vec<String>,
    /// Overrides the address announced to peers.
    pub advertise: Option<String>,
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub access_key: String,
    pub secret_key: String,
    /// Talk HTTPS to peers, trusting this CA bundle.
    pub tls_ca: Option<PathBuf>,
    /// Per-peer call budget; 0 disables it.
    pub call_timeout_ms: u64,
    pub decode_policy: DecodePolicy,
}

impl Config {
    pub fn new(address: impl Into<String>, endpoints: Vec<String>) -> Self {
        Self {
            address: address.into(),
            endpoints,
            advertise: None,
            config_dir: PathBuf::from("/var/lib/o3admin/config"),
            data_dir: PathBuf::from("/var/lib/o3admin/data"),
            access_key: "o3admin".to_string(),
            secret_key: "o3admin-secret".to_string(),
            tls_ca: None,
            call_timeout_ms: 30_000,
            decode_policy: DecodePolicy::default(),
        }
    }

    pub fn bind_address(&self) -> &str {
        &self.address
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_ms > 0).then(|| Duration::from_millis(self.call_timeout_ms))
    }
}

impl From<Config> for SecurityContext {
    fn from(config: Config) -> Self {
        let security = SecurityContext::new(config.access_key, config.secret_key);
        match config.tls_ca {
            Some(ca_file) => security.with_tls(TlsSettings { ca_file: Some(ca_file) }),
            None => security,
        }
    }
}

impl From<Config> for Topology {
    fn from(config: Config) -> Self {
        let topology = Topology::new(config.address, config.endpoints);
        match config.advertise {
            Some(advertise) => topology.with_advertise(advertise),
            None => topology,
        }
    }
}

impl From<&Config> for Dispatcher {
    fn from(config: &Config) -> Self {
        match config.call_timeout() {
            Some(timeout) => Dispatcher::with_call_timeout(timeout),
            None => Dispatcher::new(),
        }
    }
}
