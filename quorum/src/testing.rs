//! In-memory peer used by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{PeerError, PeerInvoker, ServerInfo, ServiceSignal};

#[derive(Default)]
struct MockState {
    signals: Vec<ServiceSignal>,
    reinits: Vec<bool>,
    active: Vec<u8>,
    staged: HashMap<String, Vec<u8>>,
}

pub struct MockPeer {
    name: String,
    uptime: Duration,
    failure: Option<PeerError>,
    delay: Option<Duration>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
    state: Mutex<MockState>,
}

impl MockPeer {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            uptime: Duration::ZERO,
            failure: None,
            delay: None,
            journal: None,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn uptime(mut self, secs: u64) -> Self {
        self.uptime = Duration::from_secs(secs);
        self
    }

    pub fn config(self, payload: &[u8]) -> Self {
        self.state.lock().unwrap().active = payload.to_vec();
        self
    }

    pub fn failing(mut self, err: PeerError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared log of `name` entries, appended when a call completes.
    pub fn journal(mut self, journal: Arc<Mutex<Vec<String>>>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn signals(&self) -> Vec<ServiceSignal> {
        self.state.lock().unwrap().signals.clone()
    }

    pub fn reinits(&self) -> Vec<bool> {
        self.state.lock().unwrap().reinits.clone()
    }

    pub fn active(&self) -> Vec<u8> {
        self.state.lock().unwrap().active.clone()
    }

    pub fn staged(&self, name: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().staged.get(name).cloned()
    }

    async fn enter(&self) -> Result<(), PeerError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(journal) = &self.journal {
            journal.lock().unwrap().push(self.name.clone());
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PeerInvoker for MockPeer {
    async fn signal_service(&self, signal: ServiceSignal) -> Result<(), PeerError> {
        self.enter().await?;
        self.state.lock().unwrap().signals.push(signal);
        Ok(())
    }

    async fn reinit_format(&self, dry_run: bool) -> Result<(), PeerError> {
        self.enter().await?;
        self.state.lock().unwrap().reinits.push(dry_run);
        Ok(())
    }

    async fn server_info(&self) -> Result<ServerInfo, PeerError> {
        self.enter().await?;
        Ok(ServerInfo {
            address: self.name.clone(),
            version: "test".to_string(),
            boot_time: Utc::now(),
            uptime: self.uptime,
        })
    }

    async fn get_config(&self) -> Result<Vec<u8>, PeerError> {
        self.enter().await?;
        Ok(self.active())
    }

    async fn stage_config(&self, staging_name: &str, payload: &[u8]) -> Result<(), PeerError> {
        self.enter().await?;
        self.state
            .lock()
            .unwrap()
            .staged
            .insert(staging_name.to_string(), payload.to_vec());
        Ok(())
    }

    async fn activate_config(&self, staging_name: &str) -> Result<(), PeerError> {
        self.enter().await?;
        let mut state = self.state.lock().unwrap();
        let payload = state
            .staged
            .remove(staging_name)
            .ok_or_else(|| PeerError::StagingNotFound(staging_name.to_string()))?;
        state.active = payload;
        Ok(())
    }
}
