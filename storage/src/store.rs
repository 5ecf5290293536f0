use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::ServerConfig;
use crate::{Result, StorageError};

pub const CONFIG_FILE: &str = "config.json";

/// Node-local `config.json` plus staged candidates next to it.
///
/// A candidate is written under its staging name first and later renamed
/// over `config.json`, so readers only ever see a whole document.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub async fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Writes `default` unless a config already exists.
    pub async fn init(&self, default: &ServerConfig) -> Result<()> {
        if fs::try_exists(self.config_path()).await? {
            return Ok(());
        }
        let payload = serde_json::to_vec_pretty(default)?;
        let staging = format!("{}.init", CONFIG_FILE);
        self.write_staged(&staging, &payload).await?;
        self.commit(&staging).await?;
        tracing::info!("Initialized {:?}", self.config_path());
        Ok(())
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        let path = self.config_path();
        match fs::read(&path).await {
            Ok(payload) => Ok(payload),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::ConfigNotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn load(&self) -> Result<ServerConfig> {
        let payload = self.read().await?;
        Ok(serde_json::from_slice(&payload)?)
    }

    pub async fn write_staged(&self, staging_name: &str, payload: &[u8]) -> Result<()> {
        let path = self.staging_path(staging_name)?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(payload).await?;
        file.sync_all().await?;

        tracing::debug!("Staged {} bytes at {:?}", payload.len(), path);
        Ok(())
    }

    /// Atomically replaces `config.json` with the staged file.
    pub async fn commit(&self, staging_name: &str) -> Result<()> {
        let staged = self.staging_path(staging_name)?;
        if !fs::try_exists(&staged).await? {
            return Err(StorageError::StagingNotFound(staging_name.to_string()));
        }

        fs::rename(&staged, self.config_path()).await?;
        tracing::info!("Activated staged config {}", staging_name);
        Ok(())
    }

    fn staging_path(&self, staging_name: &str) -> Result<PathBuf> {
        let invalid = staging_name.is_empty()
            || staging_name == CONFIG_FILE
            || staging_name.starts_with('.')
            || staging_name.contains(['/', '\\']);
        if invalid {
            return Err(StorageError::InvalidStagingName(staging_name.to_string()));
        }
        Ok(self.dir.join(staging_name))
    }
}
