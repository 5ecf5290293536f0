use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Result, StorageError};

pub const FORMAT_FILE: &str = "format.json";
pub const FORMAT_VERSION: &str = "1";

/// On-disk layout descriptor of a node's data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub version: String,
    pub format: String,
    pub deployment_id: Uuid,
}

impl FormatInfo {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            format: format.into(),
            deployment_id: Uuid::new_v4(),
        }
    }
}

pub struct FormatStore {
    path: PathBuf,
    current: RwLock<Option<FormatInfo>>,
}

impl FormatStore {
    /// Opens the data directory, writing a fresh `format.json` if none exists.
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await?;

        let store = Self {
            path: data_dir.join(FORMAT_FILE),
            current: RwLock::new(None),
        };

        if !fs::try_exists(&store.path).await? {
            let info = FormatInfo::new("xl");
            fs::write(&store.path, serde_json::to_vec_pretty(&info)?).await?;
            tracing::info!("Created {:?} for deployment {}", store.path, info.deployment_id);
        }

        store.reload(false).await?;
        Ok(store)
    }

    pub async fn current(&self) -> Option<FormatInfo> {
        self.current.read().await.clone()
    }

    /// Re-reads and validates `format.json`. A dry run leaves the cached
    /// format untouched.
    pub async fn reload(&self, dry_run: bool) -> Result<FormatInfo> {
        let payload = match fs::read(&self.path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::FormatNotFound(self.path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let info: FormatInfo = serde_json::from_slice(&payload)
            .map_err(|e| StorageError::Corruption(format!("{:?}: {}", self.path, e)))?;
        if info.version != FORMAT_VERSION {
            return Err(StorageError::Corruption(format!(
                "unsupported format version {}",
                info.version
            )));
        }

        if let Some(current) = self.current().await {
            if current.deployment_id != info.deployment_id {
                tracing::warn!(
                    "Deployment id changed from {} to {}",
                    current.deployment_id,
                    info.deployment_id
                );
            }
        }

        if !dry_run {
            *self.current.write().await = Some(info.clone());
        }
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_format() {
        let dir = TempDir::new().unwrap();
        let store = FormatStore::open(dir.path()).await.unwrap();

        let current = store.current().await.unwrap();
        assert_eq!(current.format, "xl");
        assert!(dir.path().join(FORMAT_FILE).exists());
    }

    #[tokio::test]
    async fn test_dry_run_keeps_cached_format() {
        let dir = TempDir::new().unwrap();
        let store = FormatStore::open(dir.path()).await.unwrap();
        let before = store.current().await.unwrap();

        let replacement = FormatInfo::new("xl");
        let encoded = serde_json::to_vec(&replacement).unwrap();
        std::fs::write(dir.path().join(FORMAT_FILE), encoded).unwrap();

        let seen = store.reload(true).await.unwrap();
        assert_eq!(seen, replacement);
        assert_eq!(store.current().await.unwrap(), before);

        store.reload(false).await.unwrap();
        assert_eq!(store.current().await.unwrap(), replacement);
    }

    #[tokio::test]
    async fn test_corrupted_format() {
        let dir = TempDir::new().unwrap();
        let store = FormatStore::open(dir.path()).await.unwrap();
        std::fs::write(dir.path().join(FORMAT_FILE), b"garbage").unwrap();

        assert!(matches!(store.reload(false).await, Err(StorageError::Corruption(_))));
    }
}
