use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use quorum::ConfigDocument;

use crate::{Result, StorageError};

pub const CONFIG_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClass {
    #[serde(default)]
    pub standard: String,
    #[serde(default)]
    pub rrs: String,
}

/// `config.json` of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub version: String,
    pub credential: Credential,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub browser: bool,
    #[serde(default)]
    pub worm: bool,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub storage_class: StorageClass,
    /// Notification targets keyed by target name; free-form per target.
    #[serde(default)]
    pub notify: BTreeMap<String, serde_json::Value>,
}

impl ServerConfig {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            credential: Credential {
                access_key: access_key.into(),
                secret_key: secret_key.into(),
            },
            region: "us-east-1".to_string(),
            browser: true,
            worm: false,
            domain: String::new(),
            storage_class: StorageClass::default(),
            notify: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(StorageError::InvalidConfig(format!(
                "unsupported version {}, expected {}",
                self.version, CONFIG_VERSION
            )));
        }
        if self.credential.access_key.len() < 3 {
            return Err(StorageError::InvalidConfig(
                "access key must be at least 3 characters".to_string(),
            ));
        }
        if self.credential.secret_key.len() < 8 {
            return Err(StorageError::InvalidConfig(
                "secret key must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

impl ConfigDocument for ServerConfig {
    fn diff(&self, other: &Self) -> Vec<String> {
        let mut diffs = Vec::new();

        if self.version != other.version {
            diffs.push(format!("version: {} != {}", self.version, other.version));
        }
        if self.credential != other.credential {
            // Never print secrets.
            diffs.push("credential differs".to_string());
        }
        if self.region != other.region {
            diffs.push(format!("region: {} != {}", self.region, other.region));
        }
        if self.browser != other.browser {
            diffs.push(format!("browser: {} != {}", self.browser, other.browser));
        }
        if self.worm != other.worm {
            diffs.push(format!("worm: {} != {}", self.worm, other.worm));
        }
        if self.domain != other.domain {
            diffs.push(format!("domain: {} != {}", self.domain, other.domain));
        }
        if self.storage_class != other.storage_class {
            diffs.push("storage_class differs".to_string());
        }

        let targets: BTreeSet<&String> = self.notify.keys().chain(other.notify.keys()).collect();
        for target in targets {
            match (self.notify.get(target), other.notify.get(target)) {
                (Some(a), Some(b)) if a == b => {}
                (Some(_), Some(_)) => diffs.push(format!("notify.{} differs", target)),
                (Some(_), None) => diffs.push(format!("notify.{} only on the left", target)),
                (None, Some(_)) => diffs.push(format!("notify.{} only on the right", target)),
                (None, None) => {}
            }
        }

        diffs
    }
}
