use quorum::ServiceSignal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::NetworkError;

/// Methods served under the peer admin RPC path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminMethod {
    SignalService,
    ReinitFormat,
    ServerInfo,
    GetConfig,
    StageConfig,
    ActivateConfig,
}

impl AdminMethod {
    pub const ALL: [AdminMethod; 6] = [
        AdminMethod::SignalService,
        AdminMethod::ReinitFormat,
        AdminMethod::ServerInfo,
        AdminMethod::GetConfig,
        AdminMethod::StageConfig,
        AdminMethod::ActivateConfig,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminMethod::SignalService => "signal-service",
            AdminMethod::ReinitFormat => "reinit-format",
            AdminMethod::ServerInfo => "server-info",
            AdminMethod::GetConfig => "get-config",
            AdminMethod::StageConfig => "stage-config",
            AdminMethod::ActivateConfig => "activate-config",
        }
    }
}

impl fmt::Display for AdminMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminMethod {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| NetworkError::Protocol(format!("unknown admin method: {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalServiceArgs {
    pub signal: ServiceSignal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReinitFormatArgs {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfigArgs {
    pub staging_name: String,
    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateConfigArgs {
    pub staging_name: String,
}

/// Reply of `get-config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigReply {
    #[serde(with = "base64_payload")]
    pub payload: Vec<u8>,
}

/// Opaque config bytes travel as standard base64 text.
mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(payload))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// Empty acknowledgement for methods without a result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoidReply {}

/// Body of every non-2xx answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub code: String,
    pub message: String,
}

impl ErrorReply {
    pub const STAGING_NOT_FOUND: &'static str = "staging-not-found";
    pub const UNSUPPORTED_SIGNAL: &'static str = "unsupported-signal";
    pub const BAD_REQUEST: &'static str = "bad-request";
    pub const UNAUTHORIZED: &'static str = "unauthorized";
    pub const VERSION_MISMATCH: &'static str = "version-mismatch";
    pub const UNKNOWN_METHOD: &'static str = "unknown-method";
    pub const QUORUM_UNAVAILABLE: &'static str = "quorum-unavailable";
    pub const INTERNAL: &'static str = "internal-error";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
