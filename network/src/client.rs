use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{
    AdminMethod, ErrorReply, NetworkError, Result, SecurityContext, ADMIN_RPC_PATH, RPC_VERSION,
    RPC_VERSION_HEADER,
};

/// Authenticated HTTP/JSON client for one peer's admin RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    host: String,
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl RpcClient {
    pub fn new(host: &str, security: &SecurityContext) -> Result<Self> {
        validate_host(host)?;

        let mut builder = reqwest::Client::builder().connect_timeout(security.connect_timeout);
        let scheme = match &security.tls {
            Some(tls) => {
                if let Some(ca_file) = &tls.ca_file {
                    let pem = std::fs::read(ca_file)?;
                    let cert = reqwest::Certificate::from_pem(&pem)
                        .map_err(|e| NetworkError::Protocol(format!("invalid CA bundle: {}", e)))?;
                    builder = builder.add_root_certificate(cert);
                }
                "https"
            }
            None => "http",
        };
        let http = builder
            .build()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            host: host.to_string(),
            base_url: format!("{}://{}{}", scheme, host, ADMIN_RPC_PATH),
            token: format!("Bearer {}", security.token()),
            http,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Invokes `method` on the peer and decodes its reply.
    pub async fn call<A, R>(&self, method: AdminMethod, args: &A) -> Result<R>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        tracing::debug!(peer = %self.host, "RPC {}", method);

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, &self.token)
            .header(RPC_VERSION_HEADER, RPC_VERSION)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            check_version(response.headers().get(RPC_VERSION_HEADER))?;
            let body = response.bytes().await?;
            return serde_json::from_slice(&body).map_err(|e| {
                NetworkError::Protocol(format!(
                    "undecodable {} reply from {}: {}",
                    method, self.host, e
                ))
            });
        }

        let body = response.bytes().await.unwrap_or_default();
        let reply = serde_json::from_slice::<ErrorReply>(&body).ok();
        Err(classify(status, reply))
    }
}

fn validate_host(host: &str) -> Result<()> {
    let (name, port) = host
        .rsplit_once(':')
        .ok_or_else(|| NetworkError::InvalidHost(format!("{}: missing port", host)))?;
    if name.is_empty() {
        return Err(NetworkError::InvalidHost(format!("{}: missing host name", host)));
    }
    port.parse::<u16>()
        .map_err(|e| NetworkError::InvalidHost(format!("{}: {}", host, e)))?;
    Ok(())
}

fn check_version(header: Option<&HeaderValue>) -> Result<()> {
    match header.map(|v| v.to_str().unwrap_or_default()) {
        None => Ok(()),
        Some(version) if version == RPC_VERSION => Ok(()),
        Some(version) => Err(NetworkError::Protocol(format!(
            "peer speaks admin RPC {}, expected {}",
            version, RPC_VERSION
        ))),
    }
}

fn classify(status: StatusCode, reply: Option<ErrorReply>) -> NetworkError {
    let message = reply
        .as_ref()
        .map(|r| r.message.clone())
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NetworkError::Authentication(message),
        StatusCode::UPGRADE_REQUIRED => {
            NetworkError::Protocol(format!("version mismatch: {}", message))
        }
        StatusCode::NOT_FOUND if reply.is_none() => {
            NetworkError::Protocol(format!("admin RPC not served: {}", message))
        }
        _ => match reply {
            Some(reply) => NetworkError::Remote {
                code: reply.code,
                message: reply.message,
            },
            None => NetworkError::Protocol(format!("unexpected status {}", status)),
        },
    }
}
