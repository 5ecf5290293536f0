use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use quorum::{PeerOutcome, PeerStatus, ServiceSignal};
use serde::Deserialize;
use std::sync::Arc;
use storage::ServerConfig;

use crate::{ApiError, ApiResult, AppState, HealthResponse, UptimeResponse};

/// Header carrying how many nodes agreed on the returned config.
pub const CONFIG_AGREEMENT_HEADER: &str = "x-config-agreement";

#[derive(Debug, Deserialize)]
pub struct SignalQuery {
    signal: String,
}

#[derive(Debug, Deserialize)]
pub struct ReinitQuery {
    #[serde(default)]
    dry_run: bool,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        peers: state.cluster.peers().len(),
    })
}

pub async fn signal_service(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignalQuery>,
) -> ApiResult<Json<Vec<PeerOutcome>>> {
    let signal: ServiceSignal = query.signal.parse()?;
    Ok(Json(state.cluster.signal_service(signal).await?))
}

pub async fn server_info(State(state): State<Arc<AppState>>) -> Json<Vec<PeerStatus>> {
    Json(state.cluster.server_info().await)
}

pub async fn uptime(State(state): State<Arc<AppState>>) -> ApiResult<Json<UptimeResponse>> {
    Ok(Json(state.cluster.uptime().await?.into()))
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let resolved = state.cluster.get_config().await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::HeaderName::from_static(CONFIG_AGREEMENT_HEADER), resolved.count.to_string()),
        ],
        resolved.value,
    )
        .into_response())
}

/// Answers 503 with the per-node report when too few nodes staged the
/// new config to activate it.
pub async fn set_config(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> ApiResult<Response> {
    let config: ServerConfig = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidRequest(format!("malformed config: {}", e)))?;
    config.validate()?;

    let update = state.cluster.set_config(&config).await?;
    let status = if update.activated.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(update)).into_response())
}

pub async fn reinit_format(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReinitQuery>,
) -> Json<Vec<PeerOutcome>> {
    Json(state.cluster.reinit_format(query.dry_run).await)
}
