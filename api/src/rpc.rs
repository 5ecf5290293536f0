use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use network::{
    ActivateConfigArgs, AdminMethod, ConfigReply, ReinitFormatArgs, SignalServiceArgs,
    StageConfigArgs, VoidReply,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::{ApiError, ApiResult, AppState};

/// `POST /rpc/admin/v1/:method`, answered by this node alone.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Path(method): Path<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let method: AdminMethod = method
        .parse()
        .map_err(|_| ApiError::UnknownMethod(method.clone()))?;
    tracing::debug!("Serving admin RPC {}", method);

    let local = &state.local;
    let response = match method {
        AdminMethod::SignalService => {
            let args: SignalServiceArgs = decode(&body)?;
            let signal = args.signal.dispatchable()?;
            local.signal_service(signal).await?;
            Json(VoidReply {}).into_response()
        }
        AdminMethod::ReinitFormat => {
            let args: ReinitFormatArgs = decode(&body)?;
            local.reinit_format(args.dry_run).await?;
            Json(VoidReply {}).into_response()
        }
        AdminMethod::ServerInfo => Json(local.server_info().await?).into_response(),
        AdminMethod::GetConfig => Json(ConfigReply {
            payload: local.get_config().await?,
        })
        .into_response(),
        AdminMethod::StageConfig => {
            let args: StageConfigArgs = decode(&body)?;
            local.stage_config(&args.staging_name, &args.payload).await?;
            Json(VoidReply {}).into_response()
        }
        AdminMethod::ActivateConfig => {
            let args: ActivateConfigArgs = decode(&body)?;
            local.activate_config(&args.staging_name).await?;
            Json(VoidReply {}).into_response()
        }
    };
    Ok(response)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidRequest(format!("malformed arguments: {}", e)))
}
