use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use network::SecurityContext;
use quorum::{ClusterAdmin, PeerInvoker};
use std::future::Future;
use std::sync::Arc;
use storage::ServerConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth::{require_rpc_version, require_token};
use crate::{admin, rpc, ApiError, ApiResult, AppState};

pub struct Server {
    app_state: Arc<AppState>,
}

impl Server {
    pub fn new(
        local: Arc<dyn PeerInvoker>,
        cluster: Arc<ClusterAdmin<ServerConfig>>,
        security: SecurityContext,
    ) -> Self {
        Self {
            app_state: Arc::new(AppState {
                local,
                cluster,
                security,
            }),
        }
    }

    /// Binds `addr` and serves until `shutdown` resolves.
    pub async fn start<F>(&self, addr: &str, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to bind to {}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already bound listener. In-flight requests finish
    /// before this returns.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> ApiResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        tracing::info!("Starting admin API server on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ApiError::InternalError(format!("Server error: {}", e)))?;

        tracing::info!("Admin API server on {} stopped", addr);
        Ok(())
    }

    pub fn router(&self) -> Router {
        let state = self.app_state.clone();

        let rpc_routes = Router::new()
            .route("/:method", post(rpc::dispatch))
            .layer(middleware::from_fn(require_rpc_version));

        let admin_routes = Router::new()
            .route("/service", post(admin::signal_service))
            .route("/info", get(admin::server_info))
            .route("/uptime", get(admin::uptime))
            .route("/config", get(admin::get_config).put(admin::set_config))
            .route("/format/reinit", post(admin::reinit_format));

        let authenticated = Router::new()
            .nest("/rpc/admin/v1", rpc_routes)
            .nest("/admin/v1", admin_routes)
            .layer(middleware::from_fn_with_state(state.clone(), require_token));

        Router::new()
            .merge(authenticated)
            .route("/health", get(admin::health_check))
            .fallback(not_found)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
            .with_state(state)
    }
}

async fn not_found() -> ApiError {
    ApiError::UnknownMethod("no such route".to_string())
}
