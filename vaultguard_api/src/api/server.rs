//! Router construction and server startup.

use anyhow::Result;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{status, transactions, wills};
use crate::config::Config;
use crate::gateway::RegistryGateway;

/// Shared per-request dependencies. The gateway is stateless aside from
/// connection reuse, so cloning the state is cheap and lock-free.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn RegistryGateway>,
    pub config: Arc<Config>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/will/prepare", post(transactions::prepare_will))
        .route("/api/will/broadcast", post(transactions::broadcast_will))
        .route("/api/will/:token_id", get(wills::get_will))
        .route("/api/wills", get(wills::list_wills))
        .route("/healthz", get(status::healthz))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_api_server(config: Config, state: AppState) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.listen_port)).await?;
    log::info!(
        "VaultGuard API listening on http://0.0.0.0:{}",
        config.listen_port
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
