//! Server bootstrap — wires collaborators, engine, and router, then
//! serves until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use pairhub_auth::{JwtIdentityVerifier, StaticMembershipResolver};
use pairhub_core::config::AppConfig;
use pairhub_core::error::AppError;
use pairhub_realtime::RendezvousEngine;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the engine and application state from configuration.
pub fn build_state(config: AppConfig) -> AppState {
    let verifier = Arc::new(JwtIdentityVerifier::new(&config.auth));
    let membership = Arc::new(StaticMembershipResolver::new(&config.membership));
    let engine = RendezvousEngine::new(config.realtime.clone(), verifier, membership);

    AppState {
        config: Arc::new(config),
        engine,
        started_at: Instant::now(),
    }
}

/// Runs the server until ctrl-c.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = build_state(config);
    state.engine.start();

    let router = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(state))
    .await
    .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Resolves on ctrl-c, after the engine has been drained.
async fn shutdown_signal(state: AppState) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("shutdown signal received");
    state.engine.shutdown().await;
}
