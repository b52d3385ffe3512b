//! HTTP server bootstrap (spec.md §6): binds the router built from
//! `ApiState` and serves it until `ctrl_c`, mirroring the teacher's
//! graceful-shutdown pattern (`xds/server.rs`'s `start_api_server`).

use crate::api::routes::build_router;
use crate::api::state::ApiState;
use crate::config::ServerConfig;
use crate::errors::{GatewayError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn start_api_server(config: &ServerConfig, state: ApiState) -> Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| GatewayError::config_missing(format!("invalid server bind address: {e}")))?;

    let router = build_router(state, config.enable_cors);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| GatewayError::internal(format!("failed to bind {addr}: {e}")))?;

    info!(address = %addr, "gateway HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "failed to install ctrl-c shutdown handler");
            }
        })
        .await
        .map_err(|e| GatewayError::internal(format!("HTTP server error: {e}")))?;

    info!("gateway HTTP server shut down");
    Ok(())
}
