//! RMT API Server Entry Point
//!
//! Loads configuration, seeds the in-memory store and starts the Axum HTTP
//! server.

use std::sync::Arc;

use rmt_api::telemetry::{init_tracing, TelemetryConfig};
use rmt_api::{
    create_app_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, TracingSecurityLog,
};
use rmt_storage::{InMemoryStorage, SeedData};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let auth_config = AuthConfig::from_env();

    let store = match &api_config.seed_file {
        Some(path) => {
            let seed = SeedData::from_path(path)?;
            InMemoryStorage::from_seed(seed)?
        }
        None => {
            tracing::warn!("RMT_SEED_FILE not set; starting with an empty store");
            InMemoryStorage::new()
        }
    };

    let state = AppState::new(Arc::new(store), Arc::new(TracingSecurityLog));
    let app = create_app_router(state, &api_config, auth_config)?;

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, environment = %api_config.environment, "Starting RMT API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
