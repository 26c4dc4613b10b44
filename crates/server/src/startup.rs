use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};
use service::users::UserStore;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Open the user store named by the config and wrap it as router state.
pub async fn build_state(cfg: &AppConfig) -> Result<AppState, StartupError> {
    common::env::ensure_env(&cfg.storage.users_file).await?;
    let store = UserStore::open(cfg.storage.users_file.clone()).await?;
    Ok(AppState::new(Arc::new(store)))
}

pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state, build_cors()))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
    }
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let bind = cfg.bind_addr();
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {bind}: {e}")))?;
    info!(%addr, users_file = %cfg.storage.users_file.display(), "starting user accounts server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}
