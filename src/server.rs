use axum::{Extension, Router, routing::get};
use tokio::net::TcpListener;
use tracing::info;

use crate::{Res, api, api::AppState, error::AuthError};

const HEALTH_PATH: &str = "/health";

/// Routes `/health` and the redirect URI path of the flow's configuration.
pub fn router(state: AppState) -> Result<Router, AuthError> {
    let callback_path = state.flow.config().callback_path().to_string();
    if callback_path == HEALTH_PATH {
        return Err(AuthError::Config(format!(
            "redirect URI path must not be {HEALTH_PATH}"
        )));
    }

    Ok(Router::new()
        .route(HEALTH_PATH, get(api::health))
        .route(&callback_path, get(api::callback))
        .layer(Extension(state)))
}

pub async fn bind(addr: &str) -> Res<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind callback server to {addr}: {e}"))?;
    Ok(listener)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Res<()> {
    let app = router(state)?;
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "callback server listening");
    }
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn start_api_server(state: AppState) -> Res<()> {
    let listener = bind(&state.flow.config().server_addr).await?;
    serve(listener, state).await
}
