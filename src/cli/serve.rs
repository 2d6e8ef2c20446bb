use crate::{api::AppState, config::Config, error, flow::AuthFlow, info, management::FileStore, server};

/// Serves the redirect URI until interrupted.
///
/// Every visit without an authorization code starts a new sign-in; every
/// callback renders the profile in the browser.
pub async fn serve(config: Config, top_tracks: Option<u32>) {
    let store = FileStore::shared_default();
    let flow = AuthFlow::new(config, store).with_top_tracks(top_tracks);
    let state = AppState::new(flow);

    info!("Open {} to sign in", state.flow.config().redirect_uri);

    if let Err(e) = server::start_api_server(state).await {
        error!("Callback server failed: {}", e);
    }
}
