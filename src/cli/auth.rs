use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    api::{AppState, SignInSlot},
    cli::display,
    config::Config,
    error,
    error::AuthError,
    flow::{AuthFlow, Session},
    info,
    management::FileStore,
    server, success, warning,
};

/// Runs one complete sign-in from the terminal.
///
/// Starts the callback server at the redirect URI, stores a fresh code
/// verifier, opens the authorization URL in the browser and waits for the
/// provider to call back. The fetched profile is printed once the browser
/// shows it too.
///
/// # Error Handling
///
/// - Browser launch failures result in a warning with the URL to open manually
/// - Bind, storage, exchange and fetch failures terminate with an error message
/// - When no callback arrives within `timeout` the stored verifier is cleared
pub async fn auth(config: Config, top_tracks: Option<u32>, timeout: Duration) {
    let flow = AuthFlow::new(config, FileStore::shared_default())
        .with_top_tracks(top_tracks);
    let state = AppState::new(flow);

    let addr = state.flow.config().server_addr.clone();
    let listener = match server::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => error!("{}", e),
    };

    let server_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = match state.flow.authorize().await {
        Ok(url) => url,
        Err(e) => error!("{}: {}", e.category(), e),
    };

    info!("Waiting for the callback on {}", state.flow.config().redirect_uri);
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for Spotify sign-in...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let result = wait_for_result(&state.result, timeout).await;
    pb.finish_and_clear();

    match result {
        Some(Ok(session)) => print_session(&session),
        Some(Err(e)) => error!("{}: {}", e.category(), e),
        None => {
            if let Err(e) = state.flow.verifier_slot().clear().await {
                warning!("Failed to clear code verifier: {}", e);
            }
            error!(
                "Sign-in timed out after {} seconds. Run sporlme auth again.",
                timeout.as_secs()
            );
        }
    }
}

fn print_session(session: &Session) {
    success!("Signed in as {}", session.profile.name());
    println!("{}", display::profile_table(&session.profile));

    if let Some(top) = &session.top_tracks {
        info!("Top tracks");
        println!("{}", display::top_tracks_table(top));
    }
    if let Some(err) = &session.top_tracks_error {
        warning!("Top tracks unavailable: {}", err);
    }
}

/// Polls `slot` once per second until the server stores a result or `timeout` elapses.
async fn wait_for_result(slot: &SignInSlot, timeout: Duration) -> Option<Result<Session, AuthError>> {
    let start = Instant::now();

    while start.elapsed() < timeout {
        if let Some(result) = slot.lock().await.take() {
            return Some(result);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
