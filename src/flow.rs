//! Control flow of a sign-in.
//!
//! Each request that reaches the redirect URI is wrapped in a
//! [`RequestContext`]. Without an authorization code the flow starts a new
//! attempt and asks the caller to navigate to the provider; with a code it
//! exchanges the code for a token and fetches the profile. The caller
//! performs the navigation (HTTP redirect or opening the browser) and the
//! rendering.

use std::collections::HashMap;

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::Config,
    error::AuthError,
    management::{SharedStore, VerifierSlot},
    spotify,
    types::{Profile, TopTracks},
    utils,
};

/// Query parameters of the request currently being handled.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    query: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(query: HashMap<String, String>) -> Self {
        Self { query }
    }

    /// Context of a fresh visit, without any callback parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Non-empty `code` parameter, if the provider sent one.
    pub fn code(&self) -> Option<&str> {
        self.param("code").filter(|c| !c.is_empty())
    }

    fn denial(&self) -> Option<AuthError> {
        self.param("error").map(|error| AuthError::Denied {
            error: error.to_string(),
            description: self.param("error_description").map(str::to_string),
        })
    }
}

/// Result of handling one request.
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    /// Navigate to the provider's authorization page.
    Redirect(Url),
    /// The user is signed in and their profile was fetched.
    SignedIn(Session),
}

/// What the presentation layer gets after a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub profile: Profile,
    pub top_tracks: Option<TopTracks>,
    /// Why the requested top tracks are missing; the profile is still shown.
    pub top_tracks_error: Option<String>,
    pub token_obtained_at: u64,
}

/// Redirect, token exchange and profile fetch wired to one configuration and store.
pub struct AuthFlow {
    config: Config,
    verifier: VerifierSlot,
    client: Client,
    top_tracks: Option<u32>,
}

impl AuthFlow {
    pub fn new(config: Config, store: SharedStore) -> Self {
        Self::with_client(config, store, Client::new())
    }

    pub fn with_client(config: Config, store: SharedStore, client: Client) -> Self {
        AuthFlow {
            config,
            verifier: VerifierSlot::new(store),
            client,
            top_tracks: None,
        }
    }

    /// Also fetch the user's top `limit` tracks after the profile.
    pub fn with_top_tracks(mut self, limit: Option<u32>) -> Self {
        self.top_tracks = limit;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn verifier_slot(&self) -> &VerifierSlot {
        &self.verifier
    }

    /// Handles a request at the redirect URI.
    ///
    /// A provider `error` parameter always wins over a missing code, so a
    /// denied consent is reported instead of starting a new attempt.
    pub async fn handle(&self, ctx: &RequestContext) -> Result<FlowOutcome, AuthError> {
        if let Some(denied) = ctx.denial() {
            warn!(error = ctx.param("error").unwrap_or(""), "provider denied authorization");
            // the attempt is over; its verifier must not be reused
            self.verifier.clear().await?;
            return Err(denied);
        }

        match ctx.code() {
            None => Ok(FlowOutcome::Redirect(self.authorize().await?)),
            Some(code) => Ok(FlowOutcome::SignedIn(self.complete(code).await?)),
        }
    }

    /// Starts a new attempt: stores a fresh verifier and returns the authorization URL.
    pub async fn authorize(&self) -> Result<Url, AuthError> {
        let verifier = utils::generate_code_verifier(self.config.verifier_length)?;
        let challenge = utils::generate_code_challenge(&verifier);

        self.verifier.save(&verifier).await?;

        let url = utils::build_authorize_url(&self.config, &challenge);
        info!(endpoint = %self.config.auth_url, "redirecting to authorization endpoint");
        Ok(url)
    }

    /// Exchanges `code` with the stored verifier, then fetches the profile.
    ///
    /// The verifier is removed from storage before the exchange is sent, so a
    /// failed exchange also invalidates it. A failed top-tracks fetch is kept
    /// in [`Session::top_tracks_error`] and does not fail the sign-in.
    pub async fn complete(&self, code: &str) -> Result<Session, AuthError> {
        let verifier = self.verifier.take().await?;

        let token =
            spotify::exchange_code_pkce(&self.client, &self.config, code, &verifier).await?;

        let profile =
            spotify::fetch_profile(&self.client, &self.config, &token.access_token).await?;
        debug!(user = %profile.id, "fetched profile");

        let mut top_tracks = None;
        let mut top_tracks_error = None;
        if let Some(limit) = self.top_tracks {
            match spotify::fetch_top_tracks(&self.client, &self.config, &token.access_token, limit)
                .await
            {
                Ok(top) => top_tracks = Some(top),
                Err(e) => {
                    warn!("top tracks unavailable: {}", e);
                    top_tracks_error = Some(e.to_string());
                }
            }
        }

        Ok(Session {
            profile,
            top_tracks,
            top_tracks_error,
            token_obtained_at: token.obtained_at,
        })
    }
}
