//! Configuration management for the Spotify profile CLI.
//!
//! This module loads configuration values from environment variables and an
//! optional `.env` file, and turns them into an explicit [`Config`] object
//! that is handed to every component of the sign-in flow. Nothing reads the
//! environment after the `Config` has been built.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults for endpoints and scope
//!
//! The client identifier and the redirect URI have no defaults: they must
//! match an application registered with Spotify.

use std::{env, path::PathBuf};

use url::Url;

use crate::error::AuthError;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "SPOTIFY_API_REDIRECT_URI";
pub const ENV_SCOPE: &str = "SPOTIFY_API_AUTH_SCOPE";
pub const ENV_AUTH_URL: &str = "SPOTIFY_API_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "SPOTIFY_API_TOKEN_URL";
pub const ENV_API_URL: &str = "SPOTIFY_API_URL";
pub const ENV_SERVER_ADDRESS: &str = "SERVER_ADDRESS";
pub const ENV_VERIFIER_LENGTH: &str = "SPORLME_VERIFIER_LENGTH";

pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

pub const MIN_VERIFIER_LENGTH: usize = 43;
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the `sporlme` directory if it doesn't exist and loads
/// `sporlme/.env` from the platform-specific local data directory:
/// - Linux: `~/.local/share/sporlme/.env`
/// - macOS: `~/Library/Application Support/sporlme/.env`
/// - Windows: `%LOCALAPPDATA%/sporlme/.env`
///
/// A missing `.env` file is not an error; the process environment is used as is.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or if an existing
/// `.env` file cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Directory holding the `.env` file and the verifier storage.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("sporlme");
    path
}

/// Explicit configuration of the sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub client_id: String,
    pub redirect_uri: Url,
    pub scope: String,
    pub auth_url: Url,
    pub token_url: Url,
    pub api_url: Url,
    pub server_addr: String,
    pub verifier_length: usize,
}

impl Config {
    /// Builds a configuration with Spotify's public endpoints and default scope.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] when the client id is blank or the
    /// redirect URI is not an absolute http(s) URL without fragment.
    pub fn new(client_id: &str, redirect_uri: &str) -> Result<Self, AuthError> {
        let client_id = validate_client_id(client_id)?;
        let redirect_uri = validate_redirect_uri(redirect_uri)?;
        let server_addr = default_server_addr(&redirect_uri)?;

        Ok(Self {
            client_id,
            redirect_uri,
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: parse_endpoint(ENV_AUTH_URL, DEFAULT_AUTH_URL)?,
            token_url: parse_endpoint(ENV_TOKEN_URL, DEFAULT_TOKEN_URL)?,
            api_url: parse_endpoint(ENV_API_URL, DEFAULT_API_URL)?,
            server_addr,
            verifier_length: MAX_VERIFIER_LENGTH,
        })
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client_id = lookup(ENV_CLIENT_ID)
            .ok_or_else(|| AuthError::Config(format!("{ENV_CLIENT_ID} must be set")))?;
        let redirect_uri = lookup(ENV_REDIRECT_URI)
            .ok_or_else(|| AuthError::Config(format!("{ENV_REDIRECT_URI} must be set")))?;

        let mut config = Self::new(&client_id, &redirect_uri)?;

        if let Some(scope) = lookup(ENV_SCOPE) {
            config = config.with_scope(&scope)?;
        }
        if let Some(auth_url) = lookup(ENV_AUTH_URL) {
            config.auth_url = parse_endpoint(ENV_AUTH_URL, &auth_url)?;
        }
        if let Some(token_url) = lookup(ENV_TOKEN_URL) {
            config.token_url = parse_endpoint(ENV_TOKEN_URL, &token_url)?;
        }
        if let Some(api_url) = lookup(ENV_API_URL) {
            config.api_url = parse_endpoint(ENV_API_URL, &api_url)?;
        }
        if let Some(addr) = lookup(ENV_SERVER_ADDRESS) {
            config.server_addr = addr.trim().to_string();
        }
        if let Some(length) = lookup(ENV_VERIFIER_LENGTH) {
            let length = length.trim().parse::<usize>().map_err(|e| {
                AuthError::Config(format!("{ENV_VERIFIER_LENGTH} is not a number: {e}"))
            })?;
            config = config.with_verifier_length(length)?;
        }

        Ok(config)
    }

    pub fn with_scope(mut self, scope: &str) -> Result<Self, AuthError> {
        let scope = scope.split_whitespace().collect::<Vec<_>>().join(" ");
        if scope.is_empty() {
            return Err(AuthError::Config(format!("{ENV_SCOPE} must not be empty")));
        }
        self.scope = scope;
        Ok(self)
    }

    /// Points every endpoint at `base`, e.g. a local mock of the provider.
    ///
    /// The authorize endpoint becomes `{base}/authorize`, the token endpoint
    /// `{base}/api/token` and the resource API `{base}/v1`.
    pub fn with_provider_base(mut self, base: &str) -> Result<Self, AuthError> {
        let base = base.trim_end_matches('/');
        self.auth_url = parse_endpoint(ENV_AUTH_URL, &format!("{base}/authorize"))?;
        self.token_url = parse_endpoint(ENV_TOKEN_URL, &format!("{base}/api/token"))?;
        self.api_url = parse_endpoint(ENV_API_URL, &format!("{base}/v1"))?;
        Ok(self)
    }

    pub fn with_verifier_length(mut self, length: usize) -> Result<Self, AuthError> {
        if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
            return Err(AuthError::VerifierLength(length));
        }
        self.verifier_length = length;
        Ok(self)
    }

    /// Path component of the redirect URI, served by the local callback server.
    pub fn callback_path(&self) -> &str {
        self.redirect_uri.path()
    }

    /// Resource endpoint for `path`, relative to the API base (`me`, `me/top/tracks`).
    pub fn api_endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn validate_client_id(client_id: &str) -> Result<String, AuthError> {
    let client_id = client_id.trim();
    if client_id.is_empty() {
        return Err(AuthError::Config(format!("{ENV_CLIENT_ID} must not be empty")));
    }
    if client_id.chars().any(char::is_whitespace) {
        return Err(AuthError::Config(format!(
            "{ENV_CLIENT_ID} must not contain whitespace"
        )));
    }
    Ok(client_id.to_string())
}

fn validate_redirect_uri(redirect_uri: &str) -> Result<Url, AuthError> {
    let url = Url::parse(redirect_uri.trim())
        .map_err(|e| AuthError::Config(format!("{ENV_REDIRECT_URI} is not a valid URL: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::Config(format!(
            "{ENV_REDIRECT_URI} must use http or https, got {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(AuthError::Config(format!("{ENV_REDIRECT_URI} must have a host")));
    }
    if url.fragment().is_some() {
        return Err(AuthError::Config(format!(
            "{ENV_REDIRECT_URI} must not contain a fragment"
        )));
    }
    validate_callback_path(url.path())?;
    Ok(url)
}

/// The redirect path is served as a literal route, so it must not look like a capture.
fn validate_callback_path(path: &str) -> Result<(), AuthError> {
    let capture = path
        .split('/')
        .find(|segment| segment.starts_with(':') || segment.starts_with('*'));
    if let Some(segment) = capture {
        return Err(AuthError::Config(format!(
            "{ENV_REDIRECT_URI} path segment {segment} must not start with ':' or '*'"
        )));
    }
    Ok(())
}

fn parse_endpoint(name: &str, value: &str) -> Result<Url, AuthError> {
    let url = Url::parse(value.trim())
        .map_err(|e| AuthError::Config(format!("{name} is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AuthError::Config(format!("{name} must use http or https")));
    }
    Ok(url)
}

fn default_server_addr(redirect_uri: &Url) -> Result<String, AuthError> {
    let host = redirect_uri
        .host_str()
        .ok_or_else(|| AuthError::Config(format!("{ENV_REDIRECT_URI} must have a host")))?;
    let port = redirect_uri.port_or_known_default().ok_or_else(|| {
        AuthError::Config(format!("{ENV_REDIRECT_URI} has no port for the callback server"))
    })?;
    Ok(format!("{host}:{port}"))
}
