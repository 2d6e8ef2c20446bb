use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::{
    config::Config,
    error::AuthError,
    types::{Profile, TopTracks},
};

pub const MAX_TOP_TRACKS: u32 = 50;

/// Fetches the signed-in user's profile from `GET {api}/me`.
pub async fn fetch_profile(
    client: &Client,
    config: &Config,
    token: &str,
) -> Result<Profile, AuthError> {
    fetch_resource(client, &config.api_endpoint("me"), token).await
}

/// Fetches the user's top tracks from `GET {api}/me/top/tracks?limit={limit}`.
///
/// Requires the `user-top-read` scope. `limit` must be within 1..=50.
pub async fn fetch_top_tracks(
    client: &Client,
    config: &Config,
    token: &str,
    limit: u32,
) -> Result<TopTracks, AuthError> {
    if !(1..=MAX_TOP_TRACKS).contains(&limit) {
        return Err(AuthError::Config(format!(
            "top tracks limit {limit} is outside 1..={MAX_TOP_TRACKS}"
        )));
    }

    let url = format!(
        "{endpoint}?limit={limit}",
        endpoint = config.api_endpoint("me/top/tracks"),
        limit = limit
    );
    fetch_resource(client, &url, token).await
}

/// Issues one bearer-authenticated GET and parses the JSON body.
pub async fn fetch_resource<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    token: &str,
) -> Result<T, AuthError> {
    let response = client
        .get(url)
        .bearer_auth(token)
        .send()
        .await
        .map_err(|e| AuthError::Resource {
            status: None,
            message: e.to_string(),
        })?;

    let status = response.status();
    debug!(%status, url, "resource response");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Resource {
            status: Some(status),
            message: api_error_message(status, &body),
        });
    }

    response.json::<T>().await.map_err(|e| AuthError::Resource {
        status: Some(status),
        message: format!("invalid response body: {e}"),
    })
}

/// Web API errors look like `{"error":{"status":401,"message":"..."}}`.
fn api_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string));

    match message {
        Some(message) => format!("{status}: {message}"),
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{status}: {}", body.trim()),
    }
}
