use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::AuthError,
    types::{Token, TokenResponse},
};

/// Exchanges an authorization code for an access token using PKCE.
///
/// Completes the OAuth 2.0 PKCE flow by posting the authorization code
/// received on the callback together with the code verifier generated
/// before the redirect. The provider recomputes the challenge from the
/// verifier, which binds this request to the party that started the flow.
///
/// # Arguments
///
/// * `client` - HTTP client used for the request
/// * `config` - Client id, redirect URI and token endpoint
/// * `code` - Authorization code received from the OAuth callback
/// * `verifier` - PKCE code verifier that was generated at the start of the flow
///
/// # Errors
///
/// Returns [`AuthError::Exchange`] when the endpoint cannot be reached,
/// answers with a non-success status, or returns a body without a usable
/// `access_token`.
pub async fn exchange_code_pkce(
    client: &Client,
    config: &Config,
    code: &str,
    verifier: &str,
) -> Result<Token, AuthError> {
    let res = client
        .post(config.token_url.clone())
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await
        .map_err(|e| AuthError::Exchange(format!("token request failed: {e}")))?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        warn!(%status, "token endpoint rejected the authorization code");
        return Err(AuthError::Exchange(format!(
            "token endpoint returned {status}: {}",
            oauth_error_message(&body)
        )));
    }

    let body: TokenResponse = res
        .json()
        .await
        .map_err(|e| AuthError::Exchange(format!("invalid token response: {e}")))?;

    if body.access_token.trim().is_empty() {
        return Err(AuthError::Exchange(
            "token response has an empty access_token".to_string(),
        ));
    }
    if let Some(kind) = body.token_type.as_deref() {
        if !kind.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::Exchange(format!(
                "unsupported token type {kind}"
            )));
        }
    }

    debug!(scope = body.scope.as_deref().unwrap_or(""), "obtained access token");

    Ok(Token {
        access_token: body.access_token,
        scope: body.scope.unwrap_or_default(),
        expires_in: body.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}

/// Pulls `error` / `error_description` out of an OAuth error body, or returns it trimmed.
fn oauth_error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match (json["error"].as_str(), json["error_description"].as_str()) {
        (Some(error), Some(description)) => format!("{error} ({description})"),
        (Some(error), None) => error.to_string(),
        _ => body.trim().to_string(),
    }
}
