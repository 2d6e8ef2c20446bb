use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use url::Url;

use crate::{
    config::{Config, MAX_VERIFIER_LENGTH, MIN_VERIFIER_LENGTH},
    error::AuthError,
};

/// Generates a PKCE code verifier of `length` characters from `[A-Za-z0-9]`.
///
/// Characters are drawn from the thread-local generator, which is a CSPRNG
/// seeded from the operating system.
pub fn generate_code_verifier(length: usize) -> Result<String, AuthError> {
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(AuthError::VerifierLength(length));
    }

    Ok(rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect())
}

/// `BASE64URL(SHA256(verifier))` without padding.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Builds the authorization request URL for `code_challenge`.
pub fn build_authorize_url(config: &Config, code_challenge: &str) -> Url {
    let mut url = config.auth_url.clone();
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", config.redirect_uri.as_str())
        .append_pair("scope", &config.scope)
        .append_pair("code_challenge_method", "S256")
        .append_pair("code_challenge", code_challenge);
    url
}

/// Escapes text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
