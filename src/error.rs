//! Failure taxonomy of the sign-in flow.
//!
//! Every suspension point of the flow (redirect, token exchange, resource
//! fetch) resolves to either a value or one of these variants, so callers
//! always render an explicit error state instead of an empty profile.

use reqwest::StatusCode;

/// Errors produced while signing in and fetching the profile.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or invalid client identifier, redirect URI or endpoint.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The provider redirected back with an `error` parameter.
    #[error("authorization denied by provider: {error}{}", describe(.description))]
    Denied {
        error: String,
        description: Option<String>,
    },

    /// A callback arrived but no code verifier was stored for it.
    #[error("no code verifier stored for this sign-in; start again")]
    MissingVerifier,

    /// The token endpoint failed or returned an unusable body.
    #[error("token exchange failed: {0}")]
    Exchange(String),

    /// The resource API rejected the request or could not be reached.
    #[error("resource request failed: {message}")]
    Resource {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("code verifier length {0} is outside 43..=128")]
    VerifierLength(usize),
}

fn describe(description: &Option<String>) -> String {
    match description {
        Some(d) if !d.is_empty() => format!(" ({d})"),
        _ => String::new(),
    }
}

impl AuthError {
    /// Short heading suitable for an error page or terminal line.
    pub fn category(&self) -> &'static str {
        match self {
            AuthError::Config(_) | AuthError::VerifierLength(_) => "Configuration error",
            AuthError::Denied { .. } => "Authorization denied",
            AuthError::MissingVerifier | AuthError::Exchange(_) => "Sign-in failed",
            AuthError::Resource { .. } => "Could not load profile",
            AuthError::Storage(_) => "Storage error",
        }
    }

    /// True when the resource API answered 401, i.e. the token is expired or invalid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::Resource {
                status: Some(StatusCode::UNAUTHORIZED),
                ..
            }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            AuthError::Resource {
                status: Some(StatusCode::TOO_MANY_REQUESTS),
                ..
            }
        )
    }

    /// HTTP status used when the failure is rendered by the local server.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AuthError::Config(_) | AuthError::VerifierLength(_) | AuthError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AuthError::Denied { .. } => StatusCode::FORBIDDEN,
            AuthError::MissingVerifier => StatusCode::BAD_REQUEST,
            AuthError::Exchange(_) | AuthError::Resource { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::Storage(err.to_string())
    }
}
