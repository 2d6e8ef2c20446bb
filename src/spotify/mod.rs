//! # Spotify Integration Module
//!
//! This module talks to Spotify's accounts service and Web API on behalf of
//! the sign-in flow. It covers the two network steps that follow the browser
//! redirect:
//!
//! ```text
//! Flow (crate::flow)
//!          ↓
//! Spotify Integration Layer
//!     ├── Token Exchange (authorization code + PKCE verifier → access token)
//!     └── Resources (profile, top tracks)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Authentication
//!
//! [`auth::exchange_code_pkce`] posts the form-encoded token request. The
//! code verifier is only ever transmitted in this request body.
//!
//! ## Resources
//!
//! [`profile::fetch_profile`] and [`profile::fetch_top_tracks`] issue a single
//! `Authorization: Bearer` GET each. There is no retry, pagination or caching:
//! an unauthorized, rate-limited or unreachable API surfaces as
//! [`crate::error::AuthError::Resource`] with the HTTP status when one was
//! received.
//!
//! All functions take the `reqwest::Client` and [`crate::config::Config`]
//! explicitly, so tests can point them at a local mock of the provider.

pub mod auth;
pub mod profile;

pub use auth::exchange_code_pkce;
pub use profile::{fetch_profile, fetch_resource, fetch_top_tracks};
