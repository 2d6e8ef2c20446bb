//! # API Module
//!
//! HTTP endpoints of the local server that sits at the redirect URI.
//!
//! - [`callback`] - Runs the sign-in flow for every request to the redirect
//!   URI path: redirects to Spotify when no authorization code is present,
//!   otherwise exchanges the code, fetches the profile and renders it.
//! - [`health`] - Returns application status and version.
//!
//! The HTML produced here is presentation only; the data comes from
//! [`crate::flow`].

mod callback;
mod health;
pub mod page;

pub use callback::{AppState, SignInSlot, callback};
pub use health::health;
