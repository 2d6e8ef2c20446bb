//! # CLI Module
//!
//! Command-line surface of sporlme. Each command builds the sign-in flow
//! from the loaded [`crate::config::Config`] and a file-backed verifier
//! store, then reports progress with the crate's output macros.
//!
//! ## Commands
//!
//! - [`auth`] - Signs in through the browser and prints the profile
//! - [`serve`] - Keeps the callback server running at the redirect URI
//! - [`url`] - Prints a fresh authorization URL
//!
//! ## Usage Patterns
//!
//! ```bash
//! sporlme auth                       # Sign in and show your profile
//! sporlme auth --top-tracks 5        # ...plus your five top tracks
//! sporlme serve                      # Serve the profile page in the browser
//! ```

mod auth;
pub mod display;
mod serve;
mod url;

pub use auth::auth;
pub use serve::serve;
pub use url::url;
