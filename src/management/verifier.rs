use tracing::debug;

use crate::{error::AuthError, management::SharedStore};

/// Fixed storage key of the PKCE code verifier.
pub const VERIFIER_KEY: &str = "verifier";

/// The single storage slot holding the code verifier between redirect and callback.
#[derive(Clone)]
pub struct VerifierSlot {
    store: SharedStore,
}

impl VerifierSlot {
    pub fn new(store: SharedStore) -> Self {
        VerifierSlot { store }
    }

    /// Overwrites any verifier left by an earlier, abandoned attempt.
    pub async fn save(&self, verifier: &str) -> Result<(), AuthError> {
        self.store.set(VERIFIER_KEY, verifier).await?;
        debug!(len = verifier.len(), "stored code verifier");
        Ok(())
    }

    pub async fn load(&self) -> Result<Option<String>, AuthError> {
        self.store.get(VERIFIER_KEY).await
    }

    /// Reads the verifier and removes it, so it can be used only once.
    pub async fn take(&self) -> Result<String, AuthError> {
        let verifier = self
            .store
            .take(VERIFIER_KEY)
            .await?
            .ok_or(AuthError::MissingVerifier)?;
        debug!("consumed code verifier");
        Ok(verifier)
    }

    pub async fn clear(&self) -> Result<(), AuthError> {
        self.store.remove(VERIFIER_KEY).await
    }
}
