use crate::{config::Config, error, flow::AuthFlow, management::FileStore};

/// Stores a fresh verifier and prints the authorization URL without opening a browser.
pub async fn url(config: Config) {
    let store = FileStore::shared_default();
    let flow = AuthFlow::new(config, store);

    match flow.authorize().await {
        Ok(url) => println!("{}", url),
        Err(e) => error!("{}: {}", e.category(), e),
    }
}
