mod store;
mod verifier;

pub use store::FileStore;
pub use store::KeyValueStore;
pub use store::MemoryStore;
pub use store::SharedStore;
pub use verifier::VERIFIER_KEY;
pub use verifier::VerifierSlot;
