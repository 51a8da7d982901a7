//! Storage Adapters
//!
//! In-process implementation of the VerificationStore port.
//!
//! ```ignore
//! use adapters::storage::InMemoryVerificationStore;
//!
//! let store = Arc::new(InMemoryVerificationStore::new());
//! let dispatcher = WebhookDispatcher::new(store.clone());
//! ```

mod in_memory_verification_store;

pub use in_memory_verification_store::InMemoryVerificationStore;
