//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresVerificationStore` - Verifications, authentications and attempts
//!
//! Schema lives in `migrations/` and is applied by the binary at startup.

mod verification_store;

pub use verification_store::PostgresVerificationStore;
