//! Session first-seen register.
//!
//! Decides whether a visitor session is "new" or "returning" by claiming its
//! id in a shared store. The store's uniqueness constraint is the only source
//! of truth: one conditional insert per claim, the first writer wins, and
//! every other caller observes "returning".
//!
//! - `SessionRegister` - the claim operation, absorbing store failures
//! - `ClaimStore` - the storage seam (SQL store lives in the db crate)
//! - `InMemoryClaimStore` - single-process store for tests and local runs
//! - `KnownSessionCache` - advisory cache that can only answer "returning"
//! - `RetentionSweep` - periodic purge of old claims

pub mod cache;
pub mod error;
pub mod memory;
pub mod register;
pub mod retention;
pub mod store;
pub mod types;

#[cfg(test)]
mod props;

pub use cache::KnownSessionCache;
pub use error::{ClaimStoreError, SessionError};
pub use memory::InMemoryClaimStore;
pub use register::SessionRegister;
pub use retention::RetentionSweep;
pub use store::ClaimStore;
pub use types::*;
