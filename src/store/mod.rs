//! Cached store
//!
//! Holds one in-memory snapshot of a collection and hands writes to the
//! codec and persistence engine. The store never inspects documents; the
//! collection layer mutates the snapshot between `load()` and `persist()`.

mod cached;
mod errors;

pub use cached::CachedStore;
pub use errors::{StoreError, StoreResult};
