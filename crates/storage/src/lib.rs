//! Host key-value capability for the ledgerdmn decision engine.
//!
//! The engine is embedded in a ledger that owns persistence, ordering and
//! atomic commit. This crate defines the narrow interface the engine sees
//! ([`KeyValueStore`]), an in-memory reference host ([`MemoryStore`]) and a
//! conformance suite host implementations can run.

pub mod conformance;
mod error;
mod memory;
mod traits;

pub use error::StorageError;
pub use memory::{MemoryStore, MemoryTxn};
pub use traits::{Entry, KeyValueStore};
