/// All errors that can be returned by a KeyValueStore implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Optimistic concurrency conflict: a key or prefix this transaction read
    /// was changed by another transaction that committed after `begin`. The
    /// losing transaction's writes are discarded.
    #[error("transaction conflict on key {key:?}: committed concurrently by another transaction")]
    Conflict { key: String },

    /// A backend-specific storage error (ledger connection, lock poisoning, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
