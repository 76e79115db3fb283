use crate::error::StorageError;

/// A stored key together with its encoded value.
pub type Entry = (String, Vec<u8>);

/// The host capability consumed by the decision engine.
///
/// A `KeyValueStore` gives the engine keyed reads and writes inside a
/// host-owned transaction. The engine never reimplements atomicity,
/// replication or ordering; it only asks the host to begin, commit or abort.
///
/// ## Transaction Semantics
///
/// Every engine operation runs inside one `Txn`:
///
/// 1. `begin()` -- start a transaction, returns a `Txn`
/// 2. Call `get` / `put` / `exists` / `scan_prefix` with `&mut txn`
/// 3. `commit(txn)` -- make all writes visible at once
///    OR `abort(txn)` -- discard every write made through `txn`
///
/// If a `Txn` is dropped without committing, none of its writes may become
/// visible.
///
/// ## Read Semantics
///
/// Reads through a `Txn` observe the state committed before `begin()` plus
/// the transaction's own pending writes. Writes committed by other
/// transactions after `begin()` are not observed.
///
/// ## Conflicts
///
/// `commit` must fail with [`StorageError::Conflict`] when another
/// transaction committed, after this one began, a write to a key this one
/// read (through `get`/`exists`) or under a prefix it scanned or counted. Of
/// two overlapping transactions that read and then write the same keys,
/// exactly one commits.
pub trait KeyValueStore: Send + Sync {
    /// The transaction type used by this host.
    type Txn: Send;

    // ── Transaction lifecycle ────────────────────────────────────────────────

    /// Begin a new transaction.
    fn begin(&self) -> Result<Self::Txn, StorageError>;

    /// Commit a transaction, making all of its writes visible.
    fn commit(&self, txn: Self::Txn) -> Result<(), StorageError>;

    /// Abort a transaction, discarding all of its writes.
    fn abort(&self, txn: Self::Txn) -> Result<(), StorageError>;

    // ── Keyed access (within transaction) ────────────────────────────────────

    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, txn: &mut Self::Txn, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    fn put(&self, txn: &mut Self::Txn, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Whether any value is stored under `key`.
    fn exists(&self, txn: &mut Self::Txn, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(txn, key)?.is_some())
    }

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, txn: &mut Self::Txn, prefix: &str) -> Result<Vec<Entry>, StorageError>;

    /// Number of keys starting with `prefix`. Hosts that can count without
    /// materializing values should override this.
    fn count_prefix(&self, txn: &mut Self::Txn, prefix: &str) -> Result<u64, StorageError> {
        Ok(self.scan_prefix(txn, prefix)?.len() as u64)
    }
}
