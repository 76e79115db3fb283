//! In-memory reference host.
//!
//! [`MemoryStore`] keeps committed state in a `BTreeMap` behind a lock, with
//! the commit version that last wrote each key. Each transaction starts from a
//! copy of the committed map, buffers its writes, and records the keys and
//! prefixes it reads. `commit` validates that none of those reads was
//! overwritten since `begin` and then applies every write in one step.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::StorageError;
use crate::traits::{Entry, KeyValueStore};

/// In-memory `KeyValueStore` for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<CommittedState>,
    next_txn_id: AtomicU64,
}

#[derive(Debug, Default)]
struct CommittedState {
    entries: BTreeMap<String, Versioned>,
    /// Incremented once per successful commit.
    version: u64,
}

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    value: Vec<u8>,
}

/// A transaction against a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryTxn {
    id: u64,
    start_version: u64,
    snapshot: BTreeMap<String, Versioned>,
    writes: BTreeMap<String, Vec<u8>>,
    read_keys: BTreeSet<String>,
    read_prefixes: BTreeSet<String>,
}

impl MemoryTxn {
    /// Number of keys written and not yet committed.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    fn prefix_range(prefix: &str) -> (Bound<String>, Bound<String>) {
        (Bound::Included(prefix.to_string()), Bound::Unbounded)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed keys.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read_state()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    /// Copy of the committed state, for byte-level comparison across replicas.
    pub fn dump(&self) -> Result<BTreeMap<String, Vec<u8>>, StorageError> {
        Ok(self
            .read_state()?
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, CommittedState>, StorageError> {
        self.state
            .read()
            .map_err(|e| StorageError::Backend(format!("committed state lock poisoned: {}", e)))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, CommittedState>, StorageError> {
        self.state
            .write()
            .map_err(|e| StorageError::Backend(format!("committed state lock poisoned: {}", e)))
    }
}

/// The first key `txn` read that a later commit has overwritten.
fn conflicting_key(state: &CommittedState, txn: &MemoryTxn) -> Option<String> {
    let changed = |entry: &Versioned| entry.version > txn.start_version;
    for key in &txn.read_keys {
        if state.entries.get(key).is_some_and(changed) {
            return Some(key.clone());
        }
    }
    for prefix in &txn.read_prefixes {
        let hit = state
            .entries
            .range::<String, _>(MemoryTxn::prefix_range(prefix))
            .take_while(|(k, _)| k.starts_with(prefix.as_str()))
            .find(|(_, entry)| changed(*entry));
        if let Some((key, _)) = hit {
            return Some(key.clone());
        }
    }
    None
}

impl KeyValueStore for MemoryStore {
    type Txn = MemoryTxn;

    fn begin(&self) -> Result<MemoryTxn, StorageError> {
        let state = self.read_state()?;
        let id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(
            txn_id = id,
            version = state.version,
            keys = state.entries.len(),
            "begin transaction"
        );
        Ok(MemoryTxn {
            id,
            start_version: state.version,
            snapshot: state.entries.clone(),
            writes: BTreeMap::new(),
            read_keys: BTreeSet::new(),
            read_prefixes: BTreeSet::new(),
        })
    }

    fn commit(&self, txn: MemoryTxn) -> Result<(), StorageError> {
        let mut state = self.write_state()?;
        if let Some(key) = conflicting_key(&state, &txn) {
            tracing::debug!(txn_id = txn.id, key = %key, "commit rejected: read set changed");
            return Err(StorageError::Conflict { key });
        }
        tracing::trace!(txn_id = txn.id, writes = txn.pending_writes(), "commit transaction");
        if txn.writes.is_empty() {
            return Ok(());
        }
        state.version += 1;
        let version = state.version;
        for (key, value) in txn.writes {
            state.entries.insert(key, Versioned { version, value });
        }
        Ok(())
    }

    fn abort(&self, txn: MemoryTxn) -> Result<(), StorageError> {
        tracing::trace!(txn_id = txn.id, discarded = txn.pending_writes(), "abort transaction");
        Ok(())
    }

    fn get(&self, txn: &mut MemoryTxn, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        txn.read_keys.insert(key.to_string());
        Ok(match txn.writes.get(key) {
            Some(value) => Some(value.clone()),
            None => txn.snapshot.get(key).map(|v| v.value.clone()),
        })
    }

    fn put(&self, txn: &mut MemoryTxn, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        txn.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn scan_prefix(&self, txn: &mut MemoryTxn, prefix: &str) -> Result<Vec<Entry>, StorageError> {
        txn.read_prefixes.insert(prefix.to_string());
        let mut merged: BTreeMap<&String, &Vec<u8>> = txn
            .snapshot
            .range::<String, _>(MemoryTxn::prefix_range(prefix))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k, &v.value))
            .collect();
        for (k, v) in txn
            .writes
            .range::<String, _>(MemoryTxn::prefix_range(prefix))
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            merged.insert(k, v);
        }
        Ok(merged
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn count_prefix(&self, txn: &mut MemoryTxn, prefix: &str) -> Result<u64, StorageError> {
        txn.read_prefixes.insert(prefix.to_string());
        let committed = txn
            .snapshot
            .range::<String, _>(MemoryTxn::prefix_range(prefix))
            .take_while(|(k, _)| k.starts_with(prefix))
            .count();
        let pending = txn
            .writes
            .range::<String, _>(MemoryTxn::prefix_range(prefix))
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| !txn.snapshot.contains_key(*k))
            .count();
        Ok((committed + pending) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_writes_are_private_to_the_transaction() {
        let store = MemoryStore::new();
        let mut writer = store.begin().unwrap();
        store.put(&mut writer, "k", b"v".to_vec()).unwrap();
        assert_eq!(writer.pending_writes(), 1);

        let mut reader = store.begin().unwrap();
        assert_eq!(store.get(&mut reader, "k").unwrap(), None);
        assert_eq!(store.get(&mut writer, "k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn commit_applies_all_writes() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "a", b"1".to_vec()).unwrap();
        store.put(&mut txn, "b", b"2".to_vec()).unwrap();
        store.commit(txn).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn abort_leaves_store_empty() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "a", b"1".to_vec()).unwrap();
        store.abort(txn).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn scan_merges_snapshot_and_writes_in_key_order() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "p/2", b"old".to_vec()).unwrap();
        store.put(&mut txn, "p/3", b"3".to_vec()).unwrap();
        store.put(&mut txn, "q/1", b"x".to_vec()).unwrap();
        store.commit(txn).unwrap();

        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "p/1", b"1".to_vec()).unwrap();
        store.put(&mut txn, "p/2", b"new".to_vec()).unwrap();
        let entries = store.scan_prefix(&mut txn, "p/").unwrap();
        assert_eq!(
            entries,
            vec![
                ("p/1".to_string(), b"1".to_vec()),
                ("p/2".to_string(), b"new".to_vec()),
                ("p/3".to_string(), b"3".to_vec()),
            ]
        );
    }

    #[test]
    fn count_matches_scan_length() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "p/1", b"1".to_vec()).unwrap();
        store.put(&mut txn, "p/2", b"2".to_vec()).unwrap();
        store.commit(txn).unwrap();

        let mut txn = store.begin().unwrap();
        store.put(&mut txn, "p/2", b"again".to_vec()).unwrap();
        store.put(&mut txn, "p/3", b"3".to_vec()).unwrap();
        store.put(&mut txn, "q/1", b"x".to_vec()).unwrap();
        let counted = store.count_prefix(&mut txn, "p/").unwrap();
        let scanned = store.scan_prefix(&mut txn, "p/").unwrap().len() as u64;
        assert_eq!((counted, scanned), (3, 3));
    }

    #[test]
    fn second_reader_of_a_key_loses() {
        let store = MemoryStore::new();
        let mut a = store.begin().unwrap();
        let mut b = store.begin().unwrap();
        for txn in [&mut a, &mut b] {
            assert!(!store.exists(txn, "col").unwrap());
            store.put(txn, "col", b"x".to_vec()).unwrap();
        }
        store.commit(a).unwrap();
        assert_eq!(
            store.commit(b).unwrap_err(),
            StorageError::Conflict { key: "col".into() }
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn prefix_readers_conflict_on_new_keys() {
        let store = MemoryStore::new();
        let mut a = store.begin().unwrap();
        let mut b = store.begin().unwrap();
        assert_eq!(store.count_prefix(&mut a, "rule/").unwrap(), 0);
        assert_eq!(store.count_prefix(&mut b, "rule/").unwrap(), 0);
        store.put(&mut a, "rule/0", b"a".to_vec()).unwrap();
        store.put(&mut b, "rule/0", b"b".to_vec()).unwrap();
        store.commit(a).unwrap();
        assert!(matches!(store.commit(b), Err(StorageError::Conflict { .. })));
        assert_eq!(store.dump().unwrap()["rule/0"], b"a".to_vec());
    }

    #[test]
    fn blind_writes_do_not_conflict() {
        let store = MemoryStore::new();
        let mut a = store.begin().unwrap();
        let mut b = store.begin().unwrap();
        store.put(&mut a, "k", b"a".to_vec()).unwrap();
        store.put(&mut b, "k", b"b".to_vec()).unwrap();
        store.commit(a).unwrap();
        store.commit(b).unwrap();
        assert_eq!(store.dump().unwrap()["k"], b"b".to_vec());
    }

    #[test]
    fn reads_of_untouched_keys_commit() {
        let store = MemoryStore::new();
        let mut a = store.begin().unwrap();
        let mut b = store.begin().unwrap();
        store.get(&mut a, "x").unwrap();
        store.put(&mut a, "x", b"1".to_vec()).unwrap();
        store.scan_prefix(&mut b, "y/").unwrap();
        store.put(&mut b, "y/1", b"2".to_vec()).unwrap();
        store.commit(a).unwrap();
        store.commit(b).unwrap();
        assert_eq!(store.len().unwrap(), 2);
    }
}
