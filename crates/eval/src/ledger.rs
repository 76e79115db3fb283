//! Typed access to the host store within one transaction.

use ledgerdmn_storage::KeyValueStore;

use crate::codec::{self, Asset};
use crate::types::{ColumnSchema, EngineError, TableSchema};

/// A host transaction viewed as a store of [`Asset`]s.
///
/// Hosts that manage their own transaction per call (a ledger's chaincode
/// context, for instance) wrap it in a `Ledger` and call the operation
/// modules directly.
pub struct Ledger<'a, S: KeyValueStore> {
    store: &'a S,
    txn: &'a mut S::Txn,
}

impl<'a, S: KeyValueStore> Ledger<'a, S> {
    pub fn new(store: &'a S, txn: &'a mut S::Txn) -> Self {
        Ledger { store, txn }
    }

    pub fn exists(&mut self, key: &str) -> Result<bool, EngineError> {
        Ok(self.store.exists(self.txn, key)?)
    }

    pub fn get(&mut self, key: &str) -> Result<Option<Asset>, EngineError> {
        match self.store.get(self.txn, key)? {
            Some(bytes) => codec::decode(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn put(&mut self, key: &str, asset: &Asset) -> Result<(), EngineError> {
        let bytes = codec::encode(key, asset)?;
        self.store.put(self.txn, key, bytes)?;
        Ok(())
    }

    /// Decoded assets under `prefix`, in ascending key order.
    pub fn scan(&mut self, prefix: &str) -> Result<Vec<(String, Asset)>, EngineError> {
        self.store
            .scan_prefix(self.txn, prefix)?
            .into_iter()
            .map(|(key, bytes)| {
                let asset = codec::decode(&key, &bytes)?;
                Ok((key, asset))
            })
            .collect()
    }

    /// Number of entries under `prefix`, without decoding them.
    pub fn count(&mut self, prefix: &str) -> Result<u64, EngineError> {
        Ok(self.store.count_prefix(self.txn, prefix)?)
    }

    /// The column stored under `id`. Absent ids and non-column records are
    /// both `NotFound`.
    pub fn get_column(&mut self, id: &str) -> Result<ColumnSchema, EngineError> {
        match self.get(id)? {
            Some(Asset::Column(column)) => Ok(column),
            Some(other) => {
                tracing::debug!(id, kind = other.kind(), "expected a column");
                Err(EngineError::not_found(id))
            }
            None => Err(EngineError::not_found(id)),
        }
    }

    /// The table stored under `id`. Absent ids and non-table records are
    /// both `NotFound`.
    pub fn get_table(&mut self, id: &str) -> Result<TableSchema, EngineError> {
        match self.get(id)? {
            Some(Asset::Table(table)) => Ok(table),
            Some(other) => {
                tracing::debug!(id, kind = other.kind(), "expected a table");
                Err(EngineError::not_found(id))
            }
            None => Err(EngineError::not_found(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdmn_storage::MemoryStore;

    #[test]
    fn count_does_not_decode_values() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        let prefix = codec::audit_prefix("t");
        for i in 0..3 {
            store
                .put(&mut txn, &codec::audit_key("t", i), b"not json".to_vec())
                .unwrap();
        }
        let mut ledger = Ledger::new(&store, &mut txn);
        assert_eq!(ledger.count(&prefix).unwrap(), 3);
        assert_eq!(ledger.count(&codec::audit_prefix("u")).unwrap(), 0);
        assert_eq!(ledger.scan(&prefix).unwrap_err().code(), "CODEC");
    }

    #[test]
    fn wrong_kind_reads_as_not_found() {
        let store = MemoryStore::new();
        let mut txn = store.begin().unwrap();
        let mut ledger = Ledger::new(&store, &mut txn);
        let column = ColumnSchema::new(
            "age",
            vec![],
            crate::types::ColumnType::Number,
            crate::types::Direction::Input,
        );
        ledger.put("age", &Asset::Column(column.clone())).unwrap();
        assert_eq!(ledger.get_column("age").unwrap(), column);
        assert_eq!(ledger.get_table("age").unwrap_err(), EngineError::not_found("age"));
    }
}
