//! Execution audit trail.
//!
//! When enabled, every successful Execute appends an [`AuditRecord`] under the
//! table's audit prefix. The digest is SHA-256 over the canonical encoding of
//! the result, so replicas can compare audit entries by digest alone.

use ledgerdmn_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::{self, Asset};
use crate::ledger::Ledger;
use crate::types::{EngineError, ExecutionResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub table_id: String,
    /// Position in the table's audit trail, starting at 0.
    pub index: u64,
    /// Lower-case hex SHA-256 of the encoded `result`.
    pub digest: String,
    pub result: ExecutionResult,
}

impl AuditRecord {
    /// Recompute the digest and compare.
    pub fn verify(&self) -> Result<bool, EngineError> {
        Ok(digest(&self.result)? == self.digest)
    }
}

pub fn digest(result: &ExecutionResult) -> Result<String, EngineError> {
    let bytes = serde_json::to_vec(result).map_err(|e| EngineError::Codec {
        key: codec::audit_prefix(&result.table_id),
        message: e.to_string(),
    })?;
    let hash = Sha256::digest(&bytes);
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Append `result` to its table's audit trail.
pub fn append<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    result: &ExecutionResult,
) -> Result<AuditRecord, EngineError> {
    let index = ledger.count(&codec::audit_prefix(&result.table_id))?;
    let record = AuditRecord {
        table_id: result.table_id.clone(),
        index,
        digest: digest(result)?,
        result: result.clone(),
    };
    ledger.put(
        &codec::audit_key(&result.table_id, index),
        &Asset::Audit(record.clone()),
    )?;
    tracing::debug!(
        table_id = %record.table_id,
        index,
        digest = %record.digest,
        "audit record appended"
    );
    Ok(record)
}

/// The table's audit trail in append order.
pub fn list_audit_records<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    table_id: &str,
) -> Result<Vec<AuditRecord>, EngineError> {
    ledger
        .scan(&codec::audit_prefix(table_id))?
        .into_iter()
        .map(|(key, asset)| match asset {
            Asset::Audit(record) => Ok(record),
            other => Err(EngineError::Codec {
                key,
                message: format!("expected an audit record, found {}", other.kind()),
            }),
        })
        .collect()
}
