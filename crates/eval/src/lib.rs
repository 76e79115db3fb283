//! Decision-table evaluation over a transactional key-value store.
//!
//! Columns, tables and rules are immutable assets persisted through a
//! [`KeyValueStore`]. Execute binds an input vector to a table, matches every
//! rule, and lets the table's hit policy pick the outputs.
//!
//! [`DecisionEngine`] runs each operation in its own store transaction. Hosts
//! that already own a transaction use the operation modules directly through
//! a [`Ledger`].

pub mod audit;
pub mod codec;
pub mod config;
pub mod engine;
pub mod expr;
pub mod hit_policy;
pub mod ledger;
pub mod matcher;
pub mod numeric;
pub mod rules;
pub mod schema;
pub mod types;
pub mod validate;

use std::collections::BTreeMap;

use ledgerdmn_storage::KeyValueStore;

pub use audit::AuditRecord;
pub use config::{ConfigError, EngineConfig};
pub use ledger::Ledger;
pub use types::{
    ColumnSchema, ColumnType, DecisionTable, Direction, EngineError, ExecutionResult, HitPolicy,
    InputVector, OutputVector, Rule, TableSchema, Value,
};

/// Decision engine bound to one store.
pub struct DecisionEngine<S: KeyValueStore> {
    store: S,
    config: EngineConfig,
}

impl<S: KeyValueStore> DecisionEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        DecisionEngine { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Schema ────────────────────────────────────────────────────────────────

    /// Create a column. `column_type` is one of `STRING`, `NUMBER`,
    /// `BOOLEAN`, `ENUM`; `direction` is `INPUT`/`OUTPUT` or `0`/`1`.
    pub fn create_column(
        &self,
        id: &str,
        domain: Vec<String>,
        column_type: &str,
        direction: &str,
    ) -> Result<String, EngineError> {
        let column_type: ColumnType = column_type.parse()?;
        let direction: Direction = direction.parse()?;
        self.atomically("create_column", |ledger| {
            schema::create_column(ledger, &self.config, id, domain, column_type, direction)
        })
    }

    /// Create a table over existing columns.
    pub fn create_table(
        &self,
        id: &str,
        name: &str,
        column_ids: Vec<String>,
        hit_policy: &str,
    ) -> Result<String, EngineError> {
        let hit_policy: HitPolicy = hit_policy.parse()?;
        self.atomically("create_table", |ledger| {
            schema::create_table(ledger, id, name, column_ids, hit_policy)
        })
    }

    pub fn read_table_columns(&self, table_id: &str) -> Result<Vec<ColumnSchema>, EngineError> {
        self.read(|ledger| schema::read_table_columns(ledger, table_id))
    }

    pub fn read_table(&self, id: &str) -> Result<TableSchema, EngineError> {
        self.read(|ledger| schema::read_table(ledger, id))
    }

    pub fn read_column(&self, id: &str) -> Result<ColumnSchema, EngineError> {
        self.read(|ledger| schema::read_column(ledger, id))
    }

    pub fn asset_exists(&self, id: &str) -> Result<bool, EngineError> {
        self.read(|ledger| schema::asset_exists(ledger, id))
    }

    // ── Rules ─────────────────────────────────────────────────────────────────

    /// Append a rule to a table, returning its id.
    pub fn add_rule(
        &self,
        table_id: &str,
        input_matches: BTreeMap<String, String>,
        output_values: BTreeMap<String, String>,
        priority: i64,
    ) -> Result<String, EngineError> {
        self.atomically("add_rule", |ledger| {
            rules::add_rule(
                ledger,
                &self.config,
                table_id,
                input_matches,
                output_values,
                priority,
            )
        })
    }

    pub fn list_rules(&self, table_id: &str) -> Result<Vec<Rule>, EngineError> {
        self.read(|ledger| rules::list_rules(ledger, table_id))
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    pub fn execute(
        &self,
        table_id: &str,
        inputs: &InputVector,
    ) -> Result<ExecutionResult, EngineError> {
        self.evaluate(|ledger| engine::execute(ledger, &self.config, table_id, inputs))
    }

    /// Execute with values in the order of the table's INPUT columns.
    pub fn execute_positional(
        &self,
        table_id: &str,
        values: &[String],
    ) -> Result<ExecutionResult, EngineError> {
        self.evaluate(|ledger| engine::execute_positional(ledger, &self.config, table_id, values))
    }

    /// Execute with inputs given as a JSON object.
    pub fn execute_json(
        &self,
        table_id: &str,
        inputs: &serde_json::Value,
    ) -> Result<ExecutionResult, EngineError> {
        let inputs = engine::inputs_from_json(inputs)?;
        self.execute(table_id, &inputs)
    }

    pub fn list_audit_records(&self, table_id: &str) -> Result<Vec<AuditRecord>, EngineError> {
        self.read(|ledger| audit::list_audit_records(ledger, table_id))
    }

    // ── Transactions ──────────────────────────────────────────────────────────

    /// Execute writes only when auditing is on.
    fn evaluate<T>(
        &self,
        f: impl FnOnce(&mut Ledger<'_, S>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        if self.config.audit_executions {
            self.atomically("execute", f)
        } else {
            self.read(f)
        }
    }

    /// Run `f` in a fresh transaction; commit on success, abort on error.
    fn atomically<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Ledger<'_, S>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut txn = self.store.begin()?;
        match f(&mut Ledger::new(&self.store, &mut txn)) {
            Ok(value) => {
                self.store.commit(txn)?;
                Ok(value)
            }
            Err(err) => {
                tracing::debug!(operation, code = err.code(), "operation failed, aborting");
                if let Err(abort_err) = self.store.abort(txn) {
                    tracing::error!(operation, error = %abort_err, "abort failed");
                }
                Err(err)
            }
        }
    }

    /// Run `f` in a transaction that is always aborted.
    fn read<T>(
        &self,
        f: impl FnOnce(&mut Ledger<'_, S>) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut txn = self.store.begin()?;
        let result = f(&mut Ledger::new(&self.store, &mut txn));
        if let Err(abort_err) = self.store.abort(txn) {
            tracing::error!(error = %abort_err, "abort of read transaction failed");
        }
        result
    }
}
