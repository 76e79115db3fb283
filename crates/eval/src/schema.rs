//! Column and table schema management.
//!
//! Columns and tables are created once and never updated. A table holds
//! column ids; [`load_table`] resolves them in declared order.

use std::collections::BTreeSet;

use ledgerdmn_storage::KeyValueStore;

use crate::codec::Asset;
use crate::config::EngineConfig;
use crate::ledger::Ledger;
use crate::types::{
    ColumnSchema, ColumnType, DecisionTable, Direction, EngineError, HitPolicy, TableSchema,
};
use crate::validate::{check_domain, check_id};

/// CreateColumn: validate and persist a new column, returning its id.
pub fn create_column<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    config: &EngineConfig,
    id: &str,
    domain: Vec<String>,
    column_type: ColumnType,
    direction: Direction,
) -> Result<String, EngineError> {
    check_id("columnId", id)?;
    if ledger.exists(id)? {
        return Err(EngineError::AlreadyExists { id: id.to_string() });
    }
    let column = ColumnSchema::new(id, domain, column_type, direction);
    check_domain(&column, config.strict_string_domains)?;

    ledger.put(id, &Asset::Column(column))?;
    tracing::info!(column_id = id, %column_type, %direction, "column created");
    Ok(id.to_string())
}

/// CreateTable: validate and persist a new table, returning its id.
///
/// Every referenced column must exist (`NotFound` otherwise), appear once,
/// and the set must contain at least one INPUT and one OUTPUT column.
pub fn create_table<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    id: &str,
    name: &str,
    column_ids: Vec<String>,
    hit_policy: HitPolicy,
) -> Result<String, EngineError> {
    check_id("tableId", id)?;
    if ledger.exists(id)? {
        return Err(EngineError::AlreadyExists { id: id.to_string() });
    }

    let mut seen = BTreeSet::new();
    for column_id in &column_ids {
        if !seen.insert(column_id.as_str()) {
            return Err(EngineError::validation(
                "columnIds",
                format!("column '{}' is listed more than once", column_id),
            ));
        }
    }

    let mut columns = Vec::with_capacity(column_ids.len());
    for column_id in &column_ids {
        columns.push(ledger.get_column(column_id)?);
    }
    if !columns.iter().any(ColumnSchema::is_input) {
        return Err(EngineError::validation(
            "columnIds",
            "a table needs at least one INPUT column",
        ));
    }
    if !columns.iter().any(ColumnSchema::is_output) {
        return Err(EngineError::validation(
            "columnIds",
            "a table needs at least one OUTPUT column",
        ));
    }

    let table = TableSchema {
        id: id.to_string(),
        name: name.to_string(),
        column_ids,
        hit_policy,
    };
    ledger.put(id, &Asset::Table(table))?;
    tracing::info!(
        table_id = id,
        columns = columns.len(),
        %hit_policy,
        "table created"
    );
    Ok(id.to_string())
}

pub fn read_column<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    id: &str,
) -> Result<ColumnSchema, EngineError> {
    ledger.get_column(id)
}

pub fn read_table<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    id: &str,
) -> Result<TableSchema, EngineError> {
    ledger.get_table(id)
}

/// ReadTableColumns: every referenced column, in the table's declared order.
pub fn read_table_columns<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    table_id: &str,
) -> Result<Vec<ColumnSchema>, EngineError> {
    Ok(load_table(ledger, table_id)?.columns)
}

/// Load a table with its columns resolved.
pub fn load_table<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    table_id: &str,
) -> Result<DecisionTable, EngineError> {
    let schema = ledger.get_table(table_id)?;
    let mut columns = Vec::with_capacity(schema.column_ids.len());
    for column_id in &schema.column_ids {
        columns.push(ledger.get_column(column_id)?);
    }
    Ok(DecisionTable { schema, columns })
}

/// AssetExists: whether anything is stored under `id`.
pub fn asset_exists<S: KeyValueStore>(
    ledger: &mut Ledger<'_, S>,
    id: &str,
) -> Result<bool, EngineError> {
    ledger.exists(id)
}
