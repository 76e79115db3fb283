//! Conformance test suite for `KeyValueStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any host
//! implementation can run to verify the guarantees the decision engine relies
//! on. The suite covers:
//!
//! - **Reads**: missing keys, `exists`, overwrite semantics
//! - **Commit / abort**: all-or-nothing visibility of a transaction's writes
//! - **Isolation**: reads observe the snapshot taken at `begin`
//! - **Prefix scans**: ascending key order, prefix bounds, pending writes,
//!   counts
//! - **Concurrency**: of two overlapping read-then-write transactions,
//!   exactly one commits
//!
//! # Usage
//!
//! Host crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use ledgerdmn_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn ledger_host_conformance() {
//!     let report = run_conformance_suite(|| create_test_ledger_store());
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod commit;
mod concurrent;
mod isolation;
mod read;
mod scan;

use std::fmt;

use crate::{KeyValueStore, StorageError};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "read", "commit", "scan").
    pub category: String,
    /// Test name (e.g. "get_missing_key_returns_none").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// A named check run against a fresh store.
type Check<S> = (&'static str, fn(&S) -> Result<(), String>);

/// Run the full conformance suite against a host implementation.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store, ensuring test isolation.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: KeyValueStore,
    F: Fn() -> S,
{
    let mut results = Vec::new();

    results.extend(run_category("read", read::checks(), &factory));
    results.extend(run_category("commit", commit::checks(), &factory));
    results.extend(run_category("isolation", isolation::checks(), &factory));
    results.extend(run_category("scan", scan::checks(), &factory));
    results.extend(run_category("concurrent", concurrent::checks(), &factory));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

fn run_category<S, F>(category: &str, checks: Vec<Check<S>>, factory: &F) -> Vec<TestResult>
where
    S: KeyValueStore,
    F: Fn() -> S,
{
    checks
        .into_iter()
        .map(|(name, check)| {
            let store = factory();
            TestResult::from_result(category, name, check(&store))
        })
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn describe(e: StorageError) -> String {
    e.to_string()
}

/// Write `entries` in one transaction and commit it.
fn seed<S: KeyValueStore>(store: &S, entries: &[(&str, &[u8])]) -> Result<(), String> {
    let mut txn = store.begin().map_err(describe)?;
    for (key, value) in entries {
        store.put(&mut txn, key, value.to_vec()).map_err(describe)?;
    }
    store.commit(txn).map_err(describe)
}

/// Read `key` in a fresh transaction, then abort it.
fn read_committed<S: KeyValueStore>(store: &S, key: &str) -> Result<Option<Vec<u8>>, String> {
    let mut txn = store.begin().map_err(describe)?;
    let value = store.get(&mut txn, key).map_err(describe)?;
    store.abort(txn).map_err(describe)?;
    Ok(value)
}

fn expect_value(actual: Option<Vec<u8>>, expected: &[u8], key: &str) -> Result<(), String> {
    match actual {
        Some(ref v) if v.as_slice() == expected => Ok(()),
        other => Err(format!(
            "key '{}': expected {:?}, got {:?}",
            key,
            String::from_utf8_lossy(expected),
            other.as_deref().map(String::from_utf8_lossy)
        )),
    }
}

fn expect_absent(actual: Option<Vec<u8>>, key: &str) -> Result<(), String> {
    match actual {
        None => Ok(()),
        Some(v) => Err(format!(
            "key '{}': expected no value, got {:?}",
            key,
            String::from_utf8_lossy(&v)
        )),
    }
}
