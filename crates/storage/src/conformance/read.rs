use super::{describe, expect_absent, expect_value, read_committed, seed, Check};
use crate::KeyValueStore;

pub(super) fn checks<S: KeyValueStore>() -> Vec<Check<S>> {
    let mut checks: Vec<Check<S>> = Vec::new();
    checks.push(("get_missing_key_returns_none", get_missing_key_returns_none::<S>));
    checks.push(("exists_false_for_missing_key", exists_false_for_missing_key::<S>));
    checks.push(("exists_true_after_commit", exists_true_after_commit::<S>));
    checks.push(("put_overwrites_previous_value", put_overwrites_previous_value::<S>));
    checks.push(("values_are_byte_exact", values_are_byte_exact::<S>));
    checks
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A fresh store has nothing under any key.
fn get_missing_key_returns_none<S: KeyValueStore>(s: &S) -> Result<(), String> {
    expect_absent(read_committed(s, "absent")?, "absent")
}

fn exists_false_for_missing_key<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut txn = s.begin().map_err(describe)?;
    let found = s.exists(&mut txn, "absent").map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    if found {
        return Err("exists returned true for a key never written".to_string());
    }
    Ok(())
}

fn exists_true_after_commit<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("table-1", b"{}")])?;
    let mut txn = s.begin().map_err(describe)?;
    let found = s.exists(&mut txn, "table-1").map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    if !found {
        return Err("exists returned false for a committed key".to_string());
    }
    Ok(())
}

/// A second committed put replaces the first.
fn put_overwrites_previous_value<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("k", b"first")])?;
    seed(s, &[("k", b"second")])?;
    expect_value(read_committed(s, "k")?, b"second", "k")
}

/// Stored bytes come back unchanged, including non-UTF-8 and NUL bytes.
fn values_are_byte_exact<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let value: &[u8] = &[0x00, 0xff, 0x7b, 0x00, 0x7d];
    seed(s, &[("binary", value)])?;
    expect_value(read_committed(s, "binary")?, value, "binary")
}
