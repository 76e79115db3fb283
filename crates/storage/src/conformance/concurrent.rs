use super::{describe, expect_value, read_committed, seed, Check};
use crate::{KeyValueStore, StorageError};

pub(super) fn checks<S: KeyValueStore>() -> Vec<Check<S>> {
    let mut checks: Vec<Check<S>> = Vec::new();
    checks.push(("prefix_append_exactly_one_wins", prefix_append_exactly_one_wins::<S>));
    checks.push(("create_if_absent_exactly_one_wins", create_if_absent_exactly_one_wins::<S>));
    checks.push(("disjoint_transactions_all_commit", disjoint_transactions_all_commit::<S>));
    checks.push(("retry_after_conflict_succeeds", retry_after_conflict_succeeds::<S>));
    checks
}

fn expect_conflict(result: Result<(), StorageError>) -> Result<(), String> {
    match result {
        Err(StorageError::Conflict { .. }) => Ok(()),
        Err(other) => Err(format!("expected a conflict, got error: {}", other)),
        Ok(()) => Err("second overlapping commit succeeded".to_string()),
    }
}

/// Count the prefix, then write the next slot.
fn append<S: KeyValueStore>(s: &S, txn: &mut S::Txn, value: &[u8]) -> Result<String, String> {
    let n = s.count_prefix(txn, "rule/t/").map_err(describe)?;
    let key = format!("rule/t/{:04}", n);
    s.put(txn, &key, value.to_vec()).map_err(describe)?;
    Ok(key)
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Two transactions that size the same prefix and append to it: the first
/// commit wins, the second is rejected and its write discarded.
fn prefix_append_exactly_one_wins<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut a = s.begin().map_err(describe)?;
    let mut b = s.begin().map_err(describe)?;
    let key_a = append(s, &mut a, b"a")?;
    let key_b = append(s, &mut b, b"b")?;
    if key_a != key_b {
        return Err(format!("snapshots disagree: {} vs {}", key_a, key_b));
    }
    s.commit(a).map_err(describe)?;
    expect_conflict(s.commit(b))?;
    expect_value(read_committed(s, &key_a)?, b"a", &key_a)
}

fn create_if_absent_exactly_one_wins<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut a = s.begin().map_err(describe)?;
    let mut b = s.begin().map_err(describe)?;
    for (txn, value) in [(&mut a, b"a"), (&mut b, b"b")] {
        if s.exists(txn, "column-1").map_err(describe)? {
            return Err("key exists before any commit".to_string());
        }
        s.put(txn, "column-1", value.to_vec()).map_err(describe)?;
    }
    s.commit(a).map_err(describe)?;
    expect_conflict(s.commit(b))?;
    expect_value(read_committed(s, "column-1")?, b"a", "column-1")
}

fn disjoint_transactions_all_commit<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("other/0", b"seed")])?;
    let mut a = s.begin().map_err(describe)?;
    let mut b = s.begin().map_err(describe)?;
    append(s, &mut a, b"a")?;
    s.get(&mut b, "column-2").map_err(describe)?;
    s.put(&mut b, "column-2", b"b".to_vec()).map_err(describe)?;
    s.commit(a).map_err(describe)?;
    s.commit(b).map_err(describe)?;
    expect_value(read_committed(s, "rule/t/0000")?, b"a", "rule/t/0000")?;
    expect_value(read_committed(s, "column-2")?, b"b", "column-2")
}

/// The loser of a conflict sees the winner's write when it tries again.
fn retry_after_conflict_succeeds<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut a = s.begin().map_err(describe)?;
    let mut b = s.begin().map_err(describe)?;
    append(s, &mut a, b"a")?;
    append(s, &mut b, b"b")?;
    s.commit(a).map_err(describe)?;
    expect_conflict(s.commit(b))?;

    let mut retry = s.begin().map_err(describe)?;
    let key = append(s, &mut retry, b"b")?;
    s.commit(retry).map_err(describe)?;
    if key != "rule/t/0001" {
        return Err(format!("retry wrote {}, expected rule/t/0001", key));
    }
    expect_value(read_committed(s, "rule/t/0000")?, b"a", "rule/t/0000")?;
    expect_value(read_committed(s, &key)?, b"b", &key)
}
