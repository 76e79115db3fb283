use super::{describe, expect_absent, expect_value, read_committed, seed, Check};
use crate::KeyValueStore;

pub(super) fn checks<S: KeyValueStore>() -> Vec<Check<S>> {
    let mut checks: Vec<Check<S>> = Vec::new();
    checks.push(("committed_write_visible", committed_write_visible::<S>));
    checks.push(("multi_key_commit_all_visible", multi_key_commit_all_visible::<S>));
    checks.push(("aborted_write_not_visible", aborted_write_not_visible::<S>));
    checks.push(("dropped_txn_leaves_no_writes", dropped_txn_leaves_no_writes::<S>));
    checks.push(("abort_keeps_previous_value", abort_keeps_previous_value::<S>));
    checks
}

// ── Test implementations ──────────────────────────────────────────────────────

fn committed_write_visible<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("column-1", b"c1")])?;
    expect_value(read_committed(s, "column-1")?, b"c1", "column-1")
}

/// Every write in a committed transaction becomes visible together.
fn multi_key_commit_all_visible<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("a", b"1"), ("b", b"2"), ("c", b"3")])?;
    expect_value(read_committed(s, "a")?, b"1", "a")?;
    expect_value(read_committed(s, "b")?, b"2", "b")?;
    expect_value(read_committed(s, "c")?, b"3", "c")
}

fn aborted_write_not_visible<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut txn = s.begin().map_err(describe)?;
    s.put(&mut txn, "a", b"1".to_vec()).map_err(describe)?;
    s.put(&mut txn, "b", b"2".to_vec()).map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    expect_absent(read_committed(s, "a")?, "a")?;
    expect_absent(read_committed(s, "b")?, "b")
}

fn dropped_txn_leaves_no_writes<S: KeyValueStore>(s: &S) -> Result<(), String> {
    {
        let mut txn = s.begin().map_err(describe)?;
        s.put(&mut txn, "dropped", b"x".to_vec())
            .map_err(describe)?;
    }
    expect_absent(read_committed(s, "dropped")?, "dropped")
}

fn abort_keeps_previous_value<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("k", b"kept")])?;
    let mut txn = s.begin().map_err(describe)?;
    s.put(&mut txn, "k", b"replaced".to_vec())
        .map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    expect_value(read_committed(s, "k")?, b"kept", "k")
}
