use super::{describe, expect_absent, expect_value, seed, Check};
use crate::KeyValueStore;

pub(super) fn checks<S: KeyValueStore>() -> Vec<Check<S>> {
    let mut checks: Vec<Check<S>> = Vec::new();
    checks.push(("read_own_writes", read_own_writes::<S>));
    checks.push(("uncommitted_write_invisible", uncommitted_write_invisible::<S>));
    checks.push(("snapshot_ignores_later_commit", snapshot_ignores_later_commit::<S>));
    checks
}

// ── Test implementations ──────────────────────────────────────────────────────

/// A transaction observes its own pending writes, including `exists`.
fn read_own_writes<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut txn = s.begin().map_err(describe)?;
    s.put(&mut txn, "k", b"v".to_vec()).map_err(describe)?;
    let value = s.get(&mut txn, "k").map_err(describe)?;
    let found = s.exists(&mut txn, "k").map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    expect_value(value, b"v", "k")?;
    if !found {
        return Err("exists returned false for a pending write".to_string());
    }
    Ok(())
}

fn uncommitted_write_invisible<S: KeyValueStore>(s: &S) -> Result<(), String> {
    let mut writer = s.begin().map_err(describe)?;
    s.put(&mut writer, "k", b"v".to_vec()).map_err(describe)?;

    let mut reader = s.begin().map_err(describe)?;
    let seen = s.get(&mut reader, "k").map_err(describe)?;
    s.abort(reader).map_err(describe)?;
    s.abort(writer).map_err(describe)?;
    expect_absent(seen, "k")
}

/// Reads stay on the state committed before `begin`.
fn snapshot_ignores_later_commit<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("k", b"before")])?;
    let mut reader = s.begin().map_err(describe)?;
    seed(s, &[("k", b"after")])?;
    let seen = s.get(&mut reader, "k").map_err(describe)?;
    s.abort(reader).map_err(describe)?;
    expect_value(seen, b"before", "k")
}
