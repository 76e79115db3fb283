use super::{describe, seed, Check};
use crate::{Entry, KeyValueStore};

pub(super) fn checks<S: KeyValueStore>() -> Vec<Check<S>> {
    let mut checks: Vec<Check<S>> = Vec::new();
    checks.push(("scan_returns_ascending_keys", scan_returns_ascending_keys::<S>));
    checks.push(("scan_respects_prefix_bounds", scan_respects_prefix_bounds::<S>));
    checks.push(("scan_includes_pending_writes", scan_includes_pending_writes::<S>));
    checks.push(("scan_unknown_prefix_is_empty", scan_unknown_prefix_is_empty::<S>));
    checks.push(("count_agrees_with_scan", count_agrees_with_scan::<S>));
    checks
}

fn scan<S: KeyValueStore>(s: &S, prefix: &str) -> Result<Vec<Entry>, String> {
    let mut txn = s.begin().map_err(describe)?;
    let entries = s.scan_prefix(&mut txn, prefix).map_err(describe)?;
    s.abort(txn).map_err(describe)?;
    Ok(entries)
}

fn keys(entries: &[Entry]) -> Vec<&str> {
    entries.iter().map(|(k, _)| k.as_str()).collect()
}

// ── Test implementations ──────────────────────────────────────────────────────

/// Keys inserted out of order come back sorted.
fn scan_returns_ascending_keys<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(
        s,
        &[
            ("rule/t/0002", b"2"),
            ("rule/t/0000", b"0"),
            ("rule/t/0001", b"1"),
        ],
    )?;
    let entries = scan(s, "rule/t/")?;
    let got = keys(&entries);
    if got != ["rule/t/0000", "rule/t/0001", "rule/t/0002"] {
        return Err(format!("unexpected scan order: {:?}", got));
    }
    Ok(())
}

/// Neighbouring keys that share a shorter prefix are excluded.
fn scan_respects_prefix_bounds<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(
        s,
        &[
            ("rule/t", b"x"),
            ("rule/t/0000", b"0"),
            ("rule/t2/0000", b"y"),
            ("rule/u/0000", b"z"),
        ],
    )?;
    let entries = scan(s, "rule/t/")?;
    let got = keys(&entries);
    if got != ["rule/t/0000"] {
        return Err(format!("scan leaked keys outside prefix: {:?}", got));
    }
    Ok(())
}

fn scan_includes_pending_writes<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("p/1", b"committed")])?;
    let mut txn = s.begin().map_err(describe)?;
    s.put(&mut txn, "p/0", b"pending".to_vec())
        .map_err(describe)?;
    s.put(&mut txn, "p/1", b"overwritten".to_vec())
        .map_err(describe)?;
    let entries = s.scan_prefix(&mut txn, "p/").map_err(describe)?;
    s.abort(txn).map_err(describe)?;

    let expected: Vec<Entry> = vec![
        ("p/0".to_string(), b"pending".to_vec()),
        ("p/1".to_string(), b"overwritten".to_vec()),
    ];
    if entries != expected {
        return Err(format!("unexpected scan result: {:?}", keys(&entries)));
    }
    Ok(())
}

fn scan_unknown_prefix_is_empty<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("a", b"1")])?;
    let entries = scan(s, "zzz")?;
    if !entries.is_empty() {
        return Err(format!("expected no entries, got {:?}", keys(&entries)));
    }
    Ok(())
}

/// `count_prefix` sees the same merged view as `scan_prefix`.
fn count_agrees_with_scan<S: KeyValueStore>(s: &S) -> Result<(), String> {
    seed(s, &[("p/1", b"1"), ("p/2", b"2"), ("q/1", b"x")])?;
    let mut txn = s.begin().map_err(describe)?;
    s.put(&mut txn, "p/2", b"again".to_vec()).map_err(describe)?;
    s.put(&mut txn, "p/3", b"3".to_vec()).map_err(describe)?;
    let counted = s.count_prefix(&mut txn, "p/").map_err(describe)?;
    let scanned = s.scan_prefix(&mut txn, "p/").map_err(describe)?.len() as u64;
    s.abort(txn).map_err(describe)?;
    if counted != 3 || scanned != 3 {
        return Err(format!("count {} and scan {} should both be 3", counted, scanned));
    }
    Ok(())
}
