//! Runs the host conformance suite against the in-memory reference host.

use ledgerdmn_storage::conformance::run_conformance_suite;
use ledgerdmn_storage::MemoryStore;

#[test]
fn memory_store_passes_conformance_suite() {
    let report = run_conformance_suite(MemoryStore::new);
    assert_eq!(report.failed, 0, "{report}");
    assert_eq!(report.total, 22);
}

#[test]
fn report_lists_every_category() {
    let report = run_conformance_suite(MemoryStore::new);
    for category in ["read", "commit", "isolation", "scan", "concurrent"] {
        assert!(
            report.results.iter().any(|r| r.category == category),
            "missing category {}",
            category
        );
    }
}
