use std::path::PathBuf;

use bhulekh_recon::engine::run_detection;
use bhulekh_recon::ingest::{load_parcels_csv, load_records_csv};
use bhulekh_recon::model::{Actor, AuditAction, DiscrepancyStatus, DiscrepancyType, EntityType, Role, Severity};
use bhulekh_recon::workflow::WorkflowEngine;
use bhulekh_recon::{DetectionConfig, MemoryStore, ReconError};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

fn seeded_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    let importer = Actor::system();
    for parcel in load_parcels_csv("parcels.csv", &read_fixture("parcels.csv")).unwrap() {
        store.import_parcel(parcel, &importer);
    }
    for record in load_records_csv("records.csv", &read_fixture("records.csv")).unwrap() {
        store.import_record(record, &importer);
    }
    store
}

#[test]
fn config_fixture_parses() {
    let config = DetectionConfig::from_toml(&read_fixture("detect.toml")).unwrap();
    assert_eq!(config.area_tolerance_major_pct, 15.0);
    assert_eq!(config.weights.duplicate_plot_id, 35);
}

#[test]
fn detection_over_csv_fixtures() {
    let mut store = seeded_store();
    let stats = run_detection(&mut store, &DetectionConfig::default(), None);

    assert_eq!(stats.parcels_checked, 4);
    assert_eq!(stats.records_checked, 4);
    assert_eq!(stats.created, 5);
    assert_eq!(stats.by_type.get(&DiscrepancyType::AreaMismatch), Some(&1));
    // Both bilingual records: the crude cross-script fold never correlates
    // Devanagari with Latin, so each raises a low-similarity flag.
    assert_eq!(stats.by_type.get(&DiscrepancyType::NameMismatch), Some(&2));
    assert_eq!(stats.by_type.get(&DiscrepancyType::MissingParcel), Some(&1));
    assert_eq!(stats.by_type.get(&DiscrepancyType::MissingRecord), Some(&1));

    // 5100 vs 4000 recorded is a 27.5% difference.
    let area = store
        .open_discrepancy_for("PLT-002", DiscrepancyType::AreaMismatch)
        .unwrap();
    assert_eq!(area.score, 40);
    assert_eq!(area.severity, Severity::Minor);

    let missing_parcel = store
        .open_discrepancy_for("PLT-004", DiscrepancyType::MissingParcel)
        .unwrap();
    assert_eq!(missing_parcel.score, 65);
    assert_eq!(missing_parcel.severity, Severity::Major);

    // Name check is within-record: PLT-003 has no English name, so no flag.
    assert!(store
        .open_discrepancy_for("PLT-003", DiscrepancyType::NameMismatch)
        .is_none());
    let name = store
        .open_discrepancy_for("PLT-001", DiscrepancyType::NameMismatch)
        .unwrap();
    assert_eq!(name.score, 30);
}

#[test]
fn second_run_is_idempotent() {
    let mut store = seeded_store();
    let config = DetectionConfig::default();
    let first = run_detection(&mut store, &config, None);
    assert_eq!(first.created, 5);

    let second = run_detection(&mut store, &config, None);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 5);
    assert_eq!(store.discrepancies().count(), 5);
}

#[test]
fn queue_ranks_by_score_descending() {
    let mut store = seeded_store();
    run_detection(&mut store, &DetectionConfig::default(), None);

    let queue = store.priority_queue(None, None, 10);
    let scores: Vec<i64> = queue.iter().map(|d| d.score).collect();
    assert_eq!(scores, vec![65, 60, 40, 30, 30]);

    let v2_only = store.priority_queue(Some("V002"), None, 10);
    assert_eq!(v2_only.len(), 1);
    assert_eq!(v2_only[0].plot_id, "PLT-005");
}

#[test]
fn review_cycle_with_role_gates_and_audit() {
    let mut store = seeded_store();
    run_detection(&mut store, &DetectionConfig::default(), None);
    let id = store
        .open_discrepancy_for("PLT-002", DiscrepancyType::AreaMismatch)
        .unwrap()
        .id;

    let workflow = WorkflowEngine::standard();
    let operator = Actor::new("ops1", Role::Operator);
    let supervisor = Actor::new("sup1", Role::Supervisor);

    // Operator can pick it up but not close it.
    workflow
        .transition(&mut store, id, DiscrepancyStatus::UnderReview, &operator, None)
        .unwrap();
    let denied = workflow
        .transition(&mut store, id, DiscrepancyStatus::Resolved, &operator, None)
        .unwrap_err();
    assert!(matches!(denied, ReconError::RoleNotPermitted { .. }));

    let resolved = workflow
        .transition(
            &mut store,
            id,
            DiscrepancyStatus::Resolved,
            &supervisor,
            Some("re-measured on site"),
        )
        .unwrap();
    assert_eq!(resolved.resolved_by.as_deref(), Some("sup1"));

    // Two status changes in the trail, newest first, nothing else mutated.
    let trail = store.ledger().entity_history(EntityType::Discrepancy, id, 10);
    let status_changes: Vec<_> = trail
        .iter()
        .filter(|e| e.action == AuditAction::StatusChange)
        .collect();
    assert_eq!(status_changes.len(), 2);
    assert_eq!(
        status_changes[0].new_values.as_ref().unwrap()["status"],
        "resolved"
    );

    // Resolved items leave the queue; re-detection recreates with repeat
    // history factored in (40 + 5 repeat - 10 previously resolved).
    assert_eq!(store.priority_queue(None, None, 10).len(), 4);
    let stats = run_detection(&mut store, &DetectionConfig::default(), None);
    assert_eq!(stats.created, 1);
    let recreated = store
        .open_discrepancy_for("PLT-002", DiscrepancyType::AreaMismatch)
        .unwrap();
    assert_ne!(recreated.id, id);
    assert_eq!(recreated.score, 35);
}

#[test]
fn snapshot_survives_full_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.json");

    let mut store = seeded_store();
    run_detection(&mut store, &DetectionConfig::default(), None);
    let ledger_len = store.ledger().len();
    store.save(&path).unwrap();

    let restored = MemoryStore::load(&path).unwrap();
    assert_eq!(restored.discrepancies().count(), 5);
    assert_eq!(restored.records().count(), 4);
    assert_eq!(restored.parcels().count(), 4);
    assert_eq!(restored.ledger().len(), ledger_len);

    // The queue comes back in the same order.
    let scores: Vec<i64> = restored
        .priority_queue(None, None, 10)
        .iter()
        .map(|d| d.score)
        .collect();
    assert_eq!(scores, vec![65, 60, 40, 30, 30]);
}
