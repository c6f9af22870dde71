//! Detection run: cross-check parcels against current land records and
//! upsert one open discrepancy per (plot, type).
//!
//! Runs are idempotent. Re-detecting an already-open discrepancy updates it
//! only when the score moved by more than the hysteresis band; otherwise
//! the run leaves it untouched. Records the engine writes are audited under
//! the system actor.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::area::compare_areas;
use crate::config::DetectionConfig;
use crate::model::{
    Actor, AuditAction, Discrepancy, DiscrepancyDetails, DiscrepancyStatus, DiscrepancyType,
    EntityType, LandRecord, Parcel, Severity,
};
use crate::name::compare_names;
use crate::severity::{compute_score, ScoreInput, SeverityScore};
use crate::store::MemoryStore;

/// Score movement below which a re-detected open discrepancy is left
/// alone, so noise in the inputs does not churn the queue.
pub const SCORE_HYSTERESIS: i64 = 5;

#[derive(Debug, Default, Serialize)]
pub struct DetectionStats {
    pub parcels_checked: usize,
    pub records_checked: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub by_type: BTreeMap<DiscrepancyType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
}

impl DetectionStats {
    pub fn verdicts(&self) -> usize {
        self.created + self.updated + self.unchanged
    }
}

/// One detected inconsistency, before scoring and upsert.
#[derive(Debug)]
struct Verdict {
    kind: DiscrepancyType,
    parcel_id: Option<Uuid>,
    record_id: Option<Uuid>,
    plot_id: String,
    village_code: Option<String>,
    explanation: String,
    explanation_hindi: String,
    details: DiscrepancyDetails,
    input: ScoreInput,
}

/// Run detection, optionally scoped to one village. Records carry no
/// village of their own, so the orphan-record scan only runs unscoped.
pub fn run_detection(
    store: &mut MemoryStore,
    config: &DetectionConfig,
    village: Option<&str>,
) -> DetectionStats {
    let span = tracing::info_span!("detection_run", village = village.unwrap_or("all"));
    let _guard = span.enter();

    let mut stats = DetectionStats::default();

    // Index both sides by plot.
    let mut parcels_by_plot: BTreeMap<String, Vec<Parcel>> = BTreeMap::new();
    for parcel in store.parcels() {
        if village.is_some_and(|v| parcel.village_code != v) {
            continue;
        }
        parcels_by_plot
            .entry(parcel.plot_id.clone())
            .or_default()
            .push(parcel.clone());
        stats.parcels_checked += 1;
    }
    let mut records_by_plot: BTreeMap<String, Vec<LandRecord>> = BTreeMap::new();
    for record in store.current_records() {
        if village.is_some() && !parcels_by_plot.contains_key(&record.plot_id) {
            continue;
        }
        records_by_plot
            .entry(record.plot_id.clone())
            .or_default()
            .push(record.clone());
        stats.records_checked += 1;
    }

    let mut verdicts: Vec<Verdict> = Vec::new();

    for (plot_id, parcels) in &parcels_by_plot {
        let records = records_by_plot.get(plot_id).map_or(&[][..], Vec::as_slice);

        if parcels.len() > 1 {
            verdicts.push(duplicate_parcel_verdict(plot_id, parcels));
        }
        // With duplicate digitizations, check against the one that carries a
        // measured area so an empty twin does not mask an area mismatch.
        let parcel = parcels
            .iter()
            .find(|p| p.computed_area_sqm.is_some())
            .unwrap_or(&parcels[0]);

        if records.is_empty() {
            verdicts.push(missing_record_verdict(parcel));
            continue;
        }
        // A duplicate-record flag comes on top of the per-record checks,
        // not in place of them.
        if records.len() > 1 {
            verdicts.push(duplicate_record_verdict(parcel, records));
        }
        for record in records {
            if let Some(v) = area_verdict(parcel, record, config) {
                verdicts.push(v);
            }
            if let Some(v) = name_verdict(parcel, record, config) {
                verdicts.push(v);
            }
        }
    }

    // Records whose plot has no geometry at all.
    for (plot_id, records) in &records_by_plot {
        if !parcels_by_plot.contains_key(plot_id) {
            for record in records {
                verdicts.push(missing_parcel_verdict(record));
            }
        }
    }

    for verdict in verdicts {
        let history = store.history_for(&verdict.plot_id, verdict.kind);
        let mut input = verdict.input.clone();
        input.previous_occurrences = history.previous_occurrences;
        input.previously_resolved = history.previously_resolved;
        let score = compute_score(&config.weights, &input);

        *stats.by_type.entry(verdict.kind).or_default() += 1;
        *stats.by_severity.entry(score.severity).or_default() += 1;
        upsert(store, verdict, score, &mut stats);
    }

    tracing::info!(
        parcels = stats.parcels_checked,
        records = stats.records_checked,
        created = stats.created,
        updated = stats.updated,
        unchanged = stats.unchanged,
        "detection run complete"
    );
    stats
}

fn upsert(store: &mut MemoryStore, verdict: Verdict, score: SeverityScore, stats: &mut DetectionStats) {
    let actor = Actor::system();
    let now = Utc::now();

    let existing = store
        .open_discrepancy_for(&verdict.plot_id, verdict.kind)
        .cloned();

    match existing {
        Some(mut open) => {
            if (score.total_score - open.score).abs() <= SCORE_HYSTERESIS {
                stats.unchanged += 1;
                return;
            }
            let old_score = open.score;
            let old_severity = open.severity;
            open.score = score.total_score;
            open.severity = score.severity;
            open.explanation = verdict.explanation;
            open.explanation_hindi = verdict.explanation_hindi;
            open.details = verdict.details;
            open.updated_at = now;
            let id = open.id;
            store.replace_discrepancy(open);
            store.ledger_mut().record(
                EntityType::Discrepancy,
                id,
                AuditAction::Update,
                Some(json!({ "score": old_score, "severity": old_severity })),
                Some(json!({ "score": score.total_score, "severity": score.severity })),
                &actor,
                None,
            );
            tracing::debug!(discrepancy = %id, old_score, new_score = score.total_score, "rescored");
            stats.updated += 1;
        }
        None => {
            let discrepancy = Discrepancy {
                id: Uuid::new_v4(),
                parcel_id: verdict.parcel_id,
                record_id: verdict.record_id,
                plot_id: verdict.plot_id,
                village_code: verdict.village_code,
                kind: verdict.kind,
                severity: score.severity,
                status: DiscrepancyStatus::Open,
                score: score.total_score,
                explanation: verdict.explanation,
                explanation_hindi: verdict.explanation_hindi,
                details: verdict.details,
                resolution_remarks: None,
                resolved_by: None,
                resolved_at: None,
                detected_at: now,
                updated_at: now,
            };
            let id = discrepancy.id;
            store.ledger_mut().record(
                EntityType::Discrepancy,
                id,
                AuditAction::Create,
                None,
                Some(json!({
                    "kind": discrepancy.kind,
                    "score": discrepancy.score,
                    "severity": discrepancy.severity,
                    "plot_id": discrepancy.plot_id,
                })),
                &actor,
                None,
            );
            store.insert_discrepancy(discrepancy);
            tracing::debug!(discrepancy = %id, "created");
            stats.created += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict builders
// ---------------------------------------------------------------------------

fn area_verdict(parcel: &Parcel, record: &LandRecord, config: &DetectionConfig) -> Option<Verdict> {
    // The check only runs with a value on each side; a missing area is a
    // completeness gap scored on the other verdicts, not a mismatch.
    let (computed, recorded) = match (parcel.computed_area_sqm, record.recorded_area_sqm) {
        (Some(c), Some(r)) => (c, r),
        _ => return None,
    };
    let cmp = compare_areas(
        Some(computed),
        Some(recorded),
        config.area_tolerance_minor_pct,
        config.area_tolerance_major_pct,
    );
    if cmp.matches {
        return None;
    }

    let mut input = ScoreInput::for_kind(DiscrepancyType::AreaMismatch);
    input.computed_sqm = Some(computed);
    input.recorded_sqm = Some(recorded);
    input.has_father_name = record.has_father_name();

    Some(Verdict {
        kind: DiscrepancyType::AreaMismatch,
        parcel_id: Some(parcel.id),
        record_id: Some(record.id),
        plot_id: parcel.plot_id.clone(),
        village_code: Some(parcel.village_code.clone()),
        explanation: cmp.explanation.clone(),
        explanation_hindi: cmp.explanation_hindi.clone(),
        details: DiscrepancyDetails::Area {
            computed_sqm: computed,
            recorded_sqm: recorded,
            difference_sqm: cmp.difference_sqm,
            difference_percent: cmp.difference_percent,
        },
        input,
    })
}

/// Consistency check between the two scripts of the record's own owner
/// name. Only runs when both were transcribed; the cross-script strategy
/// does the comparison.
fn name_verdict(
    parcel: &Parcel,
    record: &LandRecord,
    config: &DetectionConfig,
) -> Option<Verdict> {
    let english = record.owner_name_english.as_deref()?;

    let owner = compare_names(Some(&record.owner_name_hindi), None, None, Some(english));
    if owner.score >= config.name_similarity_threshold {
        return None;
    }

    let mut input = ScoreInput::for_kind(DiscrepancyType::NameMismatch);
    input.name_similarity = Some(owner.score);
    input.computed_sqm = parcel.computed_area_sqm;
    input.recorded_sqm = record.recorded_area_sqm;
    input.has_father_name = record.has_father_name();

    Some(Verdict {
        kind: DiscrepancyType::NameMismatch,
        parcel_id: Some(parcel.id),
        record_id: Some(record.id),
        plot_id: record.plot_id.clone(),
        village_code: Some(parcel.village_code.clone()),
        explanation: format!("Hindi and English names differ: {}", owner.explanation),
        explanation_hindi: format!(
            "हिंदी और अंग्रेजी नाम में अंतर: {}",
            owner.explanation_hindi
        ),
        details: DiscrepancyDetails::Name {
            hindi_name: record.owner_name_hindi.clone(),
            english_name: english.to_string(),
            similarity_score: owner.score,
            match_type: owner.match_type.to_string(),
        },
        input,
    })
}

fn missing_record_verdict(parcel: &Parcel) -> Verdict {
    let mut input = ScoreInput::for_kind(DiscrepancyType::MissingRecord);
    input.has_record = false;
    input.computed_sqm = parcel.computed_area_sqm;

    Verdict {
        kind: DiscrepancyType::MissingRecord,
        parcel_id: Some(parcel.id),
        record_id: None,
        plot_id: parcel.plot_id.clone(),
        village_code: Some(parcel.village_code.clone()),
        explanation: format!("Parcel {} has no ownership record", parcel.plot_id),
        explanation_hindi: format!("भूखंड {} का कोई स्वामित्व रिकॉर्ड नहीं है", parcel.plot_id),
        details: DiscrepancyDetails::MissingRecord { village_code: parcel.village_code.clone() },
        input,
    }
}

fn missing_parcel_verdict(record: &LandRecord) -> Verdict {
    let mut input = ScoreInput::for_kind(DiscrepancyType::MissingParcel);
    input.has_geometry = false;
    input.recorded_sqm = record.recorded_area_sqm;
    input.has_father_name = record.has_father_name();

    Verdict {
        kind: DiscrepancyType::MissingParcel,
        parcel_id: None,
        record_id: Some(record.id),
        plot_id: record.plot_id.clone(),
        village_code: None,
        explanation: format!("Record for plot {} has no mapped parcel", record.plot_id),
        explanation_hindi: format!("प्लॉट {} के रिकॉर्ड का कोई नक्शा भूखंड नहीं है", record.plot_id),
        details: DiscrepancyDetails::MissingParcel {
            owner_name: record.owner_name_hindi.clone(),
        },
        input,
    }
}

fn duplicate_record_verdict(parcel: &Parcel, records: &[LandRecord]) -> Verdict {
    let input = ScoreInput::for_kind(DiscrepancyType::DuplicateRecord);
    Verdict {
        kind: DiscrepancyType::DuplicateRecord,
        parcel_id: Some(parcel.id),
        record_id: None,
        plot_id: parcel.plot_id.clone(),
        village_code: Some(parcel.village_code.clone()),
        explanation: format!(
            "{} current records claim plot {}",
            records.len(),
            parcel.plot_id
        ),
        explanation_hindi: format!(
            "{} वर्तमान रिकॉर्ड प्लॉट {} पर दावा करते हैं",
            records.len(),
            parcel.plot_id
        ),
        details: DiscrepancyDetails::DuplicateRecord {
            record_count: records.len(),
            record_ids: records.iter().map(|r| r.id).collect(),
        },
        input,
    }
}

fn duplicate_parcel_verdict(plot_id: &str, parcels: &[Parcel]) -> Verdict {
    let input = ScoreInput::for_kind(DiscrepancyType::DuplicateParcel);
    Verdict {
        kind: DiscrepancyType::DuplicateParcel,
        parcel_id: Some(parcels[0].id),
        record_id: None,
        plot_id: plot_id.to_string(),
        village_code: Some(parcels[0].village_code.clone()),
        explanation: format!("{} parcels digitized for plot {plot_id}", parcels.len()),
        explanation_hindi: format!(
            "प्लॉट {plot_id} के लिए {} भूखंड डिजिटाइज़ किए गए",
            parcels.len()
        ),
        details: DiscrepancyDetails::DuplicateParcel {
            parcel_ids: parcels.iter().map(|p| p.id).collect(),
        },
        input,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel(plot_id: &str, area: Option<f64>) -> Parcel {
        Parcel {
            id: Uuid::new_v4(),
            plot_id: plot_id.into(),
            village_code: "V001".into(),
            computed_area_sqm: area,
            updated_at: Utc::now(),
        }
    }

    fn record(plot_id: &str, owner: &str, area: Option<f64>) -> LandRecord {
        LandRecord {
            id: Uuid::new_v4(),
            plot_id: plot_id.into(),
            parcel_id: None,
            owner_name_hindi: owner.into(),
            owner_name_english: None,
            father_name_hindi: Some("मोहन लाल".into()),
            father_name_english: None,
            recorded_area_sqm: area,
            recorded_area_text: None,
            khata_number: None,
            khasra_number: None,
            version: 0,
            is_current: false,
            previous_version_id: None,
            created_at: Utc::now(),
        }
    }

    fn seeded(parcel_area: Option<f64>, record_area: Option<f64>) -> MemoryStore {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", parcel_area), &actor);
        store.import_record(record("PLT-001", "राम शर्मा", record_area), &actor);
        store
    }

    #[test]
    fn consistent_plot_raises_nothing() {
        let mut store = seeded(Some(2500.0), Some(2500.0));
        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.verdicts(), 0);
        assert_eq!(store.discrepancies().count(), 0);
    }

    #[test]
    fn area_mismatch_created_once_then_stable() {
        // 100 vs 80: 25% difference, above tolerance.
        let mut store = seeded(Some(100.0), Some(80.0));
        let config = DetectionConfig::default();

        let stats = run_detection(&mut store, &config, None);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.by_type.get(&DiscrepancyType::AreaMismatch), Some(&1));
        let d = store.discrepancies().next().unwrap().clone();
        assert_eq!(d.kind, DiscrepancyType::AreaMismatch);
        assert_eq!(d.status, DiscrepancyStatus::Open);
        // 25% lands in the 10-25 band.
        assert_eq!(d.score, 25);
        match &d.details {
            DiscrepancyDetails::Area { difference_percent, .. } => {
                assert_eq!(*difference_percent, 25.0)
            }
            other => panic!("unexpected details {other:?}"),
        }

        // Second run with identical inputs changes nothing.
        let stats = run_detection(&mut store, &config, None);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(store.discrepancies().count(), 1);
        assert_eq!(store.discrepancies().next().unwrap().id, d.id);
    }

    #[test]
    fn rescore_only_outside_hysteresis_band() {
        let mut store = seeded(Some(100.0), Some(80.0));
        let config = DetectionConfig::default();
        run_detection(&mut store, &config, None);
        let before = store.discrepancies().next().unwrap().clone();
        assert_eq!(before.score, 25);

        // Push the difference above 25%: the score jumps to 40.
        let parcel_id = before.parcel_id.unwrap();
        let mut updated_parcel = store.parcel(parcel_id).unwrap().clone();
        updated_parcel.computed_area_sqm = Some(130.0);
        store.import_parcel(updated_parcel, &Actor::system());

        let stats = run_detection(&mut store, &config, None);
        assert_eq!(stats.updated, 1);
        let after = store.discrepancies().next().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.score, 40);
        // The rescore is audited under the system actor.
        let trail = store
            .ledger()
            .entity_history(EntityType::Discrepancy, before.id, 10);
        assert_eq!(trail[0].action, AuditAction::Update);
        assert_eq!(trail[0].actor, "system");
    }

    #[test]
    fn village_filter_scopes_the_run() {
        let mut store = seeded(Some(100.0), Some(80.0));
        let mut other = parcel("PLT-100", Some(500.0));
        other.village_code = "V002".into();
        store.import_parcel(other, &Actor::system());

        let stats = run_detection(&mut store, &DetectionConfig::default(), Some("V001"));
        assert_eq!(stats.parcels_checked, 1);
        assert_eq!(stats.created, 1);
        assert!(store
            .open_discrepancy_for("PLT-100", DiscrepancyType::MissingRecord)
            .is_none());

        let stats = run_detection(&mut store, &DetectionConfig::default(), Some("V002"));
        assert_eq!(stats.created, 1);
        assert!(store
            .open_discrepancy_for("PLT-100", DiscrepancyType::MissingRecord)
            .is_some());
    }

    #[test]
    fn small_delta_suppressed_across_tier_boundary() {
        // 25% difference lands in the major band; weight tweaks between
        // runs move the score 49 -> 52, within the hysteresis band even
        // though it crosses the major tier at 50.
        let mut store = seeded(Some(100.0), Some(80.0));
        let mut config = DetectionConfig::default();
        config.weights.area_major_mismatch = 49;
        run_detection(&mut store, &config, None);
        let before = store.discrepancies().next().unwrap().clone();
        assert_eq!(before.score, 49);
        assert_eq!(before.severity, Severity::Minor);

        config.weights.area_major_mismatch = 52;
        let stats = run_detection(&mut store, &config, None);
        assert_eq!(stats.unchanged, 1);
        let after = store.discrepancies().next().unwrap();
        assert_eq!(after.score, 49);
        assert_eq!(after.severity, Severity::Minor);
    }

    #[test]
    fn missing_record_and_missing_parcel() {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", Some(2500.0)), &actor);
        store.import_record(record("PLT-002", "श्याम वर्मा", Some(1200.0)), &actor);

        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.by_type.get(&DiscrepancyType::MissingRecord), Some(&1));
        assert_eq!(stats.by_type.get(&DiscrepancyType::MissingParcel), Some(&1));

        let missing_record = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::MissingRecord)
            .unwrap();
        // 25 type + 25 completeness + 10 no area pair = 60.
        assert_eq!(missing_record.score, 60);
        assert_eq!(missing_record.severity, Severity::Major);
    }

    #[test]
    fn duplicate_current_records_flagged() {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", Some(2500.0)), &actor);
        store.import_record(record("PLT-001", "राम", Some(2500.0)), &actor);
        // Second current row for the same plot, the way a bad upstream
        // export that bypassed version bookkeeping would look.
        let mut rogue = record("PLT-001", "श्याम", Some(2500.0));
        rogue.version = 1;
        rogue.is_current = true;
        store.insert_record_unchecked(rogue);

        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.by_type.get(&DiscrepancyType::DuplicateRecord), Some(&1));
        let d = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::DuplicateRecord)
            .unwrap();
        match &d.details {
            DiscrepancyDetails::DuplicateRecord { record_count, record_ids } => {
                assert_eq!(*record_count, 2);
                assert_eq!(record_ids.len(), 2);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn uncorrelated_owner_scripts_raise_name_mismatch() {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", Some(2500.0)), &actor);
        let mut bilingual = record("PLT-001", "राम शर्मा", Some(2500.0));
        bilingual.owner_name_english = Some("Krishna Verma".into());
        store.import_record(bilingual, &actor);

        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.by_type.get(&DiscrepancyType::NameMismatch), Some(&1));
        let d = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::NameMismatch)
            .unwrap();
        match &d.details {
            DiscrepancyDetails::Name { hindi_name, english_name, similarity_score, .. } => {
                assert_eq!(hindi_name, "राम शर्मा");
                assert_eq!(english_name, "Krishna Verma");
                assert!(*similarity_score < 80.0);
            }
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn single_script_record_skips_name_check() {
        // Only the Hindi name was transcribed: nothing to cross-check.
        let mut store = seeded(Some(2500.0), Some(2500.0));
        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.by_type.get(&DiscrepancyType::NameMismatch), None);
        assert_eq!(stats.created, 0);
    }

    #[test]
    fn area_check_needs_both_values() {
        // Recorded area absent: completeness scoring territory, not an
        // area mismatch.
        let mut store = seeded(Some(2500.0), None);
        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert!(store
            .open_discrepancy_for("PLT-001", DiscrepancyType::AreaMismatch)
            .is_none());
        assert_eq!(stats.created, 0);
    }

    #[test]
    fn per_record_checks_run_alongside_duplicate_flag() {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", Some(100.0)), &actor);
        store.import_record(record("PLT-001", "राम", Some(80.0)), &actor);
        let mut rogue = record("PLT-001", "श्याम", Some(80.0));
        rogue.version = 1;
        rogue.is_current = true;
        store.insert_record_unchecked(rogue);

        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.by_type.get(&DiscrepancyType::DuplicateRecord), Some(&1));
        // 100 vs 80 is a 25% difference; the duplicate flag does not
        // absorb it.
        let area = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::AreaMismatch)
            .unwrap();
        assert_eq!(area.score, 25);
    }

    #[test]
    fn duplicate_parcels_prefer_measured_geometry() {
        let mut store = MemoryStore::new();
        let actor = Actor::system();
        store.import_parcel(parcel("PLT-001", None), &actor);
        store.import_parcel(parcel("PLT-001", Some(100.0)), &actor);
        store.import_record(record("PLT-001", "राम", Some(80.0)), &actor);

        let stats = run_detection(&mut store, &DetectionConfig::default(), None);
        assert_eq!(stats.by_type.get(&DiscrepancyType::DuplicateParcel), Some(&1));
        // The digitization with a measured area drives the area check; the
        // empty twin must not suppress it.
        let area = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::AreaMismatch)
            .unwrap();
        assert_eq!(area.score, 25);
    }

    #[test]
    fn repeat_history_raises_score_on_recreation() {
        let mut store = seeded(Some(100.0), Some(80.0));
        let config = DetectionConfig::default();
        run_detection(&mut store, &config, None);
        let first = store.discrepancies().next().unwrap().clone();
        assert_eq!(first.score, 25);

        // Resolve it, then re-detect: the repeat factor (1 prior, step 5)
        // and the resolved credit (-10) both apply: 25 + 5 - 10 = 20,
        // within hysteresis of nothing since it is a fresh row.
        let mut resolved = first.clone();
        resolved.status = DiscrepancyStatus::Resolved;
        store.replace_discrepancy(resolved);

        let stats = run_detection(&mut store, &config, None);
        assert_eq!(stats.created, 1);
        let reopened = store
            .open_discrepancy_for("PLT-001", DiscrepancyType::AreaMismatch)
            .unwrap();
        assert_ne!(reopened.id, first.id);
        assert_eq!(reopened.score, 20);
    }
}
