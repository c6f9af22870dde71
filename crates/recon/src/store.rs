//! In-memory store for parcels, land records, discrepancies, and the audit
//! ledger, with a JSON snapshot format for persistence between runs.
//!
//! Land records are versioned: an import for an already-known plot creates
//! a new current row and flips the old one, keeping the chain walkable via
//! `previous_version_id`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditLedger;
use crate::error::ReconError;
use crate::model::{
    Actor, AuditAction, AuditEntry, Discrepancy, DiscrepancyDetails, DiscrepancyStatus,
    DiscrepancyType, EntityType, LandRecord, Parcel, Severity,
};
use crate::severity::severity_for;

/// Score assigned to a discrepancy whose persisted details could not be
/// decoded. High enough to land in the review queue without claiming
/// certainty.
pub const UNPARSED_DETAILS_SCORE: i64 = 50;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    parcels: BTreeMap<Uuid, Parcel>,
    records: BTreeMap<Uuid, LandRecord>,
    discrepancies: BTreeMap<Uuid, Discrepancy>,
    ledger: AuditLedger,
}

/// What the scorer needs to know about a plot's past issues of one kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFactors {
    pub previous_occurrences: u32,
    pub previously_resolved: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- parcels ------------------------------------------------------------

    pub fn import_parcel(&mut self, parcel: Parcel, actor: &Actor) -> Uuid {
        let id = parcel.id;
        self.ledger.record(
            EntityType::Parcel,
            id,
            AuditAction::Import,
            None,
            Some(json!({ "plot_id": parcel.plot_id, "village_code": parcel.village_code })),
            actor,
            None,
        );
        self.parcels.insert(id, parcel);
        id
    }

    pub fn parcel(&self, id: Uuid) -> Option<&Parcel> {
        self.parcels.get(&id)
    }

    pub fn parcels(&self) -> impl Iterator<Item = &Parcel> {
        self.parcels.values()
    }

    // -- land records -------------------------------------------------------

    /// Import one record. Version bookkeeping is owned here: the caller
    /// supplies content fields, the store decides version, currency flag,
    /// and the back-link.
    pub fn import_record(&mut self, mut record: LandRecord, actor: &Actor) -> Uuid {
        let previous = self
            .records
            .values()
            .find(|r| r.is_current && r.plot_id == record.plot_id)
            .map(|r| (r.id, r.version));

        match previous {
            Some((prev_id, prev_version)) => {
                record.version = prev_version + 1;
                record.previous_version_id = Some(prev_id);
                record.is_current = true;
                if let Some(prev) = self.records.get_mut(&prev_id) {
                    prev.is_current = false;
                }
                self.ledger.record(
                    EntityType::LandRecord,
                    record.id,
                    AuditAction::Update,
                    Some(json!({ "version": prev_version, "record_id": prev_id })),
                    Some(json!({ "version": record.version, "plot_id": record.plot_id })),
                    actor,
                    None,
                );
            }
            None => {
                record.version = 1;
                record.previous_version_id = None;
                record.is_current = true;
                self.ledger.record(
                    EntityType::LandRecord,
                    record.id,
                    AuditAction::Import,
                    None,
                    Some(json!({ "version": 1, "plot_id": record.plot_id })),
                    actor,
                    None,
                );
            }
        }

        let id = record.id;
        self.records.insert(id, record);
        id
    }

    /// Insert a record exactly as given, with no version bookkeeping and no
    /// audit entry. Snapshot restore and test fixtures only.
    pub(crate) fn insert_record_unchecked(&mut self, record: LandRecord) {
        self.records.insert(record.id, record);
    }

    pub fn record(&self, id: Uuid) -> Option<&LandRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &LandRecord> {
        self.records.values()
    }

    pub fn current_records(&self) -> impl Iterator<Item = &LandRecord> {
        self.records.values().filter(|r| r.is_current)
    }

    /// Version chain for a plot, newest first.
    pub fn record_versions(&self, plot_id: &str) -> Vec<&LandRecord> {
        let mut versions: Vec<&LandRecord> =
            self.records.values().filter(|r| r.plot_id == plot_id).collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    // -- discrepancies ------------------------------------------------------

    pub fn insert_discrepancy(&mut self, discrepancy: Discrepancy) -> Uuid {
        let id = discrepancy.id;
        self.discrepancies.insert(id, discrepancy);
        id
    }

    pub fn replace_discrepancy(&mut self, discrepancy: Discrepancy) {
        self.discrepancies.insert(discrepancy.id, discrepancy);
    }

    pub fn discrepancy(&self, id: Uuid) -> Option<&Discrepancy> {
        self.discrepancies.get(&id)
    }

    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.discrepancies.values()
    }

    /// The open (or under-review) discrepancy for a plot and kind, if one
    /// exists. The dedup invariant keeps this unique.
    pub fn open_discrepancy_for(
        &self,
        plot_id: &str,
        kind: DiscrepancyType,
    ) -> Option<&Discrepancy> {
        self.discrepancies
            .values()
            .find(|d| d.plot_id == plot_id && d.kind == kind && d.status.is_open())
    }

    /// Closed history for a plot and kind, feeding the historical scoring
    /// factors.
    pub fn history_for(&self, plot_id: &str, kind: DiscrepancyType) -> HistoryFactors {
        let mut factors = HistoryFactors::default();
        for d in self.discrepancies.values() {
            if d.plot_id == plot_id && d.kind == kind && !d.status.is_open() {
                factors.previous_occurrences += 1;
                if d.status == DiscrepancyStatus::Resolved {
                    factors.previously_resolved = true;
                }
            }
        }
        factors
    }

    /// Open work items ranked for review: highest score first, most recent
    /// detection breaking ties.
    pub fn priority_queue(
        &self,
        village_code: Option<&str>,
        severity: Option<Severity>,
        limit: usize,
    ) -> Vec<&Discrepancy> {
        let mut queue: Vec<&Discrepancy> = self
            .discrepancies
            .values()
            .filter(|d| d.status.is_open())
            .filter(|d| {
                village_code.map_or(true, |v| d.village_code.as_deref() == Some(v))
            })
            .filter(|d| severity.map_or(true, |s| d.severity == s))
            .collect();
        queue.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.detected_at.cmp(&a.detected_at))
        });
        queue.truncate(limit);
        queue
    }

    // -- audit --------------------------------------------------------------

    pub fn ledger(&self) -> &AuditLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut AuditLedger {
        &mut self.ledger
    }

    // -- persistence --------------------------------------------------------

    pub fn save(&self, path: &Path) -> Result<(), ReconError> {
        let snapshot = Snapshot {
            parcels: self.parcels.values().cloned().collect(),
            records: self.records.values().cloned().collect(),
            discrepancies: self
                .discrepancies
                .values()
                .map(|d| serde_json::to_value(d).map_err(|e| ReconError::Io(e.to_string())))
                .collect::<Result<Vec<_>, _>>()?,
            audit: self.ledger.entries().to_vec(),
        };
        let data =
            serde_json::to_string_pretty(&snapshot).map_err(|e| ReconError::Io(e.to_string()))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let data = std::fs::read_to_string(path)?;
        let snapshot: Snapshot =
            serde_json::from_str(&data).map_err(|e| ReconError::Io(e.to_string()))?;

        let mut store = Self::new();
        for parcel in snapshot.parcels {
            store.parcels.insert(parcel.id, parcel);
        }
        for record in snapshot.records {
            store.insert_record_unchecked(record);
        }
        for value in snapshot.discrepancies {
            let discrepancy = decode_discrepancy(value)?;
            store.discrepancies.insert(discrepancy.id, discrepancy);
        }
        store.ledger = AuditLedger::from_entries(snapshot.audit);
        Ok(store)
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    parcels: Vec<Parcel>,
    records: Vec<LandRecord>,
    discrepancies: Vec<serde_json::Value>,
    audit: Vec<AuditEntry>,
}

/// Everything except `details`, which older snapshots may carry in shapes
/// this version no longer understands.
#[derive(Deserialize)]
struct RawDiscrepancy {
    id: Uuid,
    parcel_id: Option<Uuid>,
    record_id: Option<Uuid>,
    plot_id: String,
    village_code: Option<String>,
    kind: DiscrepancyType,
    status: DiscrepancyStatus,
    explanation: String,
    explanation_hindi: String,
    #[serde(default)]
    details: serde_json::Value,
    resolution_remarks: Option<String>,
    resolved_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    detected_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Decode one persisted discrepancy, degrading gracefully when only the
/// details payload is unreadable: the row survives with `Unparsed` details
/// and a flat mid-range score so it still surfaces for review.
fn decode_discrepancy(value: serde_json::Value) -> Result<Discrepancy, ReconError> {
    match serde_json::from_value::<Discrepancy>(value.clone()) {
        Ok(d) => Ok(d),
        Err(_) => {
            let raw: RawDiscrepancy = serde_json::from_value(value)
                .map_err(|e| ReconError::Io(format!("corrupt discrepancy row: {e}")))?;
            Ok(Discrepancy {
                id: raw.id,
                parcel_id: raw.parcel_id,
                record_id: raw.record_id,
                plot_id: raw.plot_id,
                village_code: raw.village_code,
                kind: raw.kind,
                severity: severity_for(UNPARSED_DETAILS_SCORE),
                status: raw.status,
                score: UNPARSED_DETAILS_SCORE,
                explanation: raw.explanation,
                explanation_hindi: raw.explanation_hindi,
                details: DiscrepancyDetails::Unparsed { raw: raw.details.to_string() },
                resolution_remarks: raw.resolution_remarks,
                resolved_by: raw.resolved_by,
                resolved_at: raw.resolved_at,
                detected_at: raw.detected_at,
                updated_at: raw.updated_at,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
