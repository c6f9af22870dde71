use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Source entities
// ---------------------------------------------------------------------------

/// Spatial side of a cadastral unit. Geometry lives with the ingestion
/// collaborator; only the derived area is carried here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: Uuid,
    pub plot_id: String,
    pub village_code: String,
    /// Square meters, derived from the polygon. None when no usable
    /// geometry has been digitized yet.
    pub computed_area_sqm: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// Textual ownership side. Versioned: updates create a new row and flip the
/// prior current one, linked via `previous_version_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandRecord {
    pub id: Uuid,
    /// Business key shared with `Parcel`; not unique across versions.
    pub plot_id: String,
    pub parcel_id: Option<Uuid>,
    pub owner_name_hindi: String,
    pub owner_name_english: Option<String>,
    pub father_name_hindi: Option<String>,
    pub father_name_english: Option<String>,
    pub recorded_area_sqm: Option<f64>,
    /// Original wording, e.g. "2 बीघा 5 बिस्वा".
    pub recorded_area_text: Option<String>,
    pub khata_number: Option<String>,
    pub khasra_number: Option<String>,
    pub version: u32,
    pub is_current: bool,
    pub previous_version_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LandRecord {
    pub fn has_father_name(&self) -> bool {
        self.father_name_hindi.is_some() || self.father_name_english.is_some()
    }
}

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyType {
    AreaMismatch,
    NameMismatch,
    MissingRecord,
    MissingParcel,
    DuplicateRecord,
    DuplicateParcel,
}

impl std::fmt::Display for DiscrepancyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AreaMismatch => write!(f, "area_mismatch"),
            Self::NameMismatch => write!(f, "name_mismatch"),
            Self::MissingRecord => write!(f, "missing_record"),
            Self::MissingParcel => write!(f, "missing_parcel"),
            Self::DuplicateRecord => write!(f, "duplicate_record"),
            Self::DuplicateParcel => write!(f, "duplicate_parcel"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyStatus {
    Open,
    UnderReview,
    Resolved,
    Disputed,
    Ignored,
}

impl DiscrepancyStatus {
    /// The dedup invariant is enforced over these two states.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::UnderReview)
    }
}

impl std::fmt::Display for DiscrepancyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::UnderReview => write!(f, "under_review"),
            Self::Resolved => write!(f, "resolved"),
            Self::Disputed => write!(f, "disputed"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Operator,
    Supervisor,
    Admin,
    /// Batch processes (detection, import). Never whitelisted on workflow
    /// edges.
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operator => write!(f, "operator"),
            Self::Supervisor => write!(f, "supervisor"),
            Self::Admin => write!(f, "admin"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A named user plus their role, as seen by workflow and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self { name: name.into(), role }
    }

    pub fn system() -> Self {
        Self::new("system", Role::System)
    }
}

// ---------------------------------------------------------------------------
// Discrepancy
// ---------------------------------------------------------------------------

/// Type-specific comparison payload, stored natively. The `Unparsed`
/// variant only appears when a legacy snapshot carried a details blob this
/// version cannot decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscrepancyDetails {
    Area {
        computed_sqm: f64,
        recorded_sqm: f64,
        difference_sqm: f64,
        difference_percent: f64,
    },
    Name {
        hindi_name: String,
        english_name: String,
        similarity_score: f64,
        match_type: String,
    },
    MissingRecord {
        village_code: String,
    },
    MissingParcel {
        owner_name: String,
    },
    DuplicateRecord {
        record_count: usize,
        record_ids: Vec<Uuid>,
    },
    DuplicateParcel {
        parcel_ids: Vec<Uuid>,
    },
    Unparsed {
        raw: String,
    },
}

/// A ranked, auditable work item: one inconsistency between the spatial and
/// textual records of a plot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub id: Uuid,
    pub parcel_id: Option<Uuid>,
    pub record_id: Option<Uuid>,
    pub plot_id: String,
    pub village_code: Option<String>,
    pub kind: DiscrepancyType,
    pub severity: Severity,
    pub status: DiscrepancyStatus,
    /// Numeric severity score, 0-100.
    pub score: i64,
    pub explanation: String,
    pub explanation_hindi: String,
    pub details: DiscrepancyDetails,
    pub resolution_remarks: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub detected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Audit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Parcel,
    LandRecord,
    Discrepancy,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parcel => write!(f, "parcel"),
            Self::LandRecord => write!(f, "land_record"),
            Self::Discrepancy => write!(f, "discrepancy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    StatusChange,
    Resolve,
    Reopen,
    Import,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::StatusChange => write!(f, "status_change"),
            Self::Resolve => write!(f, "resolve"),
            Self::Reopen => write!(f, "reopen"),
            Self::Import => write!(f, "import"),
        }
    }
}

/// One immutable ledger row. `seq` breaks timestamp ties in insertion
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub seq: u64,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub actor: String,
    pub role: Role,
    pub remarks: Option<String>,
    pub timestamp: DateTime<Utc>,
}
