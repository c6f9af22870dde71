//! Multi-factor severity scoring.
//!
//! The score is additive over independent weighted factors (type-specific,
//! completeness, historical), clamped to 0-100, then banded into a tier.

use serde::Serialize;

use crate::config::ScoreWeights;
use crate::model::{DiscrepancyType, Severity};

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Everything the scorer looks at. Detection runs fill the comparison
/// fields; callers that track issue history can also supply the historical
/// factors.
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub kind: DiscrepancyType,
    pub computed_sqm: Option<f64>,
    pub recorded_sqm: Option<f64>,
    /// 0-100, from the name matcher.
    pub name_similarity: Option<f64>,
    pub has_geometry: bool,
    pub has_record: bool,
    pub has_father_name: bool,
    pub previous_occurrences: u32,
    pub previously_resolved: bool,
}

impl ScoreInput {
    /// A complete-looking input for the given kind; callers override the
    /// fields the verdict actually knows about.
    pub fn for_kind(kind: DiscrepancyType) -> Self {
        Self {
            kind,
            computed_sqm: None,
            recorded_sqm: None,
            name_similarity: None,
            has_geometry: true,
            has_record: true,
            has_father_name: true,
            previous_occurrences: 0,
            previously_resolved: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    Area,
    Name,
    MissingRecord,
    MissingParcel,
    Duplicate,
    Completeness,
    Repeated,
    PreviouslyResolved,
}

impl std::fmt::Display for ScoreFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Area => write!(f, "area"),
            Self::Name => write!(f, "name"),
            Self::MissingRecord => write!(f, "missing_record"),
            Self::MissingParcel => write!(f, "missing_parcel"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Completeness => write!(f, "completeness"),
            Self::Repeated => write!(f, "repeated"),
            Self::PreviouslyResolved => write!(f, "previously_resolved"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeverityScore {
    /// Clamped to 0-100.
    pub total_score: i64,
    pub severity: Severity,
    pub factors: Vec<(ScoreFactor, i64)>,
    pub explanation: String,
    pub explanation_hindi: String,
    /// 100 - score: rank 0 is the most urgent.
    pub priority_rank: i64,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

pub fn compute_score(weights: &ScoreWeights, input: &ScoreInput) -> SeverityScore {
    let mut factors: Vec<(ScoreFactor, i64)> = Vec::new();
    let mut explanations_en: Vec<String> = Vec::new();
    let mut explanations_hi: Vec<String> = Vec::new();
    let mut total: i64 = 0;

    // Type-specific component.
    match input.kind {
        DiscrepancyType::AreaMismatch => {
            let (points, en, hi) = area_component(weights, input.computed_sqm, input.recorded_sqm);
            factors.push((ScoreFactor::Area, points));
            total += points;
            explanations_en.push(en);
            explanations_hi.push(hi);
        }
        DiscrepancyType::NameMismatch => {
            if let Some(similarity) = input.name_similarity {
                let (points, en, hi) = name_component(weights, similarity);
                factors.push((ScoreFactor::Name, points));
                total += points;
                explanations_en.push(en);
                explanations_hi.push(hi);
            }
        }
        DiscrepancyType::MissingRecord => {
            factors.push((ScoreFactor::MissingRecord, weights.missing_ownership_record));
            total += weights.missing_ownership_record;
            explanations_en.push("No ownership record found for parcel".into());
            explanations_hi.push("भूखंड के लिए स्वामित्व रिकॉर्ड नहीं मिला".into());
        }
        DiscrepancyType::MissingParcel => {
            factors.push((ScoreFactor::MissingParcel, weights.missing_parcel_geometry));
            total += weights.missing_parcel_geometry;
            explanations_en.push("No parcel geometry found for record".into());
            explanations_hi.push("रिकॉर्ड के लिए भूखंड नक्शा नहीं मिला".into());
        }
        DiscrepancyType::DuplicateRecord => {
            factors.push((ScoreFactor::Duplicate, weights.duplicate_plot_id));
            total += weights.duplicate_plot_id;
            explanations_en.push("Multiple records for same plot ID".into());
            explanations_hi.push("एक ही प्लॉट आईडी के लिए कई रिकॉर्ड".into());
        }
        DiscrepancyType::DuplicateParcel => {
            factors.push((ScoreFactor::Duplicate, weights.overlapping_geometry));
            total += weights.overlapping_geometry;
            explanations_en.push("Overlapping parcel boundaries found".into());
            explanations_hi.push("ओवरलैपिंग भूखंड सीमाएं पाई गईं".into());
        }
    }

    // Completeness component: one weight per missing piece.
    let has_area_values = input.computed_sqm.is_some() && input.recorded_sqm.is_some();
    let mut completeness = 0;
    if !input.has_geometry {
        completeness += weights.missing_parcel_geometry;
        explanations_en.push("Parcel geometry not available".into());
        explanations_hi.push("भूखंड का नक्शा उपलब्ध नहीं".into());
    }
    if !input.has_record {
        completeness += weights.missing_ownership_record;
        explanations_en.push("Ownership record not available".into());
        explanations_hi.push("स्वामित्व रिकॉर्ड उपलब्ध नहीं".into());
    }
    if !input.has_father_name {
        completeness += weights.missing_father_name;
        explanations_en.push("Father name missing".into());
        explanations_hi.push("पिता का नाम गायब".into());
    }
    if !has_area_values {
        completeness += weights.missing_area_value;
        explanations_en.push("Area values missing".into());
        explanations_hi.push("क्षेत्रफल मान गायब".into());
    }
    if completeness > 0 {
        factors.push((ScoreFactor::Completeness, completeness));
        total += completeness;
    }

    // Historical component.
    if input.previous_occurrences > 0 {
        let repeat = (i64::from(input.previous_occurrences) * weights.repeat_step)
            .min(weights.repeated_discrepancy);
        factors.push((ScoreFactor::Repeated, repeat));
        total += repeat;
        explanations_en.push(format!(
            "This issue has occurred {} times before",
            input.previous_occurrences
        ));
        explanations_hi.push(format!(
            "यह समस्या {} बार पहले भी आई है",
            input.previous_occurrences
        ));
    }
    if input.previously_resolved {
        factors.push((ScoreFactor::PreviouslyResolved, weights.previously_resolved));
        total += weights.previously_resolved;
        explanations_en.push("Was previously resolved".into());
        explanations_hi.push("पहले सुलझाया गया था".into());
    }

    let total_score = total.clamp(0, 100);
    let severity = severity_for(total_score);

    SeverityScore {
        total_score,
        severity,
        factors,
        explanation: explanations_en.join(" | "),
        explanation_hindi: explanations_hi.join(" | "),
        priority_rank: 100 - total_score,
    }
}

/// Tier boundaries are inclusive of their lower bound: 80 is critical,
/// 50 is major.
pub fn severity_for(score: i64) -> Severity {
    if score >= 80 {
        Severity::Critical
    } else if score >= 50 {
        Severity::Major
    } else {
        Severity::Minor
    }
}

/// Area points by fixed band of percent difference (relative to recorded).
fn area_component(
    weights: &ScoreWeights,
    computed_sqm: Option<f64>,
    recorded_sqm: Option<f64>,
) -> (i64, String, String) {
    let (computed, recorded) = match (computed_sqm, recorded_sqm) {
        (Some(c), Some(r)) => (c, r),
        _ => {
            return (
                weights.missing_area_value,
                "Area comparison not possible".into(),
                "क्षेत्रफल तुलना संभव नहीं".into(),
            )
        }
    };

    if recorded == 0.0 {
        return (
            weights.area_critical_mismatch,
            "Recorded area is zero".into(),
            "दर्ज क्षेत्रफल शून्य है".into(),
        );
    }

    let diff_percent = (computed - recorded).abs() / recorded * 100.0;
    if diff_percent > 25.0 {
        (
            weights.area_critical_mismatch,
            format!("Critical area difference of {diff_percent:.1}%"),
            format!("क्षेत्रफल में {diff_percent:.1}% का गंभीर अंतर"),
        )
    } else if diff_percent > 10.0 {
        (
            weights.area_major_mismatch,
            format!("Major area difference of {diff_percent:.1}%"),
            format!("क्षेत्रफल में {diff_percent:.1}% का महत्वपूर्ण अंतर"),
        )
    } else if diff_percent > 5.0 {
        (
            weights.area_minor_mismatch,
            format!("Minor area difference of {diff_percent:.1}%"),
            format!("क्षेत्रफल में {diff_percent:.1}% का मामूली अंतर"),
        )
    } else {
        (
            0,
            "Area within acceptable range".into(),
            "क्षेत्रफल स्वीकार्य सीमा में".into(),
        )
    }
}

/// Name points by similarity band.
fn name_component(weights: &ScoreWeights, similarity: f64) -> (i64, String, String) {
    if similarity < 50.0 {
        (
            weights.name_no_match,
            format!("Names only {similarity:.0}% similar (no match)"),
            format!("नाम में केवल {similarity:.0}% समानता (मेल नहीं खाता)"),
        )
    } else if similarity < 80.0 {
        (
            weights.name_partial_match,
            format!("Names {similarity:.0}% similar (partial match)"),
            format!("नाम में {similarity:.0}% समानता (आंशिक मिलान)"),
        )
    } else if similarity < 95.0 {
        (
            weights.name_likely_match,
            format!("Names {similarity:.0}% similar (likely match)"),
            format!("नाम में {similarity:.0}% समानता (संभावित मिलान)"),
        )
    } else {
        (0, "Names match".into(), "नाम पूर्णतः मेल खाता है".into())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
