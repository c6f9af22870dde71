//! Tolerance-based comparison of computed (geometry) vs recorded
//! (document) areas. The recorded value is the reference: percentage
//! difference is always relative to it.

use serde::Serialize;

use crate::model::Severity;

/// Square meters per bigha. Varies by region; this is the common UP/Bihar
/// ratio.
pub const BIGHA_SQM: f64 = 2500.0;

#[derive(Debug, Clone, Serialize)]
pub struct AreaComparison {
    pub matches: bool,
    pub difference_sqm: f64,
    pub difference_percent: f64,
    /// None when the difference is within the minor tolerance.
    pub severity: Option<Severity>,
    pub explanation: String,
    pub explanation_hindi: String,
}

/// Compare a geometry-derived area against a document-recorded area.
///
/// Missing data never fails: an absent value degrades to a forced MAJOR
/// verdict, a zero/negative value to CRITICAL, so a detection run completes
/// over incomplete source rows.
pub fn compare_areas(
    computed_sqm: Option<f64>,
    recorded_sqm: Option<f64>,
    tolerance_minor_pct: f64,
    tolerance_major_pct: f64,
) -> AreaComparison {
    let (computed, recorded) = match (computed_sqm, recorded_sqm) {
        (Some(c), Some(r)) => (c, r),
        _ => {
            return AreaComparison {
                matches: false,
                difference_sqm: 0.0,
                difference_percent: 0.0,
                severity: Some(Severity::Major),
                explanation: "Missing area data for comparison".into(),
                explanation_hindi: "क्षेत्रफल की तुलना के लिए डेटा उपलब्ध नहीं है".into(),
            }
        }
    };

    if computed <= 0.0 || recorded <= 0.0 {
        return AreaComparison {
            matches: false,
            difference_sqm: round2((computed - recorded).abs()),
            difference_percent: 100.0,
            severity: Some(Severity::Critical),
            explanation: "Invalid area value (zero or negative)".into(),
            explanation_hindi: "अमान्य क्षेत्रफल मान (शून्य या ऋणात्मक)".into(),
        };
    }

    let difference_sqm = (computed - recorded).abs();
    let difference_percent = difference_sqm / recorded * 100.0;

    let severity = classify_band(difference_percent, tolerance_minor_pct, tolerance_major_pct);
    let (explanation, explanation_hindi) =
        explain(computed, recorded, difference_sqm, difference_percent, severity);

    AreaComparison {
        matches: severity.is_none(),
        difference_sqm: round2(difference_sqm),
        difference_percent: round2(difference_percent),
        severity,
        explanation,
        explanation_hindi,
    }
}

/// Band a percentage difference: within minor tolerance → None, within
/// major → Minor, up to 30% → Major, beyond → Critical.
pub fn classify_band(
    difference_percent: f64,
    tolerance_minor_pct: f64,
    tolerance_major_pct: f64,
) -> Option<Severity> {
    if difference_percent <= tolerance_minor_pct {
        None
    } else if difference_percent <= tolerance_major_pct {
        Some(Severity::Minor)
    } else if difference_percent <= 30.0 {
        Some(Severity::Major)
    } else {
        Some(Severity::Critical)
    }
}

fn explain(
    computed: f64,
    recorded: f64,
    difference_sqm: f64,
    difference_percent: f64,
    severity: Option<Severity>,
) -> (String, String) {
    let computed_str = format_area(computed);
    let recorded_str = format_area(recorded);
    let diff_str = format_area(difference_sqm);

    match severity {
        None => (
            format!(
                "Area matches within tolerance. Computed: {computed_str}, Recorded: {recorded_str}"
            ),
            format!("क्षेत्रफल सहिष्णुता के भीतर है। गणना: {computed_str}, दर्ज: {recorded_str}"),
        ),
        Some(Severity::Minor) => (
            format!(
                "Minor area difference of {diff_str} ({difference_percent:.1}%). \
                 Computed: {computed_str}, Recorded: {recorded_str}. Likely measurement variation."
            ),
            format!(
                "मामूली क्षेत्रफल अंतर {diff_str} ({difference_percent:.1}%)। \
                 गणना: {computed_str}, दर्ज: {recorded_str}। संभावित माप भिन्नता।"
            ),
        ),
        Some(Severity::Major) => (
            format!(
                "Significant area mismatch of {diff_str} ({difference_percent:.1}%). \
                 Computed: {computed_str}, Recorded: {recorded_str}. Requires verification."
            ),
            format!(
                "महत्वपूर्ण क्षेत्रफल विसंगति {diff_str} ({difference_percent:.1}%)। \
                 गणना: {computed_str}, दर्ज: {recorded_str}। सत्यापन आवश्यक।"
            ),
        ),
        Some(Severity::Critical) => (
            format!(
                "Critical area discrepancy of {diff_str} ({difference_percent:.1}%). \
                 Computed: {computed_str}, Recorded: {recorded_str}. Immediate review required."
            ),
            format!(
                "गंभीर क्षेत्रफल विसंगति {diff_str} ({difference_percent:.1}%)। \
                 गणना: {computed_str}, दर्ज: {recorded_str}। तत्काल समीक्षा आवश्यक।"
            ),
        ),
    }
}

/// Hectares at or above 1 ha, square meters below.
pub fn format_area(sqm: f64) -> String {
    if sqm >= 10_000.0 {
        format!("{:.2} hectares", sqm / 10_000.0)
    } else if sqm >= 100.0 {
        format!("{sqm:.0} sq.m")
    } else {
        format!("{sqm:.2} sq.m")
    }
}

pub fn sqm_to_bigha(sqm: f64) -> f64 {
    sqm / BIGHA_SQM
}

pub fn bigha_to_sqm(bigha: f64) -> f64 {
    bigha * BIGHA_SQM
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
