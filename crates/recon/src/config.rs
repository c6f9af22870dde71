use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Detection config
// ---------------------------------------------------------------------------

/// Thresholds consumed by the detection run. Supplied by the caller, not
/// owned here; `Default` carries the values the field teams calibrated.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionConfig {
    /// Percent difference below which areas are considered matching.
    #[serde(default = "default_minor_pct")]
    pub area_tolerance_minor_pct: f64,
    /// Percent difference above which an area mismatch is more than minor.
    #[serde(default = "default_major_pct")]
    pub area_tolerance_major_pct: f64,
    /// Owner-name similarity (0-100) below which a name mismatch is raised.
    #[serde(default = "default_name_threshold")]
    pub name_similarity_threshold: f64,
    #[serde(default)]
    pub weights: ScoreWeights,
}

fn default_minor_pct() -> f64 {
    5.0
}

fn default_major_pct() -> f64 {
    15.0
}

fn default_name_threshold() -> f64 {
    80.0
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            area_tolerance_minor_pct: default_minor_pct(),
            area_tolerance_major_pct: default_major_pct(),
            name_similarity_threshold: default_name_threshold(),
            weights: ScoreWeights::default(),
        }
    }
}

impl DetectionConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: DetectionConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.area_tolerance_minor_pct < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "area_tolerance_minor_pct must be >= 0, got {}",
                self.area_tolerance_minor_pct
            )));
        }
        if self.area_tolerance_major_pct <= self.area_tolerance_minor_pct {
            return Err(ReconError::ConfigValidation(format!(
                "area_tolerance_major_pct ({}) must exceed area_tolerance_minor_pct ({})",
                self.area_tolerance_major_pct, self.area_tolerance_minor_pct
            )));
        }
        if !(0.0..=100.0).contains(&self.name_similarity_threshold) {
            return Err(ReconError::ConfigValidation(format!(
                "name_similarity_threshold must be in 0..=100, got {}",
                self.name_similarity_threshold
            )));
        }
        self.weights.validate()
    }
}

// ---------------------------------------------------------------------------
// Scoring weights
// ---------------------------------------------------------------------------

/// Point values for each scoring factor. Passed into the scorer as a value
/// so tests can override thresholds without touching shared state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    // Area discrepancy, by band of percent difference.
    pub area_critical_mismatch: i64,
    pub area_major_mismatch: i64,
    pub area_minor_mismatch: i64,

    // Name discrepancy, by band of similarity.
    pub name_no_match: i64,
    pub name_partial_match: i64,
    pub name_likely_match: i64,

    // Record completeness.
    pub missing_parcel_geometry: i64,
    pub missing_ownership_record: i64,
    pub missing_father_name: i64,
    pub missing_area_value: i64,

    // Duplication.
    pub duplicate_plot_id: i64,
    pub overlapping_geometry: i64,

    // Historical pattern.
    pub repeated_discrepancy: i64,
    pub repeat_step: i64,
    pub previously_resolved: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            area_critical_mismatch: 40,
            area_major_mismatch: 25,
            area_minor_mismatch: 10,
            name_no_match: 30,
            name_partial_match: 15,
            name_likely_match: 5,
            missing_parcel_geometry: 25,
            missing_ownership_record: 25,
            missing_father_name: 5,
            missing_area_value: 10,
            duplicate_plot_id: 35,
            overlapping_geometry: 30,
            repeated_discrepancy: 15,
            repeat_step: 5,
            previously_resolved: -10,
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.repeat_step < 0 || self.repeated_discrepancy < 0 {
            return Err(ReconError::ConfigValidation(
                "repeat weights must be non-negative".into(),
            ));
        }
        if self.previously_resolved > 0 {
            return Err(ReconError::ConfigValidation(
                "previously_resolved must be a non-positive adjustment".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
