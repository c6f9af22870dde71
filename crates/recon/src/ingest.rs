//! CSV loaders for the two source datasets.
//!
//! Parcel exports come from the digitization pipeline, record exports from
//! the registry. Headers are matched by name, empty cells become `None`,
//! and a bad numeric cell names its row instead of failing opaquely.

use chrono::Utc;
use uuid::Uuid;

use crate::error::ReconError;
use crate::model::{LandRecord, Parcel};

fn column_index(
    headers: &[String],
    file: &str,
    name: &str,
) -> Result<usize, ReconError> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ReconError::MissingColumn { file: file.into(), column: name.into() })
}

fn optional_column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn cell(record: &csv::StringRecord, idx: usize) -> Option<String> {
    match record.get(idx).map(str::trim) {
        None | Some("") => None,
        Some(value) => Some(value.to_string()),
    }
}

fn parse_area(
    file: &str,
    row_id: &str,
    field: &str,
    value: Option<String>,
) -> Result<Option<f64>, ReconError> {
    match value {
        None => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|_| ReconError::FieldParse {
            file: file.into(),
            row_id: row_id.into(),
            field: field.into(),
            value: raw,
        }),
    }
}

/// Parse a parcel export. Required columns: `plot_id`, `village_code`.
/// Optional: `computed_area_sqm`.
pub fn load_parcels_csv(file: &str, csv_data: &str) -> Result<Vec<Parcel>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let plot_idx = column_index(&headers, file, "plot_id")?;
    let village_idx = column_index(&headers, file, "village_code")?;
    let area_idx = optional_column_index(&headers, "computed_area_sqm");

    let mut parcels = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconError::Io(e.to_string()))?;
        let plot_id = cell(&row, plot_idx).ok_or_else(|| ReconError::Validation(format!(
            "{file}: row with empty plot_id"
        )))?;
        let village_code = cell(&row, village_idx).unwrap_or_default();
        let computed_area_sqm = match area_idx {
            Some(idx) => parse_area(file, &plot_id, "computed_area_sqm", cell(&row, idx))?,
            None => None,
        };
        parcels.push(Parcel {
            id: Uuid::new_v4(),
            plot_id,
            village_code,
            computed_area_sqm,
            updated_at: Utc::now(),
        });
    }
    Ok(parcels)
}

/// Parse a registry record export. Required columns: `plot_id`,
/// `owner_name_hindi`. Everything else is optional.
pub fn load_records_csv(file: &str, csv_data: &str) -> Result<Vec<LandRecord>, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let plot_idx = column_index(&headers, file, "plot_id")?;
    let owner_hindi_idx = column_index(&headers, file, "owner_name_hindi")?;
    let owner_english_idx = optional_column_index(&headers, "owner_name_english");
    let father_hindi_idx = optional_column_index(&headers, "father_name_hindi");
    let father_english_idx = optional_column_index(&headers, "father_name_english");
    let area_idx = optional_column_index(&headers, "recorded_area_sqm");
    let area_text_idx = optional_column_index(&headers, "recorded_area_text");
    let khata_idx = optional_column_index(&headers, "khata_number");
    let khasra_idx = optional_column_index(&headers, "khasra_number");

    let opt = |row: &csv::StringRecord, idx: Option<usize>| idx.and_then(|i| cell(row, i));

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ReconError::Io(e.to_string()))?;
        let plot_id = cell(&row, plot_idx).ok_or_else(|| ReconError::Validation(format!(
            "{file}: row with empty plot_id"
        )))?;
        let owner_name_hindi = cell(&row, owner_hindi_idx).ok_or_else(|| {
            ReconError::Validation(format!("{file}: row '{plot_id}' has no owner name"))
        })?;
        let recorded_area_sqm = match area_idx {
            Some(idx) => parse_area(file, &plot_id, "recorded_area_sqm", cell(&row, idx))?,
            None => None,
        };

        records.push(LandRecord {
            id: Uuid::new_v4(),
            plot_id,
            parcel_id: None,
            owner_name_hindi,
            owner_name_english: opt(&row, owner_english_idx),
            father_name_hindi: opt(&row, father_hindi_idx),
            father_name_english: opt(&row, father_english_idx),
            recorded_area_sqm,
            recorded_area_text: opt(&row, area_text_idx),
            khata_number: opt(&row, khata_idx),
            khasra_number: opt(&row, khasra_idx),
            // Version fields are assigned by the store on import.
            version: 0,
            is_current: false,
            previous_version_id: None,
            created_at: Utc::now(),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_parcels_with_optional_area() {
        let csv = "\
plot_id,village_code,computed_area_sqm
PLT-001,V001,2500.5
PLT-002,V001,
";
        let parcels = load_parcels_csv("parcels.csv", csv).unwrap();
        assert_eq!(parcels.len(), 2);
        assert_eq!(parcels[0].plot_id, "PLT-001");
        assert_eq!(parcels[0].computed_area_sqm, Some(2500.5));
        assert_eq!(parcels[1].computed_area_sqm, None);
    }

    #[test]
    fn missing_required_column_named_in_error() {
        let csv = "village_code\nV001\n";
        let err = load_parcels_csv("parcels.csv", csv).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { ref file, ref column }
                if file == "parcels.csv" && column == "plot_id"
        ));
    }

    #[test]
    fn bad_area_cell_names_the_row() {
        let csv = "\
plot_id,village_code,computed_area_sqm
PLT-001,V001,not-a-number
";
        let err = load_parcels_csv("parcels.csv", csv).unwrap_err();
        match err {
            ReconError::FieldParse { row_id, field, value, .. } => {
                assert_eq!(row_id, "PLT-001");
                assert_eq!(field, "computed_area_sqm");
                assert_eq!(value, "not-a-number");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn load_records_fills_optionals() {
        let csv = "\
plot_id,owner_name_hindi,owner_name_english,father_name_hindi,recorded_area_sqm,recorded_area_text,khata_number
PLT-001,राम शर्मा,Ram Sharma,मोहन लाल,2500,1 बीघा,KH-12
PLT-002,श्याम वर्मा,,,,,
";
        let records = load_records_csv("records.csv", csv).unwrap();
        assert_eq!(records.len(), 2);
        let full = &records[0];
        assert_eq!(full.owner_name_english.as_deref(), Some("Ram Sharma"));
        assert_eq!(full.recorded_area_sqm, Some(2500.0));
        assert_eq!(full.recorded_area_text.as_deref(), Some("1 बीघा"));
        assert_eq!(full.khata_number.as_deref(), Some("KH-12"));
        assert!(full.has_father_name());

        let sparse = &records[1];
        assert_eq!(sparse.owner_name_english, None);
        assert_eq!(sparse.recorded_area_sqm, None);
        assert!(!sparse.has_father_name());
        // The khasra column was absent entirely.
        assert_eq!(sparse.khasra_number, None);
    }

    #[test]
    fn empty_owner_name_rejected() {
        let csv = "\
plot_id,owner_name_hindi
PLT-001,
";
        let err = load_records_csv("records.csv", csv).unwrap_err();
        assert!(err.to_string().contains("no owner name"));
    }
}
