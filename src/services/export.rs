//! CSV export of the selected group.
//!
//! One row per unique centroid in the selection, keyed by dynamic name:
//! `centroid_name,total_leakage,latitude,longitude,google_maps_link`.
//! Text fields are double-quote-escaped by the writer.

use crate::services::map_view;
use anyhow::{Context, Result};
use serde::Serialize;

/// One exported centroid line.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub centroid_name: String,
    pub total_leakage: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub google_maps_link: String,
}

impl ExportRow {
    pub fn new(
        centroid_name: String,
        total_leakage: f64,
        latitude: qtty::Degrees,
        longitude: qtty::Degrees,
    ) -> Self {
        Self {
            centroid_name,
            total_leakage,
            latitude: latitude.value(),
            longitude: longitude.value(),
            google_maps_link: map_view::google_maps_link(latitude, longitude),
        }
    }
}

/// Serialize export rows to CSV text with a header line.
pub fn write_csv(rows: &[ExportRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    for row in rows {
        writer
            .serialize(row)
            .context("Failed to serialize export row")?;
    }

    let bytes = writer
        .into_inner()
        .context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_row() {
        let rows = vec![ExportRow::new(
            "StationA".to_string(),
            12.5,
            qtty::Degrees::new(6.45),
            qtty::Degrees::new(3.39),
        )];
        let csv_text = write_csv(&rows).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"centroid_name\",\"total_leakage\",\"latitude\",\"longitude\",\"google_maps_link\""
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"StationA\",12.5,6.45,3.39,"));
        assert!(row.contains("\"https://www.google.com/maps?q=6.45,3.39\""));
    }

    #[test]
    fn test_embedded_quote_escaped() {
        let rows = vec![ExportRow::new(
            "Stop \"B\"".to_string(),
            1.0,
            qtty::Degrees::new(0.0),
            qtty::Degrees::new(0.0),
        )];
        let csv_text = write_csv(&rows).unwrap();
        assert!(csv_text.contains("\"Stop \"\"B\"\"\""));
    }

    #[test]
    fn test_empty_rows_yield_no_records() {
        let csv_text = write_csv(&[]).unwrap();
        assert!(csv_text.is_empty());
    }
}
