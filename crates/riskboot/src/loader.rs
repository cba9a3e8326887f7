//! CSV panel loader.
//!
//! Reads long-format price files with a `date,category,ticker,value` header
//! into a [`PricePanel`]. An empty value field becomes `f64::NAN`, the
//! panel's missing-value sentinel, so incomplete cross-sections are filtered
//! by the engine rather than the loader.

use std::path::Path;

use jiff::civil::Date;
use riskboot_core::PricePanel;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: Date,
    category: String,
    ticker: String,
    value: Option<f64>,
}

/// Load a long-format CSV file into a price panel.
pub fn load_panel(path: &Path) -> color_eyre::Result<PricePanel> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut panel = PricePanel::new();
    let mut observations = 0usize;
    for record in reader.deserialize() {
        let record: PriceRecord = record?;
        panel.insert(
            record.date,
            record.category,
            record.ticker,
            record.value.unwrap_or(f64::NAN),
        );
        observations += 1;
    }
    tracing::debug!(
        "loaded {observations} observations across {} dates",
        panel.num_dates()
    );
    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_panel_with_missing_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "date,category,ticker,value").unwrap();
        writeln!(file, "2024-01-01,Close,AAA,100.0").unwrap();
        writeln!(file, "2024-01-01,Close,BBB,200.0").unwrap();
        writeln!(file, "2024-01-02,Close,AAA,101.0").unwrap();
        writeln!(file, "2024-01-02,Close,BBB,").unwrap();
        writeln!(file, "2024-01-03,Close,AAA,103.02").unwrap();
        writeln!(file, "2024-01-03,Close,BBB,202.0").unwrap();

        let panel = load_panel(file.path()).unwrap();
        assert_eq!(panel.num_dates(), 3);

        // The empty BBB value on day 2 drops that date during selection.
        let matrix = panel.select_category("Close").unwrap();
        assert_eq!(matrix.num_assets(), 2);
        assert_eq!(matrix.num_steps(), 1);
        assert!((matrix.rows()[0][0] - 0.0302).abs() < 1e-9);
        assert!((matrix.rows()[0][1] - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_load_panel_missing_file() {
        assert!(load_panel(Path::new("/nonexistent/prices.csv")).is_err());
    }
}
