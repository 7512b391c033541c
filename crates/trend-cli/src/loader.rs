//! Price history from a CSV export in the provider's column layout:
//! `Date,Open,High,Low,Close,Volume,Dividends,Stock Splits`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use analysis_core::{Bar, PriceSeries};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "Datetime")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
    #[serde(rename = "Dividends", default)]
    dividends: f64,
    #[serde(rename = "Stock Splits", default)]
    stock_splits: f64,
}

pub fn load_csv(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let symbol = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    let series =
        parse_csv(file, &symbol).with_context(|| format!("Failed to read {}", path.display()))?;
    tracing::info!("Loaded {} bars for {}", series.len(), series.symbol);
    Ok(series)
}

/// Parse CSV rows into a time-ordered series
pub fn parse_csv<R: Read>(reader: R, symbol: &str) -> Result<PriceSeries> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    for (i, record) in csv_reader.deserialize::<CsvRow>().enumerate() {
        let row = record.with_context(|| format!("malformed row {}", i + 1))?;
        let timestamp = parse_timestamp(&row.date).with_context(|| format!("row {}", i + 1))?;
        bars.push(Bar {
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            dividends: row.dividends,
            stock_splits: row.stock_splits,
        });
    }

    Ok(PriceSeries::new(symbol, bars).sorted())
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS±HH:MM` (the provider's export) or a
/// bare date, which is taken as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts.and_utc());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognised date '{raw}'"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .with_context(|| format!("invalid date '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::PriceColumn;
    use chrono::TimeZone;

    const SAMPLE: &str = "\
Date,Open,High,Low,Close,Volume,Dividends,Stock Splits
2024-01-03 00:00:00-05:00,10.5,11.0,10.0,10.8,1200,0.0,0.0
2024-01-02 00:00:00-05:00,10.0,10.6,9.8,10.4,1000,0.0,0.0
2024-01-04 00:00:00-05:00,10.8,11.4,10.7,11.2,1500,0.25,0.0
";

    #[test]
    fn test_parse_provider_export() {
        let series = parse_csv(SAMPLE.as_bytes(), "ACME").unwrap();
        assert_eq!(series.symbol, "ACME");
        assert_eq!(series.len(), 3);
        assert_eq!(series.values(PriceColumn::Close), vec![10.4, 10.8, 11.2]);
        assert_eq!(series.bars[2].dividends, 0.25);
        assert_eq!(
            series.first_timestamp().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_optional_columns_default_to_zero() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,1.5,100\n";
        let series = parse_csv(csv.as_bytes(), "X").unwrap();
        assert_eq!(series.bars[0].stock_splits, 0.0);
        assert_eq!(series.bars[0].dividends, 0.0);
    }

    #[test]
    fn test_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-01-02T00:00:00Z").unwrap(), midnight);
        assert_eq!(parse_timestamp("2024-01-02 00:00:00").unwrap(), midnight);
        assert!(parse_timestamp("02/01/2024").is_err());
    }

    #[test]
    fn test_malformed_row() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,2,0.5,abc,100\n";
        assert!(parse_csv(csv.as_bytes(), "X").is_err());
    }
}
