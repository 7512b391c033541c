//! trend-cli: fit a linear price trend and print confidence bands as JSON.
//!
//! Usage:
//!   cargo run -p trend-cli -- prices/AAPL.csv
//!   cargo run -p trend-cli -- prices/AAPL.csv --from 2020-01-01 --to 2022-12-31
//!   cargo run -p trend-cli -- prices/AAPL.csv --column Open --levels 0.99,0.9 --log

use std::path::Path;

use analysis_core::{ConfidenceBand, PriceColumn};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use trend_analysis::ConfidenceEstimator;

mod config;
mod loader;

use config::{flag_value, TrendConfig};

const USAGE: &str =
    "usage: trend-cli <prices.csv> [--column C] [--from DATE] [--to DATE] [--levels L1,L2] [--log]";

#[derive(Debug, Serialize)]
struct TrendReport {
    symbol: String,
    column: PriceColumn,
    log_prices: bool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    bands: Vec<ConfidenceBand>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trend_cli=info,trend_analysis=info".into());
    // Logs go to stderr so stdout stays valid JSON
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .filter(|a| !a.starts_with("--"))
        .context(USAGE)?;

    let mut config = TrendConfig::from_env()?;
    config.apply_args(&args)?;
    tracing::debug!(?config, "Configuration loaded");

    let mut series = loader::load_csv(Path::new(path))?;
    if config.log_prices {
        series = series.log_prices();
    }

    let (first, last) = series
        .first_timestamp()
        .zip(series.last_timestamp())
        .context("price file contains no rows")?;

    let window_start = match flag_value(&args, "--from") {
        Some(raw) => loader::parse_timestamp(raw).context("--from")?,
        None => first,
    };
    let window_end = match flag_value(&args, "--to") {
        Some(raw) => end_of(raw)?,
        None => last,
    };

    tracing::info!(
        "Fitting {} {} trend on {} .. {} ({} levels)",
        series.symbol,
        config.column,
        window_start.date_naive(),
        window_end.date_naive(),
        config.confidence_levels.len()
    );

    let estimator = ConfidenceEstimator::with_condition_warning(config.condition_warning);
    let bands = estimator
        .compute_levels(
            &series,
            config.column,
            &config.confidence_levels,
            window_start,
            window_end,
        )
        .context("Failed to compute confidence bands")?;

    for band in &bands {
        tracing::info!(
            "  {:.0}% band: sigma {:.6}, z {:.4}, {} rows fitted, condition number {:.3e}",
            band.confidence_level * 100.0,
            band.sigma,
            band.z,
            band.fit_rows,
            band.condition_number
        );
    }

    let report = TrendReport {
        symbol: series.symbol.clone(),
        column: config.column,
        log_prices: config.log_prices,
        window_start,
        window_end,
        bands,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Upper window bound; a bare date covers that whole day.
fn end_of(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        let next_day = date
            .succ_opt()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .context("--to date out of range")?;
        return Ok(next_day.and_utc() - Duration::nanoseconds(1));
    }
    loader::parse_timestamp(raw).context("--to")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn last_instant_of(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 23, 59, 59).unwrap() + Duration::nanoseconds(999_999_999)
    }

    #[test]
    fn test_end_of_bare_date_covers_whole_day() {
        assert_eq!(end_of("2024-01-05").unwrap(), last_instant_of(2024, 1, 5));
    }

    #[test]
    fn test_end_of_unpadded_date_covers_whole_day() {
        assert_eq!(end_of("2024-1-5").unwrap(), last_instant_of(2024, 1, 5));
    }

    #[test]
    fn test_end_of_full_timestamp_is_exact() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 5, 16, 0, 0).unwrap();
        assert_eq!(end_of("2024-01-05T16:00:00Z").unwrap(), expected);
        assert_eq!(end_of("2024-01-05 16:00:00").unwrap(), expected);
    }

    #[test]
    fn test_end_of_rejects_garbage() {
        assert!(end_of("yesterday").is_err());
    }
}
