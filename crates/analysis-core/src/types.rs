use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// Daily OHLCV bar as delivered by the series provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub dividends: f64,
    #[serde(default)]
    pub stock_splits: f64,
}

impl Bar {
    /// Ordinal key of the bar: seconds since the Unix epoch, with sub-second precision.
    pub fn ordinal(&self) -> f64 {
        timestamp_to_ordinal(&self.timestamp)
    }

    pub fn value(&self, column: PriceColumn) -> f64 {
        match column {
            PriceColumn::Open => self.open,
            PriceColumn::High => self.high,
            PriceColumn::Low => self.low,
            PriceColumn::Close => self.close,
            PriceColumn::Volume => self.volume,
            PriceColumn::Dividends => self.dividends,
            PriceColumn::StockSplits => self.stock_splits,
        }
    }

    pub fn value_mut(&mut self, column: PriceColumn) -> &mut f64 {
        match column {
            PriceColumn::Open => &mut self.open,
            PriceColumn::High => &mut self.high,
            PriceColumn::Low => &mut self.low,
            PriceColumn::Close => &mut self.close,
            PriceColumn::Volume => &mut self.volume,
            PriceColumn::Dividends => &mut self.dividends,
            PriceColumn::StockSplits => &mut self.stock_splits,
        }
    }
}

/// Convert a timestamp to the numeric ordinal used as the regression feature.
pub fn timestamp_to_ordinal(ts: &DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_nanos()) * 1e-9
}

/// Numeric columns of the provider's price table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceColumn {
    Open,
    High,
    Low,
    Close,
    Volume,
    Dividends,
    StockSplits,
}

impl PriceColumn {
    pub const ALL: [PriceColumn; 7] = [
        PriceColumn::Open,
        PriceColumn::High,
        PriceColumn::Low,
        PriceColumn::Close,
        PriceColumn::Volume,
        PriceColumn::Dividends,
        PriceColumn::StockSplits,
    ];

    /// Column header as the provider names it
    pub fn name(&self) -> &'static str {
        match self {
            PriceColumn::Open => "Open",
            PriceColumn::High => "High",
            PriceColumn::Low => "Low",
            PriceColumn::Close => "Close",
            PriceColumn::Volume => "Volume",
            PriceColumn::Dividends => "Dividends",
            PriceColumn::StockSplits => "Stock Splits",
        }
    }

    /// Whether the column holds a price (and is log-transformed by `log_prices`)
    pub fn is_price(&self) -> bool {
        matches!(
            self,
            PriceColumn::Open | PriceColumn::High | PriceColumn::Low | PriceColumn::Close
        )
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PriceColumn {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();

        PriceColumn::ALL
            .into_iter()
            .find(|c| c.name().replace(' ', "").to_ascii_lowercase() == normalized)
            .ok_or_else(|| AnalysisError::InvalidParameter(format!("unknown price column '{s}'")))
    }
}

/// Time-ordered price history for one symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn ordinal_keys(&self) -> Vec<f64> {
        self.bars.iter().map(Bar::ordinal).collect()
    }

    pub fn values(&self, column: PriceColumn) -> Vec<f64> {
        self.bars.iter().map(|b| b.value(column)).collect()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Same series ordered by timestamp (stable for equal timestamps)
    pub fn sorted(mut self) -> Self {
        self.bars.sort_by_key(|b| b.timestamp);
        self
    }

    /// Natural log of Open/High/Low/Close. Volume, dividends and splits are left as-is.
    ///
    /// Non-positive prices follow `f64::ln` (`-inf` for zero, NaN below zero).
    pub fn log_prices(&self) -> Self {
        let bars = self
            .bars
            .iter()
            .map(|b| {
                let mut bar = b.clone();
                for column in PriceColumn::ALL.into_iter().filter(PriceColumn::is_price) {
                    *bar.value_mut(column) = b.value(column).ln();
                }
                bar
            })
            .collect();

        Self {
            symbol: self.symbol.clone(),
            bars,
        }
    }
}

/// Trend line with a symmetric confidence band, aligned element-wise by index.
///
/// `x` covers the full series even when the fit used a narrower window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub x: Vec<f64>,
    pub predicted: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub confidence_level: f64,
    /// Population std of residuals inside the fitting window
    pub sigma: f64,
    /// Two-sided standard-normal quantile for `confidence_level`
    pub z: f64,
    pub fit_rows: usize,
    pub condition_number: f64,
}

impl ConfidenceBand {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Distance between the upper and lower bound (constant across the band)
    pub fn width(&self) -> f64 {
        2.0 * self.sigma * self.z
    }

    /// Borrow the four aligned sequences as `(x, predicted, lower, upper)`
    pub fn as_tuple(&self) -> (&[f64], &[f64], &[f64], &[f64]) {
        (&self.x, &self.predicted, &self.lower, &self.upper)
    }
}
