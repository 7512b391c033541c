use analysis_core::PriceColumn;
use anyhow::{bail, Context, Result};
use std::env;
use trend_analysis::DEFAULT_CONDITION_WARNING;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    pub column: PriceColumn,           // Close
    pub confidence_levels: Vec<f64>,   // 0.95, 0.75
    pub condition_warning: f64,        // 1e12
    pub log_prices: bool,              // false
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            column: PriceColumn::Close,
            confidence_levels: vec![0.95, 0.75],
            condition_warning: DEFAULT_CONDITION_WARNING,
            log_prices: false,
        }
    }
}

impl TrendConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            column: env::var("TREND_COLUMN")
                .unwrap_or_else(|_| "Close".to_string())
                .parse()
                .context("TREND_COLUMN")?,
            confidence_levels: parse_levels(
                &env::var("TREND_CONFIDENCE_LEVELS").unwrap_or_else(|_| "0.95,0.75".to_string()),
            )
            .context("TREND_CONFIDENCE_LEVELS")?,
            condition_warning: env::var("TREND_CONDITION_WARN")
                .unwrap_or_else(|_| DEFAULT_CONDITION_WARNING.to_string())
                .parse()
                .context("TREND_CONDITION_WARN")?,
            log_prices: env::var("TREND_LOG_PRICES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .context("TREND_LOG_PRICES")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Command-line flags override values loaded from the environment
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(column) = flag_value(args, "--column") {
            self.column = column.parse().context("--column")?;
        }
        if let Some(levels) = flag_value(args, "--levels") {
            self.confidence_levels = parse_levels(levels).context("--levels")?;
        }
        if args.iter().any(|a| a == "--log") {
            self.log_prices = true;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.confidence_levels.is_empty() {
            bail!("at least one confidence level is required");
        }
        if let Some(level) = self
            .confidence_levels
            .iter()
            .find(|l| !(**l > 0.0 && **l < 1.0))
        {
            bail!("confidence level {level} must be in (0, 1)");
        }
        if !(self.condition_warning > 0.0) {
            bail!("condition number warning threshold must be positive");
        }
        Ok(())
    }
}

/// Value following `flag` in the argument list
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Comma-separated confidence levels, e.g. "0.95,0.75"
pub fn parse_levels(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .with_context(|| format!("invalid confidence level '{s}'"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!(parse_levels("0.95,0.75").unwrap(), vec![0.95, 0.75]);
        assert_eq!(parse_levels(" 0.9 , ").unwrap(), vec![0.9]);
        assert!(parse_levels("0.9,high").is_err());
    }

    #[test]
    fn test_args_override_defaults() {
        let mut config = TrendConfig::default();
        config
            .apply_args(&args(&[
                "trend-cli", "prices.csv", "--column", "open", "--levels", "0.99", "--log",
            ]))
            .unwrap();
        assert_eq!(config.column, PriceColumn::Open);
        assert_eq!(config.confidence_levels, vec![0.99]);
        assert!(config.log_prices);
    }

    #[test]
    fn test_validate_rejects_bad_levels() {
        let mut config = TrendConfig::default();
        assert!(config.validate().is_ok());

        config.confidence_levels = vec![0.95, 1.0];
        assert!(config.validate().is_err());

        config.confidence_levels = Vec::new();
        assert!(config.validate().is_err());

        config.confidence_levels = vec![0.5];
        config.condition_warning = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flag_value_missing_argument() {
        let list = args(&["trend-cli", "--from"]);
        assert_eq!(flag_value(&list, "--from"), None);
        assert_eq!(flag_value(&list, "--to"), None);
    }
}
