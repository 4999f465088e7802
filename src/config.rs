use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use thiserror::Error;

/// Detection thresholds and capital sizing.
///
/// Immutable once constructed; `new` rejects threshold combinations that
/// would size capital incorrectly, so a `ScanConfig` in hand is always
/// safe to evaluate against.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Minimum absolute profit (in $) before a group is actionable
    pub min_profit: Decimal,
    /// Minimum return fraction (0.01 = 1%)
    pub min_roi: Decimal,
    /// Default stake per leg (in $)
    pub trade_size: Decimal,
    /// Upper bound on total capital committed per opportunity (in $)
    pub max_trade_size: Decimal,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("minimum profit threshold must be >= 0, got {0}")]
    NegativeMinProfit(Decimal),

    #[error("minimum ROI threshold must be >= 0, got {0}")]
    NegativeMinRoi(Decimal),

    #[error("trade size must be positive, got {0}")]
    NonPositiveTradeSize(Decimal),

    #[error("max trade size {max} is below trade size {trade_size}")]
    MaxBelowTradeSize { max: Decimal, trade_size: Decimal },
}

impl ScanConfig {
    pub fn new(
        min_profit: Decimal,
        min_roi: Decimal,
        trade_size: Decimal,
        max_trade_size: Decimal,
    ) -> Result<Self, ConfigError> {
        if min_profit < Decimal::ZERO {
            return Err(ConfigError::NegativeMinProfit(min_profit));
        }
        if min_roi < Decimal::ZERO {
            return Err(ConfigError::NegativeMinRoi(min_roi));
        }
        if trade_size <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveTradeSize(trade_size));
        }
        if max_trade_size < trade_size {
            return Err(ConfigError::MaxBelowTradeSize {
                max: max_trade_size,
                trade_size,
            });
        }

        Ok(Self {
            min_profit,
            min_roi,
            trade_size,
            max_trade_size,
        })
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        // $0.02 minimum covers gas, 1% ROI floor, $5 per leg, $25 cap
        Self {
            min_profit: dec!(0.02),
            min_roi: dec!(0.01),
            trade_size: dec!(5.0),
            max_trade_size: dec!(25.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Simmer API (execution); scan-only runs work without a key
    pub simmer_api_key: Option<String>,
    pub simmer_api_url: String,

    // Polymarket market data
    pub gamma_url: String,

    // Detection thresholds
    pub scan: ScanConfig,

    // Mode
    pub dry_run: bool,
    pub log_level: String,

    // Alerts
    pub discord_webhook: Option<String>,

    // Scan history output
    pub data_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let min_profit: Decimal = env::var("MIN_PROFIT_THRESHOLD")
            .unwrap_or_else(|_| "0.02".to_string())
            .parse()
            .context("Invalid MIN_PROFIT_THRESHOLD")?;
        let min_roi: Decimal = env::var("MIN_ROI_THRESHOLD")
            .unwrap_or_else(|_| "0.01".to_string())
            .parse()
            .context("Invalid MIN_ROI_THRESHOLD")?;
        let trade_size: Decimal = env::var("TRADE_SIZE")
            .unwrap_or_else(|_| "5.0".to_string())
            .parse()
            .context("Invalid TRADE_SIZE")?;
        let max_trade_size: Decimal = env::var("MAX_TRADE_SIZE")
            .unwrap_or_else(|_| "25.0".to_string())
            .parse()
            .context("Invalid MAX_TRADE_SIZE")?;

        let scan = ScanConfig::new(min_profit, min_roi, trade_size, max_trade_size)
            .context("Invalid threshold configuration")?;

        Ok(Config {
            simmer_api_key: env::var("SIMMER_API_KEY").ok(),
            simmer_api_url: env::var("SIMMER_API_URL")
                .unwrap_or_else(|_| "https://api.simmer.markets".to_string()),

            gamma_url: env::var("GAMMA_API_URL")
                .unwrap_or_else(|_| "https://gamma-api.polymarket.com".to_string()),

            scan,

            dry_run: env::var("DRY_RUN")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            discord_webhook: env::var("DISCORD_WEBHOOK").ok(),

            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_are_valid() {
        let config = ScanConfig::default();
        assert!(ScanConfig::new(
            config.min_profit,
            config.min_roi,
            config.trade_size,
            config.max_trade_size,
        )
        .is_ok());
    }

    #[test]
    fn test_rejects_negative_min_profit() {
        let err = ScanConfig::new(dec!(-0.01), dec!(0.01), dec!(5), dec!(25)).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeMinProfit(_)));
    }

    #[test]
    fn test_rejects_negative_min_roi() {
        let err = ScanConfig::new(dec!(0.02), dec!(-1), dec!(5), dec!(25)).unwrap_err();
        assert!(matches!(err, ConfigError::NegativeMinRoi(_)));
    }

    #[test]
    fn test_rejects_zero_trade_size() {
        let err = ScanConfig::new(dec!(0.02), dec!(0.01), dec!(0), dec!(25)).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveTradeSize(_)));
    }

    #[test]
    fn test_rejects_cap_below_trade_size() {
        let err = ScanConfig::new(dec!(0.02), dec!(0.01), dec!(10), dec!(5)).unwrap_err();
        assert!(matches!(err, ConfigError::MaxBelowTradeSize { .. }));
    }

    #[test]
    fn test_cap_equal_to_trade_size_is_valid() {
        assert!(ScanConfig::new(dec!(0.02), dec!(0.01), dec!(5), dec!(5)).is_ok());
    }
}
