//! Serializable backtest configuration.
//!
//! A run is fully described by one TOML document:
//!
//! ```toml
//! symbols = ["BTCUSDT", "ETHUSDT"]
//! initial_capital = 100000.0
//!
//! [window]
//! start = "2024-01-01T00:00:00Z"
//! end = "2024-03-01T00:00:00Z"
//! interval = "1h"
//!
//! [commission]
//! type = "PER_TRADE"
//! amount = 1.0
//!
//! [strategy]
//! type = "BUY_AND_HOLD"
//! strength = 1.0
//!
//! [data]
//! type = "CSV"
//! dir = "data"
//! ```

use queuelab_core::domain::{Symbol, Window, WindowError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid window: {0}")]
    Window(#[from] WindowError),

    #[error("config lists no symbols")]
    NoSymbols,

    #[error("symbol listed more than once: {0}")]
    DuplicateSymbol(Symbol),

    #[error("initial capital must be non-negative and finite, got {0}")]
    InvalidCapital(f64),

    #[error("strategy strength must be in (0, 1], got {0}")]
    InvalidStrength(f64),

    #[error("invalid commission: {0}")]
    InvalidCommission(String),

    #[error("sizer unit must be at least 1")]
    ZeroSizerUnit,

    #[error("periods per year must be positive and finite, got {0}")]
    InvalidPeriodsPerYear(f64),
}

/// Serializable configuration for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    /// Instruments to replay, in portfolio column order.
    pub symbols: Vec<Symbol>,

    pub window: Window,

    pub initial_capital: f64,

    #[serde(default)]
    pub commission: CommissionConfig,

    pub strategy: StrategyConfig,

    pub data: DataSourceConfig,

    /// Units bought or sold per full-strength entry signal.
    #[serde(default = "default_sizer_unit")]
    pub sizer_unit: u64,

    /// Annualization factor for the Sharpe ratio; derived from the window's
    /// interval when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods_per_year: Option<f64>,

    /// Artifact root; each run writes into `<output_dir>/<run_id>/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

fn default_sizer_unit() -> u64 {
    100
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check everything serde cannot express in types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::DuplicateSymbol(symbol.clone()));
            }
        }

        Window::new(self.window.start, self.window.end, self.window.interval)?;

        if !(self.initial_capital.is_finite() && self.initial_capital >= 0.0) {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        self.commission.validate()?;

        match self.strategy {
            StrategyConfig::BuyAndHold { strength } => {
                if !(strength > 0.0 && strength <= 1.0) {
                    return Err(ConfigError::InvalidStrength(strength));
                }
            }
        }

        if self.sizer_unit == 0 {
            return Err(ConfigError::ZeroSizerUnit);
        }
        if let Some(periods) = self.periods_per_year {
            if !(periods.is_finite() && periods > 0.0) {
                return Err(ConfigError::InvalidPeriodsPerYear(periods));
            }
        }
        Ok(())
    }

    /// Annualization factor used for the Sharpe ratio.
    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
            .unwrap_or_else(|| self.window.interval.periods_per_year())
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId (and an artifact directory).
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        let hash = blake3::hash(json.as_bytes());
        Ok(hash.to_hex().to_string())
    }
}

/// Commission configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionConfig {
    /// Fixed per-fill commission
    PerTrade { amount: f64 },

    /// Per-unit commission
    PerShare { amount: f64 },

    /// Percentage of fill value
    Percentage { percent: f64 },

    /// No commission
    #[default]
    None,
}

impl CommissionConfig {
    /// Commission charged for `quantity` units filled at `price`.
    pub fn commission(&self, quantity: u64, price: f64) -> f64 {
        match self {
            Self::PerTrade { amount } => *amount,
            Self::PerShare { amount } => amount * quantity as f64,
            Self::Percentage { percent } => price * quantity as f64 * percent / 100.0,
            Self::None => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (name, value) = match self {
            Self::PerTrade { amount } => ("per-trade amount", *amount),
            Self::PerShare { amount } => ("per-share amount", *amount),
            Self::Percentage { percent } => ("percentage", *percent),
            Self::None => return Ok(()),
        };
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::InvalidCommission(format!(
                "{name} must be non-negative and finite, got {value}"
            )));
        }
        Ok(())
    }
}

/// Strategy configuration (serializable enum).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyConfig {
    /// Go long every symbol on its first bar and hold to the end.
    BuyAndHold {
        #[serde(default = "default_strength")]
        strength: f64,
    },
}

fn default_strength() -> f64 {
    1.0
}

/// Where bars come from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSourceConfig {
    /// One `<SYMBOL>.csv` per symbol in `dir`.
    Csv { dir: PathBuf },

    /// Seeded random walk, one bar per interval step across the window.
    Synthetic {
        seed: u64,
        #[serde(default = "default_start_price")]
        start_price: f64,
    },
}

fn default_start_price() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuelab_core::domain::Interval;

    const CONFIG: &str = r#"
symbols = ["BTCUSDT", "ETHUSDT"]
initial_capital = 100000.0

[window]
start = "2024-01-01T00:00:00Z"
end = "2024-03-01T00:00:00Z"
interval = "1h"

[commission]
type = "PER_TRADE"
amount = 1.0

[strategy]
type = "BUY_AND_HOLD"
strength = 0.5

[data]
type = "CSV"
dir = "data"
"#;

    #[test]
    fn parses_full_document() {
        let config = BacktestConfig::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.symbols, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.window.interval, Interval::Hour1);
        assert_eq!(config.commission, CommissionConfig::PerTrade { amount: 1.0 });
        assert_eq!(config.strategy, StrategyConfig::BuyAndHold { strength: 0.5 });
        assert_eq!(
            config.data,
            DataSourceConfig::Csv {
                dir: PathBuf::from("data")
            }
        );
        assert_eq!(config.sizer_unit, 100);
        assert_eq!(config.periods_per_year(), 8_760.0);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn optional_sections_default() {
        let content = r#"
symbols = ["A"]
initial_capital = 1000.0
window = { start = "2024-01-01T00:00:00Z", end = "2024-01-02T00:00:00Z", interval = "1d" }
strategy = { type = "BUY_AND_HOLD" }
data = { type = "SYNTHETIC", seed = 7 }
periods_per_year = 252.0
"#;
        let config = BacktestConfig::from_toml_str(content).unwrap();
        assert_eq!(config.commission, CommissionConfig::None);
        assert_eq!(config.strategy, StrategyConfig::BuyAndHold { strength: 1.0 });
        assert_eq!(
            config.data,
            DataSourceConfig::Synthetic {
                seed: 7,
                start_price: 100.0
            }
        );
        assert_eq!(config.periods_per_year(), 252.0);
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = BacktestConfig::from_toml_str(CONFIG).unwrap();
        let id1 = config.run_id().unwrap();
        let id2 = config.run_id().unwrap();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let config1 = BacktestConfig::from_toml_str(CONFIG).unwrap();
        let mut config2 = config1.clone();
        config2.initial_capital = 50_000.0;
        assert_ne!(config1.run_id().unwrap(), config2.run_id().unwrap());
    }

    #[test]
    fn rejects_inverted_window() {
        let content = CONFIG.replace("2024-03-01T00:00:00Z", "2023-03-01T00:00:00Z");
        assert!(matches!(
            BacktestConfig::from_toml_str(&content),
            Err(ConfigError::Window(WindowError::Inverted { .. }))
        ));
    }

    #[test]
    fn rejects_bad_values() {
        let dup = CONFIG.replace(r#"["BTCUSDT", "ETHUSDT"]"#, r#"["BTCUSDT", "BTCUSDT"]"#);
        assert!(matches!(
            BacktestConfig::from_toml_str(&dup),
            Err(ConfigError::DuplicateSymbol(s)) if s == "BTCUSDT"
        ));

        let capital = CONFIG.replace("100000.0", "-1.0");
        assert!(matches!(
            BacktestConfig::from_toml_str(&capital),
            Err(ConfigError::InvalidCapital(_))
        ));

        let capital = CONFIG.replace("100000.0", "nan");
        assert!(matches!(
            BacktestConfig::from_toml_str(&capital),
            Err(ConfigError::InvalidCapital(_))
        ));

        // zero capital is a legal, if degenerate, run
        let zero = CONFIG.replace("100000.0", "0.0");
        assert_eq!(BacktestConfig::from_toml_str(&zero).unwrap().initial_capital, 0.0);

        let strength = CONFIG.replace("strength = 0.5", "strength = 1.5");
        assert!(matches!(
            BacktestConfig::from_toml_str(&strength),
            Err(ConfigError::InvalidStrength(_))
        ));

        let commission = CONFIG.replace("amount = 1.0", "amount = -1.0");
        assert!(matches!(
            BacktestConfig::from_toml_str(&commission),
            Err(ConfigError::InvalidCommission(_))
        ));

        let interval = CONFIG.replace(r#"interval = "1h""#, r#"interval = "7h""#);
        assert!(matches!(
            BacktestConfig::from_toml_str(&interval),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn commission_models() {
        assert_eq!(CommissionConfig::PerTrade { amount: 2.0 }.commission(10, 100.0), 2.0);
        assert_eq!(CommissionConfig::PerShare { amount: 0.5 }.commission(10, 100.0), 5.0);
        assert_eq!(
            CommissionConfig::Percentage { percent: 0.1 }.commission(10, 100.0),
            1.0
        );
        assert_eq!(CommissionConfig::None.commission(10, 100.0), 0.0);
    }

    #[test]
    fn test_config_serialization() {
        let config = BacktestConfig::from_toml_str(CONFIG).unwrap();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let deserialized: BacktestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
