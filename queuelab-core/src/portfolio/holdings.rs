//! Holdings and positions snapshots.

use crate::domain::{Symbol, SymbolMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Cash and per-symbol market values.
///
/// `total` is always re-derived as `cash + Σ market_values` (summed in symbol
/// order), so the accounting identity holds exactly, not approximately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holdings {
    market_values: SymbolMap<f64>,
    cash: f64,
    commission: f64,
    total: f64,
}

impl Holdings {
    /// All cash, no market exposure.
    pub fn new(symbols: Arc<[Symbol]>, initial_capital: f64) -> Self {
        Self::from_parts(SymbolMap::filled(symbols, 0.0), initial_capital, 0.0)
    }

    pub(crate) fn from_parts(market_values: SymbolMap<f64>, cash: f64, commission: f64) -> Self {
        let mut holdings = Self {
            market_values,
            cash,
            commission,
            total: 0.0,
        };
        holdings.recompute_total();
        holdings
    }

    pub fn market_values(&self) -> &SymbolMap<f64> {
        &self.market_values
    }

    pub fn market_value(&self, symbol: &str) -> Option<f64> {
        self.market_values.get(symbol).copied()
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Commission paid since the start of the run.
    pub fn commission(&self) -> f64 {
        self.commission
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    /// Sum of market values in symbol order.
    pub fn market_value_sum(&self) -> f64 {
        self.market_values.values().sum()
    }

    /// Whether `total == cash + Σ market values` holds exactly.
    pub fn is_balanced(&self) -> bool {
        self.total == self.cash + self.market_value_sum()
    }

    /// Book a signed cost against `symbol`. `None` for an unknown symbol,
    /// in which case nothing changes.
    pub(crate) fn apply_cost(&mut self, symbol: &str, cost: f64, commission: f64) -> Option<()> {
        let value = self.market_values.get_mut(symbol)?;
        *value += cost;
        self.commission += commission;
        self.cash -= cost + commission;
        self.recompute_total();
        Some(())
    }

    fn recompute_total(&mut self) {
        self.total = self.cash + self.market_value_sum();
    }
}

/// Holdings as of one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingsRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub holdings: Holdings,
}

/// Positions as of one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionsRecord {
    pub timestamp: DateTime<Utc>,
    pub positions: SymbolMap<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Arc<[Symbol]> {
        vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()].into()
    }

    #[test]
    fn starts_all_cash() {
        let holdings = Holdings::new(symbols(), 10_000.0);
        assert_eq!(holdings.cash(), 10_000.0);
        assert_eq!(holdings.total(), 10_000.0);
        assert_eq!(holdings.commission(), 0.0);
        assert_eq!(holdings.market_value("ETHUSDT"), Some(0.0));
        assert!(holdings.is_balanced());
    }

    #[test]
    fn apply_cost_moves_cash_into_market_value() {
        let mut holdings = Holdings::new(symbols(), 10_000.0);
        assert!(holdings.apply_cost("BTCUSDT", 1_000.0, 2.5).is_some());
        assert_eq!(holdings.cash(), 8_997.5);
        assert_eq!(holdings.market_value("BTCUSDT"), Some(1_000.0));
        assert_eq!(holdings.commission(), 2.5);
        assert_eq!(holdings.total(), 9_997.5);
        assert!(holdings.is_balanced());
    }

    #[test]
    fn apply_cost_rejects_unknown_symbol() {
        let mut holdings = Holdings::new(symbols(), 10_000.0);
        assert!(holdings.apply_cost("SOLUSDT", 1.0, 0.0).is_none());
        assert_eq!(holdings.cash(), 10_000.0);
    }
}
