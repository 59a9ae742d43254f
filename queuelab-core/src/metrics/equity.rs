//! Equity curve derived from a holdings history.

use super::{drawdowns, sharpe_ratio, total_return, SummaryStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Portfolio total (cash + market values).
    pub total: f64,
    /// Period return `total[t] / total[t-1] - 1`; NaN on the first row.
    pub returns: f64,
    /// Cumulative growth factor, 1.0 on the first row.
    pub equity_curve: f64,
    /// Decline of `equity_curve` from its running peak.
    pub drawdown: f64,
}

/// Immutable equity curve, one point per holdings row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCurve {
    points: Vec<EquityPoint>,
    max_drawdown: f64,
    max_drawdown_duration: usize,
}

impl EquityCurve {
    /// Build from `(timestamp, total)` rows in time order.
    pub fn from_totals(rows: impl IntoIterator<Item = (DateTime<Utc>, f64)>) -> Self {
        let mut points: Vec<EquityPoint> = Vec::new();
        let mut growth = 1.0;
        let mut prev_total: Option<f64> = None;

        for (timestamp, total) in rows {
            let returns = match prev_total {
                Some(prev) => total / prev - 1.0,
                None => f64::NAN,
            };
            if prev_total.is_some() {
                growth *= 1.0 + returns;
            }
            points.push(EquityPoint {
                timestamp,
                total,
                returns,
                equity_curve: growth,
                drawdown: 0.0,
            });
            prev_total = Some(total);
        }

        let growth_series: Vec<f64> = points.iter().map(|p| p.equity_curve).collect();
        let dd = drawdowns(&growth_series);
        for (point, drawdown) in points.iter_mut().zip(dd.series) {
            point.drawdown = drawdown;
        }

        Self {
            points,
            max_drawdown: dd.max_drawdown,
            max_drawdown_duration: dd.max_drawdown_duration,
        }
    }

    pub fn points(&self) -> &[EquityPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.returns).collect()
    }

    pub fn growth(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.equity_curve).collect()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn max_drawdown_duration(&self) -> usize {
        self.max_drawdown_duration
    }

    /// Headline statistics of the curve.
    pub fn summary(&self, periods_per_year: f64) -> SummaryStats {
        SummaryStats {
            total_return: total_return(&self.growth()),
            sharpe_ratio: sharpe_ratio(&self.returns(), periods_per_year),
            max_drawdown: self.max_drawdown,
            max_drawdown_duration: self.max_drawdown_duration,
        }
    }
}
