//! Performance metrics: pure functions over an already-materialized series.
//!
//! Every metric is total: degenerate input (empty, flat, zero capital) yields a
//! non-finite or zero result instead of a panic.

pub mod equity;
pub mod summary;

pub use equity::{EquityCurve, EquityPoint};
pub use summary::SummaryStats;

use serde::{Deserialize, Serialize};

/// Drawdown series and its extremes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawdowns {
    /// Decline from the running high-water mark, one entry per input point.
    pub series: Vec<f64>,
    /// Largest entry of `series` (0.0 for an empty or never-declining curve).
    pub max_drawdown: f64,
    /// Longest run of consecutive points with a positive drawdown.
    pub max_drawdown_duration: usize,
}

/// Annualized Sharpe ratio: `mean / stdev * sqrt(periods_per_year)`.
///
/// Non-finite returns (the undefined first return of a curve) are skipped.
/// Uses the sample standard deviation. Returns NaN when fewer than two finite
/// returns remain or when the standard deviation is zero.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let finite: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
    if finite.len() < 2 {
        return f64::NAN;
    }
    let mean = mean_f64(&finite);
    let std = std_dev(&finite);
    if std == 0.0 {
        return f64::NAN;
    }
    mean / std * periods_per_year.sqrt()
}

/// Absolute drawdowns: `hwm[t] - curve[t]` with `hwm[t] = max(curve[0..=t])`.
pub fn drawdowns(equity_curve: &[f64]) -> Drawdowns {
    drawdowns_with(equity_curve, |hwm, eq| hwm - eq)
}

/// Percentage drawdowns: `(hwm[t] - curve[t]) / hwm[t]`.
pub fn pct_drawdowns(equity_curve: &[f64]) -> Drawdowns {
    drawdowns_with(equity_curve, |hwm, eq| (hwm - eq) / hwm)
}

fn drawdowns_with(equity_curve: &[f64], decline: impl Fn(f64, f64) -> f64) -> Drawdowns {
    let mut series = Vec::with_capacity(equity_curve.len());
    let mut hwm = f64::NEG_INFINITY;
    let mut max_drawdown = 0.0_f64;
    let mut run = 0;
    let mut max_run = 0;

    for &eq in equity_curve {
        if eq > hwm {
            hwm = eq;
        }
        let dd = decline(hwm, eq);
        if dd > 0.0 {
            run += 1;
            max_run = max_run.max(run);
            max_drawdown = max_drawdown.max(dd);
        } else {
            run = 0;
        }
        series.push(dd);
    }

    Drawdowns {
        series,
        max_drawdown,
        max_drawdown_duration: max_run,
    }
}

/// Total return of a growth-factor curve starting at 1.0: `last - 1`.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match equity_curve.last() {
        Some(last) => last - 1.0,
        None => 0.0,
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn mean_f64(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
