//! Headline run statistics and their display form.

use serde::{Deserialize, Serialize};

/// Summary statistics of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Final growth factor minus one (fraction, not percent).
    pub total_return: f64,
    pub sharpe_ratio: f64,
    /// Largest absolute decline of the growth factor from its peak.
    pub max_drawdown: f64,
    /// Longest drawdown, in bars.
    pub max_drawdown_duration: usize,
}

impl SummaryStats {
    /// Ordered `(label, formatted value)` pairs.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Return", format!("{:.2}%", self.total_return * 100.0)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe_ratio)),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0)),
            (
                "Max Drawdown Duration",
                format!("{}", self.max_drawdown_duration),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_are_ordered_and_formatted() {
        let stats = SummaryStats {
            total_return: 0.1234,
            sharpe_ratio: 1.5,
            max_drawdown: 0.0321,
            max_drawdown_duration: 7,
        };
        let pairs = stats.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("Total Return", "12.34%".to_string()),
                ("Sharpe Ratio", "1.50".to_string()),
                ("Max Drawdown", "3.21%".to_string()),
                ("Max Drawdown Duration", "7".to_string()),
            ]
        );
    }

    #[test]
    fn nan_sharpe_is_reported_not_hidden() {
        let stats = SummaryStats {
            total_return: 0.0,
            sharpe_ratio: f64::NAN,
            max_drawdown: 0.0,
            max_drawdown_duration: 0,
        };
        assert_eq!(stats.to_pairs()[1].1, "NaN");
    }
}
