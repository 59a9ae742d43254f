//! Run summary export (JSON).

use anyhow::{Context, Result};
use queuelab_core::domain::Symbol;
use queuelab_core::events::EventCounts;
use queuelab_core::metrics::SummaryStats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::BacktestConfig;
use crate::runner::BacktestResult;

/// One formatted statistic, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: String,
}

/// Contents of `summary.json`. Sharpe may be NaN, which serializes as null.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub run_id: String,
    pub config: BacktestConfig,
    pub stats: SummaryStats,
    pub display: Vec<SummaryLine>,
    pub events: EventCounts,
    pub bar_count: usize,
    pub forward_filled: BTreeMap<Symbol, usize>,
    pub final_positions: BTreeMap<Symbol, i64>,
    pub final_cash: f64,
    pub final_total: f64,
    pub total_commission: f64,
    pub dataset_hash: String,
    pub synthetic: bool,
}

impl RunSummary {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            schema_version: result.schema_version,
            run_id: result.run_id.clone(),
            config: result.config.clone(),
            stats: result.summary,
            display: result
                .summary
                .to_pairs()
                .into_iter()
                .map(|(label, value)| SummaryLine {
                    label: label.to_string(),
                    value,
                })
                .collect(),
            events: result.events,
            bar_count: result.bar_count,
            forward_filled: result.forward_filled.clone(),
            final_positions: result.final_positions.clone(),
            final_cash: result.final_cash,
            final_total: result.final_total,
            total_commission: result.total_commission,
            dataset_hash: result.dataset_hash.clone(),
            synthetic: result.synthetic,
        }
    }
}

pub fn write_summary_json(path: &Path, result: &BacktestResult) -> Result<()> {
    let summary = RunSummary::from_result(result);
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    Ok(())
}
