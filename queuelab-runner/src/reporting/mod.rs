//! Reporting and artifact export pipeline.

pub mod artifacts;

pub use artifacts::{ArtifactManager, ArtifactPaths};

use anyhow::Result;
use queuelab_core::metrics::SummaryStats;
use std::path::Path;

use crate::runner::BacktestResult;

/// Write every artifact of `result` under `<output_dir>/<run_id>/`.
pub fn export_run(output_dir: impl AsRef<Path>, result: &BacktestResult) -> Result<ArtifactPaths> {
    ArtifactManager::new(output_dir)?.save_run(result)
}

/// Human-readable summary, one `label: value` line per statistic.
pub fn render_summary(stats: &SummaryStats) -> String {
    let pairs = stats.to_pairs();
    let width = pairs.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(label, value)| format!("{label:<width$}  {value}\n"))
        .collect()
}
