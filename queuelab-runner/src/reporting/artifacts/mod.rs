//! Artifact manager for persisting run outputs.

mod equity;
mod summary;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::runner::BacktestResult;

pub use equity::{read_equity_csv, EQUITY_CSV_HEADER};
pub use summary::RunSummary;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub equity_csv: PathBuf,
    pub equity_parquet: PathBuf,
    pub summary_json: PathBuf,
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .context("Failed to create artifact output directory")?;
        Ok(Self { output_dir })
    }

    /// Save complete run artifacts.
    pub fn save_run(&self, result: &BacktestResult) -> Result<ArtifactPaths> {
        let run_dir = self.output_dir.join(&result.run_id);
        std::fs::create_dir_all(&run_dir)
            .context("Failed to create run artifact directory")?;

        let equity_csv = run_dir.join("equity.csv");
        let equity_parquet = run_dir.join("equity.parquet");
        equity::write_equity_csv(&equity_csv, &result.equity_curve)?;
        equity::write_equity_parquet(&equity_parquet, &result.equity_curve)?;

        let summary_json = run_dir.join("summary.json");
        summary::write_summary_json(&summary_json, result)?;

        tracing::info!(run_id = %result.run_id, dir = %run_dir.display(), "artifacts written");
        Ok(ArtifactPaths {
            run_dir,
            equity_csv,
            equity_parquet,
            summary_json,
        })
    }
}
