//! Independent backtests in parallel.
//!
//! Each configuration gets its own feed, portfolio, queue and execution
//! handler; nothing is shared between runs.

use rayon::prelude::*;

use crate::config::BacktestConfig;
use crate::runner::{run_single_backtest, BacktestResult, RunError};

/// Run every config, in parallel or sequentially; results come back in input order.
pub fn run_batch(
    configs: &[BacktestConfig],
    parallel: bool,
) -> Vec<Result<BacktestResult, RunError>> {
    tracing::info!(runs = configs.len(), parallel, "batch started");
    let results: Vec<Result<BacktestResult, RunError>> = if parallel {
        configs.par_iter().map(run_single_backtest).collect()
    } else {
        configs.iter().map(run_single_backtest).collect()
    };

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::warn!(failed, runs = results.len(), "batch finished with failures");
    } else {
        tracing::info!(runs = results.len(), "batch finished");
    }
    results
}

/// Results of a batch keyed by run id, failures dropped.
pub fn successful_by_run_id(
    results: Vec<Result<BacktestResult, RunError>>,
) -> std::collections::BTreeMap<String, BacktestResult> {
    results
        .into_iter()
        .filter_map(Result::ok)
        .map(|result| (result.run_id.clone(), result))
        .collect()
}
