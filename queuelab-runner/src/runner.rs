//! Backtest runner: wires together config, data, feed, portfolio and metrics.
//!
//! Three entry points:
//! - `run_single_backtest()`: loads data per the config, then runs.
//! - `run_backtest_from_data()`: takes pre-loaded data; no I/O.
//! - `run_and_export()`: runs, then writes artifacts if the config asks for them.

use anyhow::Context;
use queuelab_core::domain::Symbol;
use queuelab_core::events::EventCounts;
use queuelab_core::feed::{BarFeed, FeedError, HistoricBarFeed};
use queuelab_core::metrics::{EquityCurve, SummaryStats};
use queuelab_core::portfolio::{NaiveSizer, Portfolio, PortfolioError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;

use crate::backtest::{run_event_loop, BacktestError};
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{load_bars, LoadError, LoadedData};
use crate::execution::SimulatedExecution;
use crate::reporting::{export_run, ArtifactPaths};
use crate::strategy::build_strategy;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: BacktestConfig,
    pub summary: SummaryStats,
    pub equity_curve: EquityCurve,
    /// Events pushed per kind over the run.
    pub events: EventCounts,
    /// Steps on the merged timeline.
    pub bar_count: usize,
    /// Bars synthesized by forward fill, per symbol.
    pub forward_filled: BTreeMap<Symbol, usize>,
    /// Input rows dropped for NaN fields, per symbol.
    pub void_rows: BTreeMap<Symbol, usize>,
    pub final_positions: BTreeMap<Symbol, i64>,
    pub final_cash: f64,
    pub final_total: f64,
    pub total_commission: f64,
    pub dataset_hash: String,
    pub synthetic: bool,
}

/// Run a single backtest from a config (loads data first).
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let loaded = load_bars(config)?;
    run_backtest_from_data(config, loaded)
}

/// Run a backtest with pre-loaded data; no I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    loaded: LoadedData,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id()?;
    let started = Instant::now();
    tracing::info!(
        run_id = %run_id,
        symbols = ?config.symbols,
        start = %config.window.start,
        end = %config.window.end,
        interval = %config.window.interval,
        "backtest started"
    );

    let mut feed = HistoricBarFeed::new(config.window, loaded.series)?;
    let mut portfolio = Portfolio::from_feed(&feed, config.initial_capital)?
        .with_sizer(NaiveSizer::new(config.sizer_unit));
    let mut strategy = build_strategy(&config.strategy);
    let mut execution = SimulatedExecution::new(config.commission.clone());

    let events = run_event_loop(
        &mut feed,
        &mut portfolio,
        strategy.as_mut(),
        &mut execution,
    )?;

    let equity_curve = portfolio.finalize()?.clone();
    let summary = portfolio.summary_stats(config.periods_per_year())?;

    let forward_filled = feed
        .symbols()
        .iter()
        .map(|symbol| Ok((symbol.clone(), feed.forward_filled(symbol)?)))
        .collect::<Result<BTreeMap<_, _>, FeedError>>()?;
    let final_positions = portfolio
        .current_positions()
        .iter()
        .map(|(symbol, quantity)| (symbol.to_string(), *quantity))
        .collect();
    let holdings = portfolio.current_holdings();

    tracing::info!(
        run_id = %run_id,
        bars = feed.len(),
        fills = events.fill,
        total_return = summary.total_return,
        sharpe = summary.sharpe_ratio,
        max_drawdown = summary.max_drawdown,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "backtest finished"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        summary,
        equity_curve,
        events,
        bar_count: feed.len(),
        forward_filled,
        void_rows: loaded.void_rows,
        final_positions,
        final_cash: holdings.cash(),
        final_total: holdings.total(),
        total_commission: holdings.commission(),
        dataset_hash: loaded.dataset_hash,
        synthetic: loaded.synthetic,
    })
}

/// Run a config and, when it names an output directory, write its artifacts.
pub fn run_and_export(
    config: &BacktestConfig,
) -> anyhow::Result<(BacktestResult, Option<ArtifactPaths>)> {
    let result = run_single_backtest(config)?;
    let paths = match &config.output_dir {
        Some(dir) => Some(
            export_run(dir, &result)
                .with_context(|| format!("Failed to export run {}", result.run_id))?,
        ),
        None => None,
    };
    Ok((result, paths))
}
