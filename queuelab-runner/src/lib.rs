//! QueueLab Runner: everything around the engine needed to run a backtest end to end.
//!
//! This crate builds on `queuelab-core` to provide:
//! - TOML run configuration with content-addressed run ids
//! - Bar loading from CSV files or a seeded synthetic random walk
//! - A zero-slippage execution simulator with configurable commission
//! - A buy-and-hold reference strategy
//! - The driving loop, single-run entry points and parallel batches
//! - Artifact export (`equity.csv`, `equity.parquet`, `summary.json`)
//!
//! Libraries here only emit `tracing` events; installing a subscriber is left
//! to the binary embedding them.

pub mod backtest;
pub mod batch;
pub mod config;
pub mod data_loader;
pub mod execution;
pub mod reporting;
pub mod runner;
pub mod strategy;

pub use backtest::{run_event_loop, BacktestError};
pub use batch::run_batch;
pub use config::{BacktestConfig, CommissionConfig, ConfigError, DataSourceConfig, StrategyConfig};
pub use data_loader::{load_bars, LoadError, LoadedData};
pub use execution::{ExecutionError, ExecutionHandler, SimulatedExecution};
pub use reporting::{export_run, ArtifactManager, ArtifactPaths};
pub use runner::{
    run_and_export, run_backtest_from_data, run_single_backtest, BacktestResult, RunError,
};
pub use strategy::{build_strategy, BuyAndHold, Strategy, StrategyError};
