//! QueueLab Core: event queue, bar feed, portfolio accounting, performance metrics.
//!
//! This crate contains the heart of the event-driven backtester:
//! - Domain types (bars, windows, intervals, per-symbol maps)
//! - The four event kinds and the FIFO queue they travel through
//! - A historical bar feed that releases one aligned bar per step
//! - The portfolio state machine (positions, holdings, naive sizing)
//! - Equity curve, Sharpe ratio and drawdown statistics

pub mod domain;
pub mod events;
pub mod feed;
pub mod metrics;
pub mod portfolio;
