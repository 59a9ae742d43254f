//! Bar feed: hands out the "current" bar per instrument, one step at a time.
//!
//! The [`BarFeed`] trait is what the portfolio and strategies read prices
//! through. It only exposes bars that have already been released by
//! [`BarFeed::advance`], so nothing downstream can see the future.

pub mod align;
pub mod historic;

pub use align::{align_forward_fill, AlignedData};
pub use historic::HistoricBarFeed;

use crate::domain::{Bar, BarField, Symbol, Window};
use crate::events::EventQueue;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("symbol not available in the historical data set: {symbol}")]
    UnknownSymbol { symbol: Symbol },

    #[error("no bars released yet for {symbol}")]
    NoBars { symbol: Symbol },

    #[error("no bars for {symbol} inside the requested window")]
    NoData { symbol: Symbol },

    #[error("symbol listed more than once: {symbol}")]
    DuplicateSymbol { symbol: Symbol },

    #[error("a feed needs at least one symbol")]
    Empty,
}

/// Source of the latest market data for a fixed set of symbols.
pub trait BarFeed {
    /// The tracked symbols, fixed at construction.
    fn symbols(&self) -> &[Symbol];

    /// The window the feed was built for.
    fn window(&self) -> &Window;

    /// Release the next bar for every symbol and enqueue one `Market` event.
    ///
    /// When any symbol has no bar left, the continuation flag turns false and
    /// nothing is released or enqueued, now or on later calls.
    fn advance(&mut self, events: &mut EventQueue);

    /// False once the data is exhausted.
    fn continue_backtest(&self) -> bool;

    /// The most recently released bars for `symbol`, oldest first; at most `n`.
    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], FeedError>;

    /// The most recently released bar for `symbol`.
    fn latest_bar(&self, symbol: &str) -> Result<&Bar, FeedError> {
        self.latest_bars(symbol, 1)?
            .last()
            .ok_or_else(|| FeedError::NoBars {
                symbol: symbol.to_string(),
            })
    }

    fn latest_bar_datetime(&self, symbol: &str) -> Result<DateTime<Utc>, FeedError> {
        Ok(self.latest_bar(symbol)?.timestamp)
    }

    fn latest_bar_value(&self, symbol: &str, field: BarField) -> Result<f64, FeedError> {
        Ok(self.latest_bar(symbol)?.field(field))
    }

    fn latest_bars_values(
        &self,
        symbol: &str,
        field: BarField,
        n: usize,
    ) -> Result<Vec<f64>, FeedError> {
        Ok(self
            .latest_bars(symbol, n)?
            .iter()
            .map(|bar| bar.field(field))
            .collect())
    }
}
