//! Portfolio: positions and holdings, driven by events.
//!
//! The portfolio keeps a "current" snapshot that fills mutate in place, plus
//! two append-only histories that gain one row per Market event.
//!
//! Ordering per bar is fixed: a Market event first marks the *previous*
//! positions at the *new* bar's close and records that row; fills generated
//! from this bar are applied to the current snapshot afterwards and only show
//! up in the next Market row. Do not apply fills before marking to market.

pub mod holdings;
pub mod sizer;

pub use holdings::{Holdings, HoldingsRecord, PositionsRecord};
pub use sizer::NaiveSizer;

use crate::domain::{BarField, Symbol, SymbolMap};
use crate::events::{Event, EventQueue, FillEvent, SignalEvent};
use crate::feed::{BarFeed, FeedError};
use crate::metrics::{EquityCurve, SummaryStats};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PortfolioError {
    #[error("symbol not tracked by the portfolio: {symbol}")]
    UnknownSymbol { symbol: Symbol },

    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("insufficient history: no market event has been processed")]
    InsufficientHistory,

    #[error("bar at {timestamp} does not follow the previous row at {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    #[error("a portfolio needs at least one symbol")]
    NoSymbols,

    #[error("symbol listed more than once: {symbol}")]
    DuplicateSymbol { symbol: Symbol },

    #[error("fill of {quantity} would overflow the position in {symbol}")]
    PositionOverflow { symbol: Symbol, quantity: u64 },
}

/// Event-driven portfolio accounting.
#[derive(Debug, Clone)]
pub struct Portfolio {
    symbols: Arc<[Symbol]>,
    start: DateTime<Utc>,
    initial_capital: f64,
    sizer: NaiveSizer,
    current_positions: SymbolMap<i64>,
    current_holdings: Holdings,
    all_positions: Vec<PositionsRecord>,
    all_holdings: Vec<HoldingsRecord>,
    equity_curve: Option<EquityCurve>,
}

impl Portfolio {
    /// A flat portfolio holding `initial_capital` in cash as of `start`.
    pub fn new(
        symbols: &[Symbol],
        start: DateTime<Utc>,
        initial_capital: f64,
    ) -> Result<Self, PortfolioError> {
        if symbols.is_empty() {
            return Err(PortfolioError::NoSymbols);
        }
        let mut seen = HashSet::new();
        for symbol in symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(PortfolioError::DuplicateSymbol {
                    symbol: symbol.clone(),
                });
            }
        }

        let symbols: Arc<[Symbol]> = symbols.to_vec().into();
        let positions = SymbolMap::filled(symbols.clone(), 0i64);
        let holdings = Holdings::new(symbols.clone(), initial_capital);

        Ok(Self {
            all_positions: vec![PositionsRecord {
                timestamp: start,
                positions: positions.clone(),
            }],
            all_holdings: vec![HoldingsRecord {
                timestamp: start,
                holdings: holdings.clone(),
            }],
            symbols,
            start,
            initial_capital,
            sizer: NaiveSizer::default(),
            current_positions: positions,
            current_holdings: holdings,
            equity_curve: None,
        })
    }

    /// A portfolio over the feed's symbols, starting at the feed window's start.
    pub fn from_feed(feed: &dyn BarFeed, initial_capital: f64) -> Result<Self, PortfolioError> {
        Self::new(feed.symbols(), feed.window().start, initial_capital)
    }

    pub fn with_sizer(mut self, sizer: NaiveSizer) -> Self {
        self.sizer = sizer;
        self
    }

    /// Dispatch one event.
    pub fn on_event(
        &mut self,
        event: &Event,
        feed: &dyn BarFeed,
        events: &mut EventQueue,
    ) -> Result<(), PortfolioError> {
        match event {
            Event::Market => self.update_timeindex(feed),
            Event::Signal(signal) => self.update_signal(signal, events),
            // Orders belong to the execution handler.
            Event::Order(_) => Ok(()),
            Event::Fill(fill) => self.update_fill(fill),
        }
    }

    /// Append one positions row and one marked-to-market holdings row.
    pub fn update_timeindex(&mut self, feed: &dyn BarFeed) -> Result<(), PortfolioError> {
        let timestamp = feed.latest_bar_datetime(&self.symbols[0])?;

        let previous = self
            .all_holdings
            .last()
            .map(|row| row.timestamp)
            .unwrap_or(self.start);
        let in_order = if self.market_rows() == 0 {
            timestamp >= previous
        } else {
            timestamp > previous
        };
        if !in_order {
            return Err(PortfolioError::OutOfOrder {
                previous,
                timestamp,
            });
        }

        let positions = &self.current_positions;
        let market_values = SymbolMap::try_from_fn(self.symbols.clone(), |symbol| {
            let quantity = positions.get(symbol).copied().unwrap_or(0);
            let close = feed.latest_bar_value(symbol, BarField::Close)?;
            Ok::<f64, FeedError>(quantity as f64 * close)
        })?;

        self.all_positions.push(PositionsRecord {
            timestamp,
            positions: self.current_positions.clone(),
        });
        self.all_holdings.push(HoldingsRecord {
            timestamp,
            holdings: Holdings::from_parts(
                market_values,
                self.current_holdings.cash(),
                self.current_holdings.commission(),
            ),
        });
        Ok(())
    }

    /// Size a signal and enqueue the resulting order, if any.
    pub fn update_signal(
        &mut self,
        signal: &SignalEvent,
        events: &mut EventQueue,
    ) -> Result<(), PortfolioError> {
        let current = self.position(&signal.symbol)?;
        if let Some(order) = self.sizer.size(signal, current) {
            tracing::debug!(
                symbol = %order.symbol,
                quantity = order.quantity,
                direction = ?order.direction,
                "order generated"
            );
            events.push(order);
        }
        Ok(())
    }

    /// Apply a fill to current positions and holdings.
    pub fn update_fill(&mut self, fill: &FillEvent) -> Result<(), PortfolioError> {
        let Some(&position) = self.current_positions.get(&fill.symbol) else {
            return Err(self.unknown_symbol(&fill.symbol));
        };
        let next = i64::try_from(fill.quantity)
            .ok()
            .and_then(|quantity| quantity.checked_mul(fill.direction.sign()))
            .and_then(|delta| position.checked_add(delta))
            .ok_or_else(|| PortfolioError::PositionOverflow {
                symbol: fill.symbol.clone(),
                quantity: fill.quantity,
            })?;

        // validate before mutating either side
        self.current_holdings
            .apply_cost(&fill.symbol, fill.signed_cost(), fill.commission)
            .ok_or_else(|| self.unknown_symbol(&fill.symbol))?;
        if let Some(slot) = self.current_positions.get_mut(&fill.symbol) {
            *slot = next;
        }

        tracing::debug!(
            symbol = %fill.symbol,
            quantity = fill.quantity,
            direction = ?fill.direction,
            fill_cost = fill.fill_cost,
            commission = fill.commission,
            "fill applied"
        );
        Ok(())
    }

    /// Build the equity curve from the holdings history.
    ///
    /// Can be called repeatedly; each call rebuilds from the same rows.
    pub fn finalize(&mut self) -> Result<&EquityCurve, PortfolioError> {
        if self.market_rows() == 0 {
            return Err(PortfolioError::InsufficientHistory);
        }
        let curve = EquityCurve::from_totals(
            self.all_holdings
                .iter()
                .map(|row| (row.timestamp, row.holdings.total())),
        );
        Ok(&*self.equity_curve.insert(curve))
    }

    /// Headline statistics of the finalized equity curve.
    pub fn summary_stats(&self, periods_per_year: f64) -> Result<SummaryStats, PortfolioError> {
        self.equity_curve
            .as_ref()
            .map(|curve| curve.summary(periods_per_year))
            .ok_or(PortfolioError::InsufficientHistory)
    }

    /// Current signed quantity held in `symbol`.
    pub fn position(&self, symbol: &str) -> Result<i64, PortfolioError> {
        self.current_positions
            .get(symbol)
            .copied()
            .ok_or_else(|| self.unknown_symbol(symbol))
    }

    fn unknown_symbol(&self, symbol: &str) -> PortfolioError {
        tracing::warn!(symbol, "symbol not tracked by the portfolio");
        PortfolioError::UnknownSymbol {
            symbol: symbol.to_string(),
        }
    }

    /// Number of Market events processed so far.
    pub fn market_rows(&self) -> usize {
        self.all_holdings.len() - 1
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn current_positions(&self) -> &SymbolMap<i64> {
        &self.current_positions
    }

    pub fn current_holdings(&self) -> &Holdings {
        &self.current_holdings
    }

    pub fn all_positions(&self) -> &[PositionsRecord] {
        &self.all_positions
    }

    pub fn all_holdings(&self) -> &[HoldingsRecord] {
        &self.all_holdings
    }

    /// The equity curve, once [`Portfolio::finalize`] has run.
    pub fn equity_curve(&self) -> Option<&EquityCurve> {
        self.equity_curve.as_ref()
    }
}
