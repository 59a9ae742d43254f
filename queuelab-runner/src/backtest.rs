//! The driving loop.
//!
//! One turn per bar: advance the feed, then drain the queue to empty,
//! dispatching each event before the next advance. Within a turn the portfolio
//! sees a Market event before the strategy does, so the holdings row for a bar
//! is recorded before any signal (and therefore any fill) from that bar.

use queuelab_core::events::{Event, EventCounts, EventQueue};
use queuelab_core::feed::BarFeed;
use queuelab_core::portfolio::{Portfolio, PortfolioError};
use thiserror::Error;

use crate::execution::{ExecutionError, ExecutionHandler};
use crate::strategy::{Strategy, StrategyError};

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("execution error: {0}")]
    Execution(#[from] ExecutionError),
}

/// Replay the feed to exhaustion.
///
/// Returns the number of events pushed per kind.
pub fn run_event_loop(
    feed: &mut dyn BarFeed,
    portfolio: &mut Portfolio,
    strategy: &mut dyn Strategy,
    execution: &mut dyn ExecutionHandler,
) -> Result<EventCounts, BacktestError> {
    let mut events = EventQueue::new();

    loop {
        feed.advance(&mut events);
        if !feed.continue_backtest() {
            break;
        }

        while let Some(event) = events.pop() {
            let feed: &dyn BarFeed = &*feed;
            match &event {
                Event::Market => {
                    portfolio.on_event(&event, feed, &mut events)?;
                    strategy.calculate_signals(&event, feed, &mut events)?;
                }
                Event::Signal(_) | Event::Fill(_) => {
                    portfolio.on_event(&event, feed, &mut events)?;
                }
                Event::Order(order) => {
                    execution.execute_order(order, feed, &mut events)?;
                }
            }
        }
    }

    Ok(events.counts())
}
