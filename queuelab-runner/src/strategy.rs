//! Strategies turn Market events into Signal events.
//!
//! A strategy reads prices only through the feed, so it sees exactly what the
//! portfolio sees at the same point in the loop.

use queuelab_core::domain::{SignalType, Symbol};
use queuelab_core::events::{Event, EventError, EventQueue, SignalEvent};
use queuelab_core::feed::{BarFeed, FeedError};
use std::collections::HashSet;
use thiserror::Error;

use crate::config::StrategyConfig;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("invalid signal: {0}")]
    Signal(#[from] EventError),
}

pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// React to one event; only Market events are expected to produce signals.
    fn calculate_signals(
        &mut self,
        event: &Event,
        feed: &dyn BarFeed,
        events: &mut EventQueue,
    ) -> Result<(), StrategyError>;
}

/// Build the configured strategy.
pub fn build_strategy(config: &StrategyConfig) -> Box<dyn Strategy> {
    match config {
        StrategyConfig::BuyAndHold { strength } => Box::new(BuyAndHold::new(*strength)),
    }
}

/// Emits one LONG per symbol, on the first bar that symbol has, then nothing.
#[derive(Debug, Clone)]
pub struct BuyAndHold {
    strength: f64,
    bought: HashSet<Symbol>,
}

impl BuyAndHold {
    pub fn new(strength: f64) -> Self {
        Self {
            strength,
            bought: HashSet::new(),
        }
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn calculate_signals(
        &mut self,
        event: &Event,
        feed: &dyn BarFeed,
        events: &mut EventQueue,
    ) -> Result<(), StrategyError> {
        if !matches!(event, Event::Market) {
            return Ok(());
        }
        for symbol in feed.symbols() {
            if self.bought.contains(symbol) {
                continue;
            }
            if feed.latest_bars(symbol, 1)?.is_empty() {
                continue;
            }
            events.push(SignalEvent::new(
                symbol.clone(),
                SignalType::Long,
                self.strength,
            )?);
            self.bought.insert(symbol.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use queuelab_core::domain::{Bar, Interval, Window};
    use queuelab_core::events::EventKind;
    use queuelab_core::feed::HistoricBarFeed;

    fn feed() -> HistoricBarFeed {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bars = |n: i64| {
            (0..n)
                .map(|i| Bar::new(t0 + Duration::days(i), 1.0, 1.0, 1.0, 1.0, 1.0))
                .collect::<Vec<_>>()
        };
        let window = Window::new(t0, t0 + Duration::days(10), Interval::Day1).unwrap();
        HistoricBarFeed::new(window, vec![("A".into(), bars(3)), ("B".into(), bars(3))]).unwrap()
    }

    #[test]
    fn signals_once_per_symbol() {
        let mut feed = feed();
        let mut events = EventQueue::new();
        let mut strategy = BuyAndHold::new(0.5);

        for _ in 0..3 {
            feed.advance(&mut events);
            while let Some(event) = events.pop() {
                strategy.calculate_signals(&event, &feed, &mut events).unwrap();
            }
        }
        assert_eq!(events.counts().signal, 2);
        assert_eq!(events.counts().market, 3);
    }

    #[test]
    fn ignores_non_market_events() {
        let mut feed = feed();
        let mut events = EventQueue::new();
        feed.advance(&mut events);
        events.pop();

        let mut strategy = BuyAndHold::new(1.0);
        let signal = SignalEvent::new("A", SignalType::Exit, 1.0).unwrap();
        strategy
            .calculate_signals(&signal.into(), &feed, &mut events)
            .unwrap();
        assert!(events.is_empty());

        strategy
            .calculate_signals(&Event::Market, &feed, &mut events)
            .unwrap();
        let kinds: Vec<EventKind> = std::iter::from_fn(|| events.pop()).map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![EventKind::Signal, EventKind::Signal]);
    }

    #[test]
    fn configured_strength_is_validated() {
        let mut feed = feed();
        let mut events = EventQueue::new();
        feed.advance(&mut events);

        let mut strategy = build_strategy(&StrategyConfig::BuyAndHold { strength: 2.0 });
        assert_eq!(strategy.name(), "buy_and_hold");
        assert!(matches!(
            strategy.calculate_signals(&Event::Market, &feed, &mut events),
            Err(StrategyError::Signal(EventError::InvalidStrength(_)))
        ));
    }
}
