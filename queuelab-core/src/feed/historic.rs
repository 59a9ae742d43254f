//! Feed over a closed, pre-aligned historical dataset.

use super::align::{align_forward_fill, AlignedData};
use super::{BarFeed, FeedError};
use crate::domain::{Bar, Symbol, Window};
use crate::events::{Event, EventQueue};
use std::collections::HashSet;

/// Replays aligned, forward-filled bars through an explicit cursor.
///
/// Bars up to the cursor are "released": they form each symbol's latest
/// history. `advance` moves the cursor by one.
#[derive(Debug, Clone)]
pub struct HistoricBarFeed {
    window: Window,
    data: AlignedData,
    cursor: usize,
    continue_backtest: bool,
}

impl HistoricBarFeed {
    /// Build a feed from raw rows per symbol.
    ///
    /// Rows outside the window are discarded, then the remaining rows are
    /// aligned onto the union of timestamps and forward-filled.
    pub fn new(window: Window, series: Vec<(Symbol, Vec<Bar>)>) -> Result<Self, FeedError> {
        if series.is_empty() {
            return Err(FeedError::Empty);
        }

        let mut seen = HashSet::new();
        let mut clipped = Vec::with_capacity(series.len());
        for (symbol, bars) in series {
            if !seen.insert(symbol.clone()) {
                return Err(FeedError::DuplicateSymbol { symbol });
            }
            let in_window: Vec<Bar> = bars
                .into_iter()
                .filter(|bar| window.contains(bar.timestamp))
                .collect();
            if in_window.is_empty() {
                return Err(FeedError::NoData { symbol });
            }
            clipped.push((symbol, in_window));
        }

        let data = align_forward_fill(clipped);
        for (symbol, filled) in data.symbols.iter().zip(&data.filled) {
            if *filled > 0 {
                tracing::debug!(symbol = %symbol, filled, "forward-filled missing bars");
            }
        }

        Ok(Self {
            window,
            data,
            cursor: 0,
            continue_backtest: true,
        })
    }

    /// Number of steps on the merged timeline.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// How many steps have been released so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bars of `symbol` synthesized by forward fill.
    pub fn forward_filled(&self, symbol: &str) -> Result<usize, FeedError> {
        let idx = self.index_of(symbol)?;
        Ok(self.data.filled[idx])
    }

    /// Rewind to before the first bar so the same data can be replayed.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.continue_backtest = true;
    }

    fn index_of(&self, symbol: &str) -> Result<usize, FeedError> {
        self.data
            .symbols
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| {
                tracing::warn!(symbol, "symbol not available in the historical data set");
                FeedError::UnknownSymbol {
                    symbol: symbol.to_string(),
                }
            })
    }
}

impl BarFeed for HistoricBarFeed {
    fn symbols(&self) -> &[Symbol] {
        &self.data.symbols
    }

    fn window(&self) -> &Window {
        &self.window
    }

    fn advance(&mut self, events: &mut EventQueue) {
        if !self.continue_backtest {
            return;
        }
        if self.cursor >= self.data.len() {
            tracing::info!(bars = self.cursor, "end of data");
            self.continue_backtest = false;
            return;
        }
        self.cursor += 1;
        events.push(Event::Market);
    }

    fn continue_backtest(&self) -> bool {
        self.continue_backtest
    }

    fn latest_bars(&self, symbol: &str, n: usize) -> Result<&[Bar], FeedError> {
        let idx = self.index_of(symbol)?;
        let released = &self.data.bars[idx][..self.cursor];
        Ok(&released[released.len().saturating_sub(n)..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BarField, Interval};
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar::new(ts(day), close, close + 1.0, close - 1.0, close, 10.0)
    }

    fn window() -> Window {
        Window::new(ts(1), ts(31), Interval::Day1).unwrap()
    }

    fn two_symbol_feed() -> HistoricBarFeed {
        HistoricBarFeed::new(
            window(),
            vec![
                ("A".into(), vec![bar(1, 10.0), bar(3, 12.0)]),
                ("B".into(), vec![bar(1, 20.0), bar(2, 21.0), bar(3, 22.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn advance_releases_one_step_and_one_market_event() {
        let mut feed = two_symbol_feed();
        let mut events = EventQueue::new();

        feed.advance(&mut events);
        assert_eq!(events.len(), 1);
        assert_eq!(events.pop(), Some(Event::Market));
        assert_eq!(feed.latest_bar("A").unwrap().close, 10.0);
        assert_eq!(feed.latest_bar_datetime("B").unwrap(), ts(1));
    }

    #[test]
    fn forward_fill_is_visible_through_accessors() {
        let mut feed = two_symbol_feed();
        let mut events = EventQueue::new();
        feed.advance(&mut events);
        feed.advance(&mut events);

        assert_eq!(feed.latest_bar_value("A", BarField::Close).unwrap(), 10.0);
        assert_eq!(feed.latest_bar_datetime("A").unwrap(), ts(2));
        assert_eq!(feed.forward_filled("A").unwrap(), 1);
        assert_eq!(feed.forward_filled("B").unwrap(), 0);
    }

    #[test]
    fn latest_bars_returns_what_is_available() {
        let mut feed = two_symbol_feed();
        let mut events = EventQueue::new();
        assert!(feed.latest_bars("B", 5).unwrap().is_empty());

        feed.advance(&mut events);
        feed.advance(&mut events);
        let bars = feed.latest_bars("B", 5).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 21.0);

        let closes = feed.latest_bars_values("B", BarField::Close, 1).unwrap();
        assert_eq!(closes, vec![21.0]);
    }

    #[test]
    fn latest_bar_before_advance_is_no_bars() {
        let feed = two_symbol_feed();
        assert_eq!(
            feed.latest_bar("A"),
            Err(FeedError::NoBars { symbol: "A".into() })
        );
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let feed = two_symbol_feed();
        assert_eq!(
            feed.latest_bars("ZZZ", 1),
            Err(FeedError::UnknownSymbol {
                symbol: "ZZZ".into()
            })
        );
        assert!(feed.latest_bar_value("ZZZ", BarField::Close).is_err());
        assert!(feed.forward_filled("ZZZ").is_err());
    }

    #[test]
    fn end_of_data_stops_market_events() {
        let mut feed = two_symbol_feed();
        let mut events = EventQueue::new();
        for _ in 0..3 {
            feed.advance(&mut events);
            assert!(feed.continue_backtest());
        }
        assert_eq!(events.len(), 3);

        feed.advance(&mut events);
        assert!(!feed.continue_backtest());
        feed.advance(&mut events);
        assert!(!feed.continue_backtest());
        assert_eq!(events.len(), 3);
        assert_eq!(feed.latest_bar("A").unwrap().timestamp, ts(3));
    }

    #[test]
    fn reset_replays_from_start() {
        let mut feed = two_symbol_feed();
        let mut events = EventQueue::new();
        for _ in 0..4 {
            feed.advance(&mut events);
        }
        assert!(!feed.continue_backtest());

        feed.reset();
        assert!(feed.continue_backtest());
        assert_eq!(feed.position(), 0);
        feed.advance(&mut events);
        assert_eq!(feed.latest_bar("B").unwrap().close, 20.0);
    }

    #[test]
    fn rows_outside_window_are_dropped() {
        let narrow = Window::new(ts(2), ts(3), Interval::Day1).unwrap();
        let feed = HistoricBarFeed::new(
            narrow,
            vec![("B".into(), vec![bar(1, 20.0), bar(2, 21.0), bar(3, 22.0), bar(4, 23.0)])],
        )
        .unwrap();
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            HistoricBarFeed::new(window(), Vec::new()).unwrap_err(),
            FeedError::Empty
        );
        assert_eq!(
            HistoricBarFeed::new(
                window(),
                vec![("A".into(), vec![bar(1, 1.0)]), ("A".into(), vec![bar(2, 1.0)])],
            )
            .unwrap_err(),
            FeedError::DuplicateSymbol { symbol: "A".into() }
        );
        assert_eq!(
            HistoricBarFeed::new(
                Window::new(ts(10), ts(11), Interval::Day1).unwrap(),
                vec![("A".into(), vec![bar(1, 1.0)])],
            )
            .unwrap_err(),
            FeedError::NoData { symbol: "A".into() }
        );
    }
}
