//! Multi-symbol time alignment.
//!
//! Given bars for multiple symbols, align them to a common timeline.
//! Missing bars are forward-filled from the symbol's previous observation.

use crate::domain::{Bar, Symbol};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Bar data for multiple symbols on a common timeline.
#[derive(Debug, Clone)]
pub struct AlignedData {
    /// The common timestamp axis (sorted ascending).
    pub timestamps: Vec<DateTime<Utc>>,
    /// Bars per symbol, in the same order as `symbols`.
    /// Each inner Vec has the same length as `timestamps`.
    pub bars: Vec<Vec<Bar>>,
    /// Forward-filled bar count per symbol, in the same order as `symbols`.
    pub filled: Vec<usize>,
    /// Symbols included.
    pub symbols: Vec<Symbol>,
}

impl AlignedData {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Align multiple symbols to a common timeline.
///
/// The axis is the union of every symbol's timestamps. For each timestamp,
/// each symbol either has a real bar or repeats its most recent earlier bar,
/// restamped to the axis timestamp. Timestamps earlier than some symbol's first
/// observation are dropped: there is nothing to carry forward yet.
///
/// Rows within a symbol may arrive unsorted; duplicates keep the last row.
pub fn align_forward_fill(symbol_bars: Vec<(Symbol, Vec<Bar>)>) -> AlignedData {
    let mut symbols = Vec::with_capacity(symbol_bars.len());
    let mut series: Vec<BTreeMap<DateTime<Utc>, Bar>> = Vec::with_capacity(symbol_bars.len());
    let mut all_timestamps = BTreeSet::new();

    for (symbol, bars) in symbol_bars {
        let mut by_time = BTreeMap::new();
        for bar in bars {
            all_timestamps.insert(bar.timestamp);
            by_time.insert(bar.timestamp, bar);
        }
        symbols.push(symbol);
        series.push(by_time);
    }

    // Every symbol needs one real observation before the axis can start.
    let first_common = series
        .iter()
        .map(|s| s.keys().next().copied())
        .collect::<Option<Vec<_>>>()
        .and_then(|firsts| firsts.into_iter().max());

    let timestamps: Vec<DateTime<Utc>> = match first_common {
        Some(start) => all_timestamps.range(start..).copied().collect(),
        None => Vec::new(),
    };

    let mut aligned = Vec::with_capacity(series.len());
    let mut filled = Vec::with_capacity(series.len());

    for by_time in &series {
        let mut out = Vec::with_capacity(timestamps.len());
        let mut fill_count = 0;
        for ts in &timestamps {
            match by_time.get(ts) {
                Some(bar) => out.push(*bar),
                None => {
                    // The first axis timestamp is some symbol's first bar, and
                    // every symbol has a bar at or before it, so this exists.
                    if let Some((_, prev)) = by_time.range(..*ts).next_back() {
                        out.push(prev.restamped(*ts));
                        fill_count += 1;
                    }
                }
            }
        }
        aligned.push(out);
        filled.push(fill_count);
    }

    AlignedData {
        timestamps,
        bars: aligned,
        filled,
        symbols,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar::new(ts(day), close - 1.0, close + 1.0, close - 2.0, close, 1000.0)
    }

    #[test]
    fn align_forward_fills_missing() {
        let input = vec![
            (
                "SPY".to_string(),
                vec![bar(2, 100.0), bar(3, 101.0), bar(4, 102.0)],
            ),
            (
                "QQQ".to_string(),
                vec![
                    bar(2, 200.0),
                    // QQQ missing 2024-01-03
                    bar(4, 202.0),
                ],
            ),
        ];

        let aligned = align_forward_fill(input);

        assert_eq!(aligned.len(), 3);
        assert_eq!(aligned.bars[0].len(), 3);
        assert_eq!(aligned.bars[1].len(), 3);

        // QQQ on 2024-01-03 repeats 2024-01-02, restamped
        assert_eq!(aligned.bars[1][1].close, 200.0);
        assert_eq!(aligned.bars[1][1].timestamp, ts(3));
        assert_eq!(aligned.filled, vec![0, 1]);
    }

    #[test]
    fn leading_gap_is_trimmed() {
        let input = vec![
            ("A".to_string(), vec![bar(1, 10.0), bar(2, 11.0), bar(3, 12.0)]),
            ("B".to_string(), vec![bar(2, 20.0), bar(3, 21.0)]),
        ];

        let aligned = align_forward_fill(input);
        assert_eq!(aligned.timestamps, vec![ts(2), ts(3)]);
        assert_eq!(aligned.bars[0][0].close, 11.0);
    }

    #[test]
    fn unsorted_rows_and_duplicates() {
        let input = vec![(
            "A".to_string(),
            vec![bar(3, 12.0), bar(1, 10.0), bar(3, 13.0)],
        )];

        let aligned = align_forward_fill(input);
        assert_eq!(aligned.timestamps, vec![ts(1), ts(3)]);
        assert_eq!(aligned.bars[0][1].close, 13.0);
    }

    #[test]
    fn symbol_without_rows_empties_axis() {
        let input = vec![
            ("A".to_string(), vec![bar(1, 10.0)]),
            ("B".to_string(), Vec::new()),
        ];
        let aligned = align_forward_fill(input);
        assert!(aligned.is_empty());
        assert!(aligned.bars.iter().all(|b| b.is_empty()));
    }
}
