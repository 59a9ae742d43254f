//! Bar: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a single timestamp.
///
/// Bars carry no symbol: the feed keys them by symbol, and a forward-filled
/// bar is the previous observation restamped onto the merged index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Selects one OHLCV column of a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Project a single field.
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume,
        }
    }

    /// Copy of this bar moved onto another timestamp (forward fill).
    pub fn restamped(&self, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, ..*self }
    }

    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_bar() -> Bar {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            100.0,
            105.0,
            98.0,
            103.0,
            50_000.0,
        )
    }

    #[test]
    fn field_selects_column() {
        let bar = sample_bar();
        assert_eq!(bar.field(BarField::Open), 100.0);
        assert_eq!(bar.field(BarField::High), 105.0);
        assert_eq!(bar.field(BarField::Low), 98.0);
        assert_eq!(bar.field(BarField::Close), 103.0);
        assert_eq!(bar.field(BarField::Volume), 50_000.0);
    }

    #[test]
    fn restamp_keeps_prices() {
        let bar = sample_bar();
        let later = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let filled = bar.restamped(later);
        assert_eq!(filled.timestamp, later);
        assert_eq!(filled.close, bar.close);
        assert_eq!(filled.volume, bar.volume);
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_field_serializes_lowercase() {
        let json = serde_json::to_string(&BarField::Close).unwrap();
        assert_eq!(json, "\"close\"");
    }
}
