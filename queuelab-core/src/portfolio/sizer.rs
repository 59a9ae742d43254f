//! Naive order sizer
//!
//! Turns a signal into a fixed-quantity market order. No risk management and
//! no pyramiding: a symbol is either flat or holds one position, and entry
//! signals are ignored while a position is open.

use crate::domain::{Direction, SignalType};
use crate::events::{OrderEvent, SignalEvent};

/// Fixed-quantity sizer: `floor(unit * strength)` units per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaiveSizer {
    unit: u64,
}

impl Default for NaiveSizer {
    fn default() -> Self {
        Self { unit: 100 }
    }
}

impl NaiveSizer {
    pub fn new(unit: u64) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> u64 {
        self.unit
    }

    /// Order for `signal` given the symbol's current signed position, if any.
    pub fn size(&self, signal: &SignalEvent, current_quantity: i64) -> Option<OrderEvent> {
        let entry_quantity = (self.unit as f64 * signal.strength).floor() as u64;
        let exit_quantity = current_quantity.unsigned_abs();

        let (quantity, direction) = match signal.signal_type {
            SignalType::Long if current_quantity == 0 => (entry_quantity, Direction::Buy),
            SignalType::Short if current_quantity == 0 => (entry_quantity, Direction::Sell),
            SignalType::Exit if current_quantity > 0 => (exit_quantity, Direction::Sell),
            SignalType::Exit if current_quantity < 0 => (exit_quantity, Direction::Buy),
            _ => return None,
        };

        if quantity == 0 {
            return None;
        }
        Some(OrderEvent::market(signal.symbol.clone(), quantity, direction))
    }
}
