//! Event taxonomy and the FIFO queue that connects producers to the driving loop.
//!
//! Four kinds of event flow through a run:
//! - `Market`: the feed advanced; every tracked symbol has a new bar
//! - `Signal`: a strategy's intent for one symbol
//! - `Order`: the portfolio's sized request to the execution handler
//! - `Fill`: the execution handler's report of an executed order
//!
//! Consumers match on [`Event`] exhaustively, so a new kind forces every
//! dispatcher to handle it.

pub mod queue;

pub use queue::{EventCounts, EventQueue};

use crate::domain::{Direction, OrderType, SignalType, Symbol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EventError {
    #[error("signal strength must be in (0, 1], got {0}")]
    InvalidStrength(f64),

    #[error("fill price must be finite and non-negative, got {0}")]
    InvalidFillCost(f64),

    #[error("commission must be finite and non-negative, got {0}")]
    InvalidCommission(f64),
}

/// A strategy's intent for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: Symbol,
    pub signal_type: SignalType,
    /// Sizing hint in (0, 1].
    pub strength: f64,
}

impl SignalEvent {
    pub fn new(
        symbol: impl Into<Symbol>,
        signal_type: SignalType,
        strength: f64,
    ) -> Result<Self, EventError> {
        if !(strength > 0.0 && strength <= 1.0) {
            return Err(EventError::InvalidStrength(strength));
        }
        Ok(Self {
            symbol: symbol.into(),
            signal_type,
            strength,
        })
    }
}

/// A sized order for the execution handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub symbol: Symbol,
    pub order_type: OrderType,
    pub quantity: u64,
    pub direction: Direction,
}

impl OrderEvent {
    pub fn market(symbol: impl Into<Symbol>, quantity: u64, direction: Direction) -> Self {
        Self {
            symbol: symbol.into(),
            order_type: OrderType::Market,
            quantity,
            direction,
        }
    }
}

/// An executed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: Symbol,
    pub quantity: u64,
    pub direction: Direction,
    /// Per-unit execution price.
    pub fill_cost: f64,
    pub commission: f64,
}

impl FillEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<Symbol>,
        quantity: u64,
        direction: Direction,
        fill_cost: f64,
        commission: f64,
    ) -> Result<Self, EventError> {
        if !fill_cost.is_finite() || fill_cost < 0.0 {
            return Err(EventError::InvalidFillCost(fill_cost));
        }
        if !commission.is_finite() || commission < 0.0 {
            return Err(EventError::InvalidCommission(commission));
        }
        Ok(Self {
            timestamp,
            symbol: symbol.into(),
            quantity,
            direction,
            fill_cost,
            commission,
        })
    }

    /// Signed cash value of the fill, excluding commission.
    pub fn signed_cost(&self) -> f64 {
        self.direction.sign() as f64 * self.fill_cost * self.quantity as f64
    }
}

/// Everything that can travel through the [`EventQueue`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Market,
    Signal(SignalEvent),
    Order(OrderEvent),
    Fill(FillEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Market => EventKind::Market,
            Self::Signal(_) => EventKind::Signal,
            Self::Order(_) => EventKind::Order,
            Self::Fill(_) => EventKind::Fill,
        }
    }
}

impl From<SignalEvent> for Event {
    fn from(signal: SignalEvent) -> Self {
        Self::Signal(signal)
    }
}

impl From<OrderEvent> for Event {
    fn from(order: OrderEvent) -> Self {
        Self::Order(order)
    }
}

impl From<FillEvent> for Event {
    fn from(fill: FillEvent) -> Self {
        Self::Fill(fill)
    }
}

/// Payload-free discriminant of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Market,
    Signal,
    Order,
    Fill,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn signal_strength_bounds() {
        assert!(SignalEvent::new("BTCUSDT", SignalType::Long, 1.0).is_ok());
        assert!(SignalEvent::new("BTCUSDT", SignalType::Long, 0.01).is_ok());
        assert_eq!(
            SignalEvent::new("BTCUSDT", SignalType::Long, 0.0),
            Err(EventError::InvalidStrength(0.0))
        );
        assert!(SignalEvent::new("BTCUSDT", SignalType::Long, 1.5).is_err());
        assert!(SignalEvent::new("BTCUSDT", SignalType::Long, f64::NAN).is_err());
    }

    #[test]
    fn fill_rejects_negative_commission() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let result = FillEvent::new(ts, "BTCUSDT", 1, Direction::Buy, 100.0, -1.0);
        assert_eq!(result, Err(EventError::InvalidCommission(-1.0)));
    }

    #[test]
    fn signed_cost_follows_direction() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let buy = FillEvent::new(ts, "BTCUSDT", 10, Direction::Buy, 100.0, 1.0).unwrap();
        let sell = FillEvent::new(ts, "BTCUSDT", 10, Direction::Sell, 100.0, 1.0).unwrap();
        assert_eq!(buy.signed_cost(), 1000.0);
        assert_eq!(sell.signed_cost(), -1000.0);
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = Event::from(OrderEvent::market("ETHUSDT", 5, Direction::Sell));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ORDER");
        assert_eq!(json["order_type"], "MKT");
        assert_eq!(json["direction"], "SELL");
        assert_eq!(Event::Market.kind(), EventKind::Market);
    }
}
