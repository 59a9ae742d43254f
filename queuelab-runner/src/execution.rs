//! Simulated execution: turns Order events into Fill events.
//!
//! No slippage and no latency. A market order fills completely at the latest
//! close of its symbol, stamped with that bar's timestamp.

use queuelab_core::domain::{BarField, OrderType};
use queuelab_core::events::{EventError, EventQueue, FillEvent, OrderEvent};
use queuelab_core::feed::{BarFeed, FeedError};
use thiserror::Error;

use crate::config::CommissionConfig;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("invalid fill: {0}")]
    Fill(#[from] EventError),

    #[error("order type {0:?} is not supported by the simulator")]
    UnsupportedOrderType(OrderType),
}

/// Anything that can execute an order and report the fill.
pub trait ExecutionHandler {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        feed: &dyn BarFeed,
        events: &mut EventQueue,
    ) -> Result<(), ExecutionError>;
}

/// Fills every market order at the latest close.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecution {
    commission: CommissionConfig,
}

impl SimulatedExecution {
    pub fn new(commission: CommissionConfig) -> Self {
        Self { commission }
    }
}

impl ExecutionHandler for SimulatedExecution {
    fn execute_order(
        &mut self,
        order: &OrderEvent,
        feed: &dyn BarFeed,
        events: &mut EventQueue,
    ) -> Result<(), ExecutionError> {
        if order.order_type != OrderType::Market {
            return Err(ExecutionError::UnsupportedOrderType(order.order_type));
        }
        let price = feed.latest_bar_value(&order.symbol, BarField::Close)?;
        let timestamp = feed.latest_bar_datetime(&order.symbol)?;
        let commission = self.commission.commission(order.quantity, price);

        let fill = FillEvent::new(
            timestamp,
            order.symbol.clone(),
            order.quantity,
            order.direction,
            price,
            commission,
        )?;
        tracing::debug!(
            symbol = %fill.symbol,
            quantity = fill.quantity,
            price,
            commission,
            "order filled"
        );
        events.push(fill);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use queuelab_core::domain::{Bar, Direction, Interval, Window};
    use queuelab_core::events::Event;
    use queuelab_core::feed::HistoricBarFeed;

    fn feed() -> HistoricBarFeed {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let window = Window::new(ts, ts, Interval::Day1).unwrap();
        HistoricBarFeed::new(
            window,
            vec![("A".into(), vec![Bar::new(ts, 9.0, 11.0, 8.0, 10.0, 1.0)])],
        )
        .unwrap()
    }

    #[test]
    fn fills_at_latest_close_with_commission() {
        let mut feed = feed();
        let mut events = EventQueue::new();
        feed.advance(&mut events);
        events.pop();

        let mut exec = SimulatedExecution::new(CommissionConfig::PerShare { amount: 0.25 });
        let order = OrderEvent::market("A", 8, Direction::Sell);
        exec.execute_order(&order, &feed, &mut events).unwrap();

        let Some(Event::Fill(fill)) = events.pop() else {
            panic!("expected a fill");
        };
        assert_eq!(fill.fill_cost, 10.0);
        assert_eq!(fill.commission, 2.0);
        assert_eq!(fill.quantity, 8);
        assert_eq!(fill.direction, Direction::Sell);
        assert_eq!(fill.timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn limit_orders_are_rejected() {
        let mut feed = feed();
        let mut events = EventQueue::new();
        feed.advance(&mut events);

        let mut order = OrderEvent::market("A", 1, Direction::Buy);
        order.order_type = OrderType::Limit;
        let err = SimulatedExecution::default()
            .execute_order(&order, &feed, &mut events)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::UnsupportedOrderType(OrderType::Limit)));
    }

    #[test]
    fn order_before_first_bar_is_a_feed_error() {
        let feed = feed();
        let mut events = EventQueue::new();
        let order = OrderEvent::market("A", 1, Direction::Buy);
        let err = SimulatedExecution::default()
            .execute_order(&order, &feed, &mut events)
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Feed(FeedError::NoBars { .. })));
    }
}
