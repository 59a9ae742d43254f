//! FIFO event channel.

use super::{Event, EventKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of events pushed per kind over the queue's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub market: usize,
    pub signal: usize,
    pub order: usize,
    pub fill: usize,
}

impl EventCounts {
    fn record(&mut self, kind: EventKind) {
        match kind {
            EventKind::Market => self.market += 1,
            EventKind::Signal => self.signal += 1,
            EventKind::Order => self.order += 1,
            EventKind::Fill => self.fill += 1,
        }
    }
}

/// Single-consumer FIFO of [`Event`]s.
///
/// Producers push, the driving loop pops. Popping is destructive: every event
/// is delivered exactly once, in the order it was pushed.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
    counts: EventCounts,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: impl Into<Event>) {
        let event = event.into();
        self.counts.record(event.kind());
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Totals pushed so far, including events already popped.
    pub fn counts(&self) -> EventCounts {
        self.counts
    }
}
