//! Domain types for QueueLab

pub mod bar;
pub mod order;
pub mod symbol_map;
pub mod window;

pub use bar::{Bar, BarField};
pub use order::{Direction, OrderType, SignalType};
pub use symbol_map::SymbolMap;
pub use window::{Interval, Window, WindowError};

/// Symbol type alias
pub type Symbol = String;
