//! Per-symbol container with keys fixed at construction.

use super::Symbol;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// A value per tracked symbol.
///
/// The key set is shared (`Arc`) between every map built for the same
/// universe and cannot grow after construction. Iteration follows the
/// symbol-list order, so sums over a map are deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMap<T> {
    symbols: Arc<[Symbol]>,
    values: Vec<T>,
}

impl<T: Clone> SymbolMap<T> {
    /// Every symbol mapped to `value`.
    pub fn filled(symbols: Arc<[Symbol]>, value: T) -> Self {
        let values = vec![value; symbols.len()];
        Self { symbols, values }
    }
}

impl<T> SymbolMap<T> {
    /// Build from a per-symbol function, in symbol order.
    pub fn from_fn(symbols: Arc<[Symbol]>, mut f: impl FnMut(&str) -> T) -> Self {
        let values = symbols.iter().map(|s| f(s.as_str())).collect();
        Self { symbols, values }
    }

    /// Fallible variant of [`SymbolMap::from_fn`].
    pub fn try_from_fn<E>(
        symbols: Arc<[Symbol]>,
        mut f: impl FnMut(&str) -> Result<T, E>,
    ) -> Result<Self, E> {
        let values = symbols.iter().map(|s| f(s.as_str())).collect::<Result<_, _>>()?;
        Ok(Self { symbols, values })
    }

    fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&T> {
        self.index_of(symbol).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut T> {
        self.index_of(symbol).map(move |i| &mut self.values[i])
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.index_of(symbol).is_some()
    }

    pub fn symbols(&self) -> &Arc<[Symbol]> {
        &self.symbols
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Serialize> Serialize for SymbolMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (symbol, value) in self.iter() {
            map.serialize_entry(symbol, value)?;
        }
        map.end()
    }
}
