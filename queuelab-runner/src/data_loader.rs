//! Bar loading for the runner.
//!
//! Two sources, selected by [`DataSourceConfig`]:
//! - CSV: one `<dir>/<SYMBOL>.csv` per symbol with header
//!   `timestamp,open,high,low,close,volume`. Timestamps are RFC 3339 strings or
//!   Unix epoch milliseconds.
//! - Synthetic: a seeded random walk with one bar per interval step. Same seed,
//!   same symbol, same window → same bars.
//!
//! Rows are returned raw; window clipping and alignment are the feed's job.

use chrono::{DateTime, Utc};
use queuelab_core::domain::{Bar, Symbol, Window};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{BacktestConfig, DataSourceConfig};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no bar file for '{symbol}' at {path}")]
    MissingFile { symbol: Symbol, path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} row {row}: unparseable timestamp '{value}'")]
    BadTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("synthetic start price must be positive and finite, got {0}")]
    InvalidStartPrice(f64),
}

/// Raw rows per symbol, plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// Rows per symbol, in config symbol order.
    pub series: Vec<(Symbol, Vec<Bar>)>,
    /// BLAKE3 over every row, for fingerprinting.
    pub dataset_hash: String,
    /// Rows dropped per symbol because a field was NaN.
    pub void_rows: BTreeMap<Symbol, usize>,
    pub synthetic: bool,
}

/// Load bars for every configured symbol.
pub fn load_bars(config: &BacktestConfig) -> Result<LoadedData, LoadError> {
    let (series, synthetic) = match &config.data {
        DataSourceConfig::Csv { dir } => (load_csv_dir(dir, &config.symbols)?, false),
        DataSourceConfig::Synthetic { seed, start_price } => {
            if !(start_price.is_finite() && *start_price > 0.0) {
                return Err(LoadError::InvalidStartPrice(*start_price));
            }
            let series = config
                .symbols
                .iter()
                .map(|symbol| {
                    let bars = generate_synthetic_bars(symbol, &config.window, *seed, *start_price);
                    (symbol.clone(), bars)
                })
                .collect();
            (series, true)
        }
    };

    let mut void_rows = BTreeMap::new();
    let series: Vec<(Symbol, Vec<Bar>)> = series
        .into_iter()
        .map(|(symbol, bars)| {
            let before = bars.len();
            let bars: Vec<Bar> = bars.into_iter().filter(|bar| !bar.is_void()).collect();
            let dropped = before - bars.len();
            if dropped > 0 {
                tracing::warn!(symbol = %symbol, dropped, "dropped bars with NaN fields");
            }
            let insane = bars.iter().filter(|bar| !bar.is_sane()).count();
            if insane > 0 {
                tracing::warn!(symbol = %symbol, insane, "bars failing OHLC sanity check");
            }
            void_rows.insert(symbol.clone(), dropped);
            (symbol, bars)
        })
        .collect();

    let dataset_hash = compute_dataset_hash(&series);
    tracing::debug!(symbols = series.len(), synthetic, %dataset_hash, "bars loaded");

    Ok(LoadedData {
        series,
        dataset_hash,
        void_rows,
        synthetic,
    })
}

/// Read `<dir>/<SYMBOL>.csv` for each symbol.
pub fn load_csv_dir(dir: &Path, symbols: &[Symbol]) -> Result<Vec<(Symbol, Vec<Bar>)>, LoadError> {
    symbols
        .iter()
        .map(|symbol| {
            let path = dir.join(format!("{symbol}.csv"));
            if !path.is_file() {
                return Err(LoadError::MissingFile {
                    symbol: symbol.clone(),
                    path,
                });
            }
            Ok((symbol.clone(), read_bars_csv(&path)?))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse one bar CSV file.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row.map_err(csv_error)?;
        let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| LoadError::BadTimestamp {
            path: path.to_path_buf(),
            // 1-based, after the header line
            row: i + 2,
            value: row.timestamp.clone(),
        })?;
        bars.push(Bar::new(
            timestamp, row.open, row.high, row.low, row.close, row.volume,
        ));
    }
    Ok(bars)
}

/// RFC 3339, or integer Unix epoch milliseconds.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// Generate a random-walk series over the window.
///
/// The RNG is seeded from `seed` and the symbol name, so symbols in one run
/// get different but reproducible paths.
pub fn generate_synthetic_bars(
    symbol: &str,
    window: &Window,
    seed: u64,
    start_price: f64,
) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let step = window.interval.duration();
    let mut bars = Vec::new();
    let mut price = start_price;
    let mut current = window.start;

    while current <= window.end {
        let period_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + period_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume = rng.gen_range(100.0..10_000.0);

        bars.push(Bar::new(current, open, high, low, close, volume));
        price = close;
        current += step;
    }

    bars
}

/// Deterministic BLAKE3 hash over all rows in symbol order.
fn compute_dataset_hash(series: &[(Symbol, Vec<Bar>)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, bars) in series {
        hasher.update(symbol.as_bytes());
        for bar in bars {
            hasher.update(&bar.timestamp.timestamp_millis().to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
