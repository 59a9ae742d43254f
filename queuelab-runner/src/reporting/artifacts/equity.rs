//! Equity curve export (CSV/Parquet).
//!
//! Non-finite values (the first row's return, anything derived from a zero
//! total) are written as empty CSV fields and parquet nulls.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, Series};
use queuelab_core::metrics::{EquityCurve, EquityPoint};
use std::fs::File;
use std::path::Path;

pub const EQUITY_CSV_HEADER: [&str; 5] = ["timestamp", "total", "returns", "equity_curve", "drawdown"];

fn timestamp_field(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn value_field(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

pub fn write_equity_csv(path: &Path, curve: &EquityCurve) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create equity CSV {}", path.display()))?;
    writer.write_record(EQUITY_CSV_HEADER)?;
    for point in curve.points() {
        writer.write_record([
            timestamp_field(&point.timestamp),
            value_field(point.total),
            value_field(point.returns),
            value_field(point.equity_curve),
            value_field(point.drawdown),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush equity CSV {}", path.display()))?;
    Ok(())
}

pub fn write_equity_parquet(path: &Path, curve: &EquityCurve) -> Result<()> {
    let points = curve.points();
    let column = |name: &str, f: fn(&EquityPoint) -> f64| -> Column {
        let values: Vec<Option<f64>> = points.iter().map(|p| finite(f(p))).collect();
        Series::new(name.into(), values).into()
    };
    let timestamps: Vec<String> = points.iter().map(|p| timestamp_field(&p.timestamp)).collect();

    let mut df = DataFrame::new(vec![
        Series::new("timestamp".into(), timestamps).into(),
        column("total", |p| p.total),
        column("returns", |p| p.returns),
        column("equity_curve", |p| p.equity_curve),
        column("drawdown", |p| p.drawdown),
    ])
    .context("Failed to build equity dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create equity parquet {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("Failed to write equity parquet")?;
    Ok(())
}

/// Read an `equity.csv` back as `(timestamp, total, returns, equity_curve,
/// drawdown)` rows; empty fields become NaN.
pub fn read_equity_csv(path: &Path) -> Result<Vec<EquityPoint>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open equity CSV {}", path.display()))?;
    let parse = |field: &str| -> Result<f64> {
        if field.is_empty() {
            Ok(f64::NAN)
        } else {
            field
                .parse::<f64>()
                .with_context(|| format!("Invalid number '{field}' in equity CSV"))
        }
    };

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read equity CSV row")?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let timestamp = DateTime::parse_from_rfc3339(field(0))
            .with_context(|| format!("Invalid timestamp '{}' in equity CSV", field(0)))?
            .with_timezone(&Utc);
        points.push(EquityPoint {
            timestamp,
            total: parse(field(1))?,
            returns: parse(field(2))?,
            equity_curve: parse(field(3))?,
            drawdown: parse(field(4))?,
        });
    }
    Ok(points)
}
