//! CSV date × asset tables.
//!
//! Layout:
//!
//! ```text
//! date,SPY,TLT,GLD
//! 2024-01-02,472.65,98.13,190.21
//! 2024-01-03,468.79,97.84,
//! ```
//!
//! The first column is an ISO date (`YYYY-MM-DD`); every other header names an
//! asset. Empty cells are missing values and load as NaN. Rows may appear in
//! any order and are sorted by date; a repeated date is an error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use markowitz_portfolio::{PriceTable, ReturnSeries};
use nalgebra::DMatrix;
use tracing::debug;

use crate::error::{FileError, FileResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parsed table before it is handed to a container.
struct RawTable {
    dates: Vec<NaiveDate>,
    labels: Vec<String>,
    values: DMatrix<f64>,
}

fn read_table<R: Read>(reader: R) -> FileResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        Some(first) => {
            return Err(FileError::parse(
                1,
                format!("first column must be 'date', found '{first}'"),
            ))
        }
        None => return Err(FileError::parse(1, "missing header row")),
    }
    let labels: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();
    if let Some(blank) = labels.iter().position(String::is_empty) {
        return Err(FileError::parse(
            1,
            format!("asset column {} has an empty label", blank + 1),
        ));
    }

    let mut rows: Vec<(NaiveDate, u64, Vec<f64>)> = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);

        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| FileError::parse(line, format!("invalid date '{raw_date}': {e}")))?;

        let values = record
            .iter()
            .skip(1)
            .zip(&labels)
            .map(|(cell, label)| {
                if cell.is_empty() {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>().map_err(|e| {
                        FileError::parse(line, format!("invalid value '{cell}' for {label}: {e}"))
                    })
                }
            })
            .collect::<FileResult<Vec<f64>>>()?;

        rows.push((date, line, values));
    }

    let was_sorted = rows.windows(2).all(|w| w[0].0 <= w[1].0);
    rows.sort_by_key(|row| row.0);
    if let Some(pair) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(FileError::parse(
            pair[0].1.max(pair[1].1),
            format!("duplicate date {}", pair[1].0),
        ));
    }

    debug!(
        rows = rows.len(),
        assets = labels.len(),
        reordered = !was_sorted,
        "loaded CSV table"
    );

    let values = DMatrix::from_fn(rows.len(), labels.len(), |r, c| rows[r].2[c]);
    Ok(RawTable {
        dates: rows.into_iter().map(|row| row.0).collect(),
        labels,
        values,
    })
}

/// Reads close prices from any reader.
pub fn read_prices<R: Read>(reader: R) -> FileResult<PriceTable> {
    let raw = read_table(reader)?;
    Ok(PriceTable::new(raw.dates, raw.labels, raw.values)?)
}

/// Reads per-period returns from any reader.
pub fn read_returns<R: Read>(reader: R) -> FileResult<ReturnSeries> {
    let raw = read_table(reader)?;
    Ok(ReturnSeries::new(raw.dates, raw.labels, raw.values)?)
}

/// Loads close prices from a CSV file.
pub fn load_prices(path: impl AsRef<Path>) -> FileResult<PriceTable> {
    read_prices(File::open(path)?)
}

/// Loads per-period returns from a CSV file.
pub fn load_returns(path: impl AsRef<Path>) -> FileResult<ReturnSeries> {
    read_returns(File::open(path)?)
}
