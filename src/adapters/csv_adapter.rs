//! CSV file data adapter.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row. The close
//! column is located by name: `close`, falling back to `adj close`. Symbols
//! are limited to ASCII alphanumerics and `.^_-`, without `..`, so a lookup
//! never leaves the base directory.

use crate::domain::error::SimError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const CLOSE_COLUMNS: [&str; 2] = ["close", "adj close"];
const MISSING_VALUES: [&str; 3] = ["", "null", "nan"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> Option<PathBuf> {
        is_file_safe_symbol(symbol).then(|| self.base_path.join(format!("{}.csv", symbol)))
    }
}

fn is_file_safe_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && !symbol.contains("..")
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '_' | '-'))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    })
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SimError> {
        let unavailable = || SimError::DataUnavailable {
            symbol: symbol.to_string(),
            start: start_date,
            end: end_date,
        };

        let Some(path) = self.csv_path(symbol).filter(|p| p.is_file()) else {
            tracing::debug!(symbol, "no csv file for symbol");
            return Err(unavailable());
        };
        let content = fs::read_to_string(&path).map_err(|e| SimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| SimError::Data {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_col = find_column(&headers, &["date"]).ok_or_else(|| SimError::Data {
            reason: format!("{} has no date column", path.display()),
        })?;
        let close_col = find_column(&headers, &CLOSE_COLUMNS).ok_or_else(unavailable)?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SimError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| SimError::Data {
                reason: format!("invalid date '{}' in {}", date_str, path.display()),
            })?;
            if date < start_date || date > end_date {
                continue;
            }

            let close_str = record.get(close_col).unwrap_or_default().trim();
            if MISSING_VALUES.contains(&close_str.to_lowercase().as_str()) {
                continue;
            }
            let price: f64 = close_str.parse().map_err(|e| SimError::Data {
                reason: format!("invalid close value '{}': {}", close_str, e),
            })?;

            points.push(PricePoint::new(date, price));
        }

        if points.is_empty() {
            return Err(unavailable());
        }
        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(symbol, points))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SimError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if let (true, Some(stem)) = (is_csv, path.file_stem()) {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
