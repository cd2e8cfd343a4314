//! SQLite data adapter.
//!
//! Daily closes live in a single `prices(symbol, date, close)` table; `date`
//! is stored as `YYYY-MM-DD` text so range filters compare lexically.

use crate::domain::error::SimError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> SimError {
    SimError::Data {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> SimError {
    SimError::Data {
        reason: format!("query failed: {}", e),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimError> {
        let db_path = config
            .get_string("sqlite", "path")
            .ok_or_else(|| SimError::ConfigMissing {
                section: "sqlite".into(),
                key: "path".into(),
            })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(pool_err)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), SimError> {
        let conn = self.pool.get().map_err(pool_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                close REAL,
                PRIMARY KEY (symbol, date)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date);",
        )
        .map_err(query_err)?;

        Ok(())
    }

    pub fn insert_prices(&self, series: &PriceSeries) -> Result<(), SimError> {
        let mut conn = self.pool.get().map_err(pool_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        for point in &series.points {
            tx.execute(
                "INSERT OR REPLACE INTO prices (symbol, date, close) VALUES (?1, ?2, ?3)",
                params![
                    series.symbol,
                    point.date.format("%Y-%m-%d").to_string(),
                    point.price
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SimError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let query = "SELECT date, close
                     FROM prices
                     WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;
        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let close: Option<f64> = row.get(1)?;
                Ok(close.map(|price| PricePoint::new(date, price)))
            })
            .map_err(query_err)?;

        let mut points = Vec::new();
        for row in rows {
            if let Some(point) = row.map_err(query_err)? {
                points.push(point);
            }
        }

        if points.is_empty() {
            return Err(SimError::DataUnavailable {
                symbol: symbol.to_string(),
                start: start_date,
                end: end_date,
            });
        }
        Ok(PriceSeries::new(symbol, points))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SimError> {
        let conn = self.pool.get().map_err(pool_err)?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn seeded() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
            .insert_prices(&PriceSeries::new(
                "BHP",
                vec![
                    PricePoint::new(day(3), 102.0),
                    PricePoint::new(day(1), 100.5),
                    PricePoint::new(day(2), 101.5),
                ],
            ))
            .unwrap();
        adapter
            .insert_prices(&PriceSeries::new("CBA", vec![PricePoint::new(day(1), 150.5)]))
            .unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&FileConfigAdapter::empty());
        match result {
            Err(SimError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn in_memory_initialization() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn fetch_prices_returns_sorted_range() {
        let adapter = seeded();
        let series = adapter.fetch_prices("BHP", day(1), day(2)).unwrap();

        assert_eq!(series.symbol, "BHP");
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[0], PricePoint::new(day(1), 100.5));
        assert_eq!(series.points[1].price, 101.5);
    }

    #[test]
    fn unknown_symbol_is_data_unavailable() {
        let adapter = seeded();
        let err = adapter.fetch_prices("XYZ", day(1), day(31)).unwrap_err();
        assert!(matches!(err, SimError::DataUnavailable { symbol, .. } if symbol == "XYZ"));
    }

    #[test]
    fn null_close_rows_are_skipped() {
        let adapter = seeded();
        {
            let conn = adapter.pool.get().unwrap();
            conn.execute(
                "INSERT INTO prices (symbol, date, close) VALUES ('BHP', '2024-01-04', NULL)",
                [],
            )
            .unwrap();
        }
        let series = adapter.fetch_prices("BHP", day(1), day(31)).unwrap();
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn list_symbols_is_distinct_and_sorted() {
        let adapter = seeded();
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }
}
