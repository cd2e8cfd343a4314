#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use stratsim::domain::error::SimError;
pub use stratsim::domain::price::{LookbackWindow, PricePoint, PriceSeries};
use stratsim::domain::simulation::SimulationSettings;
use stratsim::domain::strategy::WindowPair;
use stratsim::ports::data_port::DataPort;

/// In-memory data port honouring the port contract: date-range filtering,
/// sorted output and `DataUnavailable` for unknown symbols or empty ranges.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, SimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SimError::Data {
                reason: reason.clone(),
            });
        }
        let mut points: Vec<PricePoint> = self
            .data
            .get(symbol)
            .map(|pts| {
                pts.iter()
                    .copied()
                    .filter(|p| p.date >= start_date && p.date <= end_date)
                    .collect()
            })
            .unwrap_or_default();
        if points.is_empty() {
            return Err(SimError::DataUnavailable {
                symbol: symbol.to_string(),
                start: start_date,
                end: end_date,
            });
        }
        points.sort_by_key(|p| p.date);
        Ok(PriceSeries::new(symbol, points))
    }

    fn list_symbols(&self) -> Result<Vec<String>, SimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn point(date_str: &str, price: f64) -> PricePoint {
    PricePoint::new(
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        price,
    )
}

/// One point on the first of each month starting at `start_year`-01.
pub fn monthly_points(start_year: i32, prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            let year = start_year + (i / 12) as i32;
            let month = (i % 12) as u32 + 1;
            PricePoint::new(date(year, month, 1), price)
        })
        .collect()
}

/// Consecutive calendar days from `start_date`.
pub fn daily_points(start_date: &str, prices: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint::new(start + chrono::Duration::days(i as i64), price))
        .collect()
}

pub fn settings(start: NaiveDate, end: NaiveDate) -> SimulationSettings {
    SimulationSettings {
        window: LookbackWindow::new(start, end),
        crossover: WindowPair::MONTHLY_DEFAULT,
    }
}
