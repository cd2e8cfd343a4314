//! Daily price points, per-symbol series and lookback windows.

use chrono::{NaiveDate, TimeDelta};

use crate::domain::error::SimError;

/// Days in one lookback "year"; windows are counted in calendar days.
pub const DAYS_PER_YEAR: i64 = 365;

pub const DEFAULT_LOOKBACK_YEARS: i64 = 5;
pub const MAX_LOOKBACK_YEARS: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// A usable observation has a finite, strictly positive price.
    pub fn is_usable(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Close on `date`, if the series has an observation for it.
    pub fn price_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].price)
    }
}

/// Inclusive date range a series is fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LookbackWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// `years * 365` calendar days ending at `end`. A span that leaves the
    /// representable date range is `ConfigInvalid` on `lookback_years`.
    pub fn trailing_years(end: NaiveDate, years: i64) -> Result<Self, SimError> {
        let start = Some(years)
            .filter(|y| *y >= 0)
            .and_then(|y| y.checked_mul(DAYS_PER_YEAR))
            .and_then(TimeDelta::try_days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| SimError::ConfigInvalid {
                section: "simulation".into(),
                key: "lookback_years".into(),
                reason: format!("{} years before {} is out of range", years, end),
            })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
