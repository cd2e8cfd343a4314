//! Daily to monthly resampling.
//!
//! A month is represented by its first available trading-day close. Points
//! outside the lookback window or with a missing (non-finite) or non-positive
//! price are ignored. Duplicates resolve to the first occurrence in input order.

use chrono::Datelike;
use serde::Serialize;

use crate::domain::error::SimError;
use crate::domain::price::{LookbackWindow, PricePoint, PriceSeries};

/// One point per calendar month, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    series: PriceSeries,
}

/// Presentation form of a monthly point, labelled `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPrice {
    pub date: String,
    pub price: f64,
}

impl MonthlySeries {
    pub fn points(&self) -> &[PricePoint] {
        &self.series.points
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn as_series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn first_price(&self) -> f64 {
        self.series.points[0].price
    }

    pub fn last_price(&self) -> f64 {
        self.series.points[self.series.points.len() - 1].price
    }

    pub fn labelled(&self) -> Vec<MonthlyPrice> {
        self.series
            .points
            .iter()
            .map(|p| MonthlyPrice {
                date: p.date.format("%Y-%m").to_string(),
                price: p.price,
            })
            .collect()
    }
}

pub fn to_monthly(raw: &PriceSeries, window: LookbackWindow) -> Result<MonthlySeries, SimError> {
    let unavailable = || SimError::DataUnavailable {
        symbol: raw.symbol.clone(),
        start: window.start,
        end: window.end,
    };

    let mut usable: Vec<PricePoint> = raw
        .points
        .iter()
        .copied()
        .filter(|p| p.is_usable() && window.contains(p.date))
        .collect();
    if usable.is_empty() {
        return Err(unavailable());
    }
    usable.sort_by_key(|p| p.date);

    let mut months: Vec<PricePoint> = Vec::new();
    for point in usable {
        let same_month = months.last().is_some_and(|m| {
            m.date.year() == point.date.year() && m.date.month() == point.date.month()
        });
        if !same_month {
            months.push(point);
        }
    }

    if months.is_empty() {
        return Err(unavailable());
    }

    Ok(MonthlySeries {
        series: PriceSeries::new(raw.symbol.clone(), months),
    })
}
