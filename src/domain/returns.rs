//! Period-over-period return statistics.
//!
//! r[t] = (P[t] - P[t-1]) / P[t-1]
//! A return with a zero or missing denominator (or a missing numerator) is
//! absent, not zero.

use serde::Serialize;

use crate::domain::error::SimError;
use crate::domain::price::PriceSeries;

pub const MIN_RETURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub std: f64,
}

impl ReturnSummary {
    pub fn compute(series: &PriceSeries) -> Result<Self, SimError> {
        let returns = simple_returns(series);
        Self::from_returns(&series.symbol, returns)
    }

    pub fn from_returns(symbol: &str, mut returns: Vec<f64>) -> Result<Self, SimError> {
        if returns.len() < MIN_RETURNS {
            return Err(SimError::InsufficientData {
                symbol: symbol.to_string(),
                have: returns.len(),
                need: MIN_RETURNS,
            });
        }

        let std = sample_stddev(&returns);
        returns.sort_by(f64::total_cmp);

        Ok(ReturnSummary {
            min: returns[0],
            q1: quantile_sorted(&returns, 0.25),
            median: quantile_sorted(&returns, 0.5),
            q3: quantile_sorted(&returns, 0.75),
            max: returns[returns.len() - 1],
            std,
        })
    }
}

pub fn simple_returns(series: &PriceSeries) -> Vec<f64> {
    series
        .points
        .windows(2)
        .filter_map(|w| {
            let prev = w[0].price;
            let curr = w[1].price;
            if prev.is_finite() && prev != 0.0 && curr.is_finite() {
                Some((curr - prev) / prev)
            } else {
                None
            }
        })
        .collect()
}

/// Linear interpolation between order statistics. `sorted` must be non-empty.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn sample_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
