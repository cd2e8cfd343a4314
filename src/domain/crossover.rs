//! Moving-average crossover position simulator.
//!
//! Long/flat state machine over a monthly series:
//! - Flat -> Long when short MA > long MA (all cash into shares)
//! - Long -> Flat when short MA < long MA (all shares into cash)
//! - equal MAs or warmup points leave the position unchanged
//!
//! The terminal value marks any open shares to the final price.

use chrono::NaiveDate;

use crate::domain::error::SimError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::position::{Position, PositionState};
use crate::domain::price::PricePoint;
use crate::domain::resample::MonthlySeries;
use crate::domain::strategy::WindowPair;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub date: NaiveDate,
    pub kind: TransitionKind,
    pub price: f64,
    pub value_before: f64,
    pub value_after: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverRun {
    pub final_value: f64,
    pub final_state: PositionState,
    pub transitions: Vec<Transition>,
    pub equity_curve: Vec<EquityPoint>,
}

pub fn simulate_crossover_position(
    series: &MonthlySeries,
    amount: f64,
    windows: WindowPair,
) -> Result<CrossoverRun, SimError> {
    if series.len() < windows.long() {
        return Err(SimError::InsufficientWindow {
            have: series.len(),
            window: windows.long(),
        });
    }

    let short_ma = calculate_sma(series.points(), windows.short());
    let long_ma = calculate_sma(series.points(), windows.long());
    Ok(apply_crossover_rule(
        series.points(),
        &short_ma,
        &long_ma,
        amount,
    ))
}

/// Runs the long/flat rule over precomputed averages aligned with `points`.
/// `points` must be non-empty.
pub fn apply_crossover_rule(
    points: &[PricePoint],
    short_ma: &IndicatorSeries,
    long_ma: &IndicatorSeries,
    amount: f64,
) -> CrossoverRun {
    let mut position = Position::new(amount);
    let mut transitions = Vec::new();
    let mut equity_curve = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        if let (Some(short), Some(long)) = (short_ma.value_at(i), long_ma.value_at(i)) {
            let value_before = position.market_value(point.price);
            let kind = if short > long && position.is_flat() {
                position.buy_all(point.price);
                Some(TransitionKind::Buy)
            } else if short < long && position.is_long() {
                position.sell_all(point.price);
                Some(TransitionKind::Sell)
            } else {
                None
            };

            if let Some(kind) = kind {
                transitions.push(Transition {
                    date: point.date,
                    kind,
                    price: point.price,
                    value_before,
                    value_after: position.market_value(point.price),
                });
            }
        }

        equity_curve.push(EquityPoint {
            date: point.date,
            value: position.market_value(point.price),
        });
    }

    let final_price = points[points.len() - 1].price;
    CrossoverRun {
        final_value: position.market_value(final_price),
        final_state: position.state,
        transitions,
        equity_curve,
    }
}
