//! Dollar-cost averaging vs lump-sum terminal values.
//!
//! Both rules invest the full `amount` over the same monthly series and mark
//! the resulting shares to the last monthly price. No rounding happens here.

use crate::domain::error::SimError;
use crate::domain::resample::MonthlySeries;
use crate::domain::strategy::Strategy;

/// Terminal values for the contribution rules that were requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContributionOutcome {
    MonthlyDca(f64),
    LumpSum(f64),
    Both { monthly: f64, lump_sum: f64 },
}

/// `amount / len` invested at every monthly price.
pub fn monthly_dca(series: &MonthlySeries, amount: f64) -> f64 {
    let contribution = amount / series.len() as f64;
    let shares: f64 = series
        .points()
        .iter()
        .map(|p| contribution / p.price)
        .sum();
    shares * series.last_price()
}

/// Everything invested at the first monthly price.
pub fn lump_sum(series: &MonthlySeries, amount: f64) -> f64 {
    let shares = amount / series.first_price();
    shares * series.last_price()
}

pub fn both(series: &MonthlySeries, amount: f64) -> ContributionOutcome {
    ContributionOutcome::Both {
        monthly: monthly_dca(series, amount),
        lump_sum: lump_sum(series, amount),
    }
}

/// Dispatches a contribution strategy. The crossover strategy is not a
/// contribution rule and is rejected here.
pub fn simulate(
    series: &MonthlySeries,
    amount: f64,
    strategy: Strategy,
) -> Result<ContributionOutcome, SimError> {
    match strategy {
        Strategy::MonthlyDca => Ok(ContributionOutcome::MonthlyDca(monthly_dca(series, amount))),
        Strategy::LumpSum => Ok(ContributionOutcome::LumpSum(lump_sum(series, amount))),
        Strategy::Both => Ok(both(series, amount)),
        Strategy::CrossoverPosition => Err(SimError::InvalidStrategy {
            tag: strategy.tag().to_string(),
        }),
    }
}
