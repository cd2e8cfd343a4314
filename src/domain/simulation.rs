//! Per-symbol orchestration and outward result shapes.
//!
//! Composes resampling with the contribution or crossover simulators and
//! rounds terminal values to cents for presentation.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::contribution::{self, ContributionOutcome};
use crate::domain::crossover::simulate_crossover_position;
use crate::domain::error::SimError;
use crate::domain::price::{LookbackWindow, PriceSeries};
use crate::domain::resample::{MonthlyPrice, to_monthly};
use crate::domain::returns::ReturnSummary;
use crate::domain::strategy::{Strategy, WindowPair};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    pub window: LookbackWindow,
    pub crossover: WindowPair,
}

/// Window inputs before a reference date is known. A long-running caller
/// resolves these per request so the window keeps trailing the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub lookback_years: i64,
    /// Fixed window end; `None` means the reference date.
    pub end_date: Option<NaiveDate>,
    pub crossover: WindowPair,
}

impl SimulationConfig {
    pub fn settings_at(&self, today: NaiveDate) -> Result<SimulationSettings, SimError> {
        let end = self.end_date.unwrap_or(today);
        Ok(SimulationSettings {
            window: LookbackWindow::trailing_years(end, self.lookback_years)?,
            crossover: self.crossover,
        })
    }
}

/// Round half away from zero to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BothValues {
    pub monthly: f64,
    pub lump_sum: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinalValue {
    Single { final_value: f64 },
    Both { final_values: BothValues },
}

impl FinalValue {
    fn rounded(outcome: ContributionOutcome) -> Self {
        match outcome {
            ContributionOutcome::MonthlyDca(v) | ContributionOutcome::LumpSum(v) => {
                FinalValue::Single {
                    final_value: round_cents(v),
                }
            }
            ContributionOutcome::Both { monthly, lump_sum } => FinalValue::Both {
                final_values: BothValues {
                    monthly: round_cents(monthly),
                    lump_sum: round_cents(lump_sum),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub symbol: String,
    pub strategy: String,
    #[serde(flatten)]
    pub value: FinalValue,
    pub prices: Vec<MonthlyPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityReport {
    pub symbol: String,
    #[serde(flatten)]
    pub summary: ReturnSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub kind: String,
    pub error: String,
}

impl SymbolFailure {
    pub fn from_error(symbol: &str, err: &SimError) -> Self {
        SymbolFailure {
            symbol: symbol.to_string(),
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// Outcome for one symbol of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SymbolResult<T> {
    Success(T),
    Failure(SymbolFailure),
}

impl<T> SymbolResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, SymbolResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            SymbolResult::Success(value) => Some(value),
            SymbolResult::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SymbolFailure> {
        match self {
            SymbolResult::Success(_) => None,
            SymbolResult::Failure(failure) => Some(failure),
        }
    }
}

/// Resamples `raw` to monthly and runs `strategy` with `amount`.
pub fn simulate_symbol(
    raw: &PriceSeries,
    amount: f64,
    strategy: Strategy,
    settings: &SimulationSettings,
) -> Result<SimulationReport, SimError> {
    let monthly = to_monthly(raw, settings.window)?;

    let value = match strategy {
        Strategy::CrossoverPosition => {
            let run = simulate_crossover_position(&monthly, amount, settings.crossover)?;
            FinalValue::Single {
                final_value: round_cents(run.final_value),
            }
        }
        _ => FinalValue::rounded(contribution::simulate(&monthly, amount, strategy)?),
    };

    Ok(SimulationReport {
        symbol: raw.symbol.clone(),
        strategy: strategy.tag().to_string(),
        value,
        prices: monthly.labelled(),
    })
}

pub fn volatility_symbol(raw: &PriceSeries) -> Result<VolatilityReport, SimError> {
    Ok(VolatilityReport {
        symbol: raw.symbol.clone(),
        summary: ReturnSummary::compute(raw)?,
    })
}
