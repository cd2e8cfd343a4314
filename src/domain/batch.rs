//! Multi-symbol batch driver.
//!
//! Symbols are processed in request order and independently: a failure for
//! one symbol becomes a `SymbolFailure` entry and never aborts the batch.

use std::str::FromStr;

use tracing::{debug, warn};

use crate::domain::error::SimError;
use crate::domain::simulation::{
    SimulationReport, SimulationSettings, SymbolFailure, SymbolResult, VolatilityReport,
    simulate_symbol, volatility_symbol,
};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOrder {
    pub symbol: String,
    pub amount: f64,
    /// Raw tag; parsed per order so a bad tag only fails its own symbol.
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchInputError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("no symbols given")]
    NoSymbols,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

/// Comma-separated symbols, trimmed and upper-cased.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, BatchInputError> {
    if input.trim().is_empty() {
        return Err(BatchInputError::NoSymbols);
    }

    let mut symbols = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(BatchInputError::EmptyToken);
        }
        symbols.push(trimmed.to_uppercase());
    }
    Ok(symbols)
}

pub fn parse_amounts(input: &str) -> Result<Vec<f64>, BatchInputError> {
    input
        .split(',')
        .map(|token| {
            let trimmed = token.trim();
            f64::from_str(trimmed).map_err(|_| BatchInputError::InvalidAmount(trimmed.to_string()))
        })
        .collect()
}

/// Pairs symbols with amounts positionally; surplus entries on either side
/// are dropped.
pub fn orders_from_lists(symbols: &[String], amounts: &[f64], strategy: &str) -> Vec<SimulationOrder> {
    symbols
        .iter()
        .zip(amounts)
        .map(|(symbol, &amount)| SimulationOrder {
            symbol: symbol.clone(),
            amount,
            strategy: strategy.to_string(),
        })
        .collect()
}

pub fn run_simulation_batch(
    data_port: &dyn DataPort,
    orders: &[SimulationOrder],
    settings: &SimulationSettings,
) -> Vec<SymbolResult<SimulationReport>> {
    orders
        .iter()
        .map(|order| {
            debug!(symbol = %order.symbol, amount = order.amount, strategy = %order.strategy, "simulating");
            isolate(&order.symbol, simulate_order(data_port, order, settings))
        })
        .collect()
}

pub fn run_volatility_batch(
    data_port: &dyn DataPort,
    symbols: &[String],
    settings: &SimulationSettings,
) -> Vec<SymbolResult<VolatilityReport>> {
    symbols
        .iter()
        .map(|symbol| {
            debug!(symbol = %symbol, "computing return statistics");
            let result = data_port
                .fetch_prices(symbol, settings.window.start, settings.window.end)
                .and_then(|series| volatility_symbol(&series));
            isolate(symbol, result)
        })
        .collect()
}

fn simulate_order(
    data_port: &dyn DataPort,
    order: &SimulationOrder,
    settings: &SimulationSettings,
) -> Result<SimulationReport, SimError> {
    let strategy = Strategy::from_str(&order.strategy)?;
    if !order.amount.is_finite() || order.amount <= 0.0 {
        return Err(SimError::InvalidAmount {
            amount: order.amount,
        });
    }
    let series = data_port.fetch_prices(&order.symbol, settings.window.start, settings.window.end)?;
    simulate_symbol(&series, order.amount, strategy, settings)
}

fn isolate<T>(symbol: &str, result: Result<T, SimError>) -> SymbolResult<T> {
    match result {
        Ok(value) => SymbolResult::Success(value),
        Err(e) => {
            warn!(symbol = %symbol, kind = e.kind(), error = %e, "symbol failed");
            SymbolResult::Failure(SymbolFailure::from_error(symbol, &e))
        }
    }
}
