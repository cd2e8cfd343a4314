//! HTTP request handlers for the web adapter.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task;

use crate::domain::batch::{orders_from_lists, run_simulation_batch, run_volatility_batch};
use crate::domain::simulation::{
    SimulationReport, SimulationSettings, SymbolResult, VolatilityReport,
};

use super::{AppState, WebError};

/// Parallel lists, zipped positionally.
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub tickers: Vec<String>,
    pub amounts: Vec<f64>,
    pub strategy: String,
}

#[derive(Debug, Deserialize)]
pub struct VolatilityRequest {
    pub tickers: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse<T> {
    pub results: Vec<SymbolResult<T>>,
}

fn normalize(tickers: Vec<String>) -> Vec<String> {
    tickers
        .into_iter()
        .map(|t| t.trim().to_uppercase())
        .collect()
}

fn current_settings(state: &AppState) -> Result<SimulationSettings, WebError> {
    state
        .simulation
        .settings_at((state.clock)())
        .map_err(|e| WebError::internal(e.to_string()))
}

pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<BatchResponse<SimulationReport>>, WebError> {
    let orders = orders_from_lists(&normalize(request.tickers), &request.amounts, &request.strategy);
    let settings = current_settings(&state)?;
    tracing::info!(
        orders = orders.len(),
        strategy = %request.strategy,
        end = %settings.window.end,
        "simulate request"
    );

    let results = task::spawn_blocking(move || {
        run_simulation_batch(state.data_port.as_ref(), &orders, &settings)
    })
    .await
    .map_err(|e| WebError::internal(format!("simulation task failed: {}", e)))?;

    Ok(Json(BatchResponse { results }))
}

pub async fn volatility(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VolatilityRequest>,
) -> Result<Json<BatchResponse<VolatilityReport>>, WebError> {
    let symbols = normalize(request.tickers);
    let settings = current_settings(&state)?;
    tracing::info!(symbols = symbols.len(), end = %settings.window.end, "volatility request");

    let results = task::spawn_blocking(move || {
        run_volatility_batch(state.data_port.as_ref(), &symbols, &settings)
    })
    .await
    .map_err(|e| WebError::internal(format!("volatility task failed: {}", e)))?;

    Ok(Json(BatchResponse { results }))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}
