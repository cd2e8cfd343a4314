//! HTTP JSON API adapter.
//!
//! `POST /simulate` and `POST /volatility` run the batch driver over the
//! shared data port. Per-symbol failures are part of a 200 response body.
//! The lookback window is resolved against `clock` on every request.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{Router, routing::post};
use chrono::NaiveDate;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::domain::simulation::SimulationConfig;
use crate::ports::data_port::DataPort;

/// Source of the reference date for trailing windows.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    pub simulation: SimulationConfig,
    pub clock: Clock,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/simulate", post(handlers::simulate))
        .route("/volatility", post(handlers::volatility))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
