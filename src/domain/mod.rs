//! Core domain types and logic.

pub mod price;
pub mod resample;
pub mod returns;
pub mod indicator;
pub mod strategy;
pub mod position;
pub mod contribution;
pub mod crossover;
pub mod backtest;
pub mod simulation;
pub mod batch;
pub mod config_validation;
pub mod error;
