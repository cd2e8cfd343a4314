//! Configuration validation.
//!
//! Every key is optional; a present key must hold a usable value. Runs
//! before any data is fetched.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::domain::error::SimError;
use crate::domain::price::{DEFAULT_LOOKBACK_YEARS, MAX_LOOKBACK_YEARS};
use crate::domain::strategy::{MaOption, WindowPair};
use crate::ports::config_port::ConfigPort;

pub const DATA_SOURCES: [&str; 2] = ["csv", "sqlite"];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SimError> {
    validate_data_source(config)?;
    validate_sqlite(config)?;
    validate_simulation(config)?;
    validate_backtest(config)?;
    validate_web(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SimError {
    SimError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Reads an integer key, `default` when absent.
pub fn positive_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, SimError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    let value = i64::from_str(raw.trim())
        .map_err(|_| invalid(section, key, format!("{} is not an integer", raw.trim())))?;
    if value < 1 {
        return Err(invalid(section, key, format!("{} must be at least 1", key)));
    }
    Ok(value)
}

/// `[simulation] lookback_years`, between 1 and `MAX_LOOKBACK_YEARS`.
pub fn lookback_years(config: &dyn ConfigPort) -> Result<i64, SimError> {
    let years = positive_int(config, "simulation", "lookback_years", DEFAULT_LOOKBACK_YEARS)?;
    if years > MAX_LOOKBACK_YEARS {
        return Err(invalid(
            "simulation",
            "lookback_years",
            format!("lookback_years must be at most {}", MAX_LOOKBACK_YEARS),
        ));
    }
    Ok(years)
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), SimError> {
    match config.get_string("data", "source") {
        Some(s) if !DATA_SOURCES.contains(&s.trim().to_lowercase().as_str()) => Err(invalid(
            "data",
            "source",
            format!("unknown source '{}', expected csv or sqlite", s.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), SimError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase());
    if source.as_deref() == Some("sqlite") {
        match config.get_string("sqlite", "path") {
            Some(p) if !p.trim().is_empty() => {}
            _ => {
                return Err(SimError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
        }
    }
    positive_int(config, "sqlite", "pool_size", 4)?;
    Ok(())
}

fn validate_simulation(config: &dyn ConfigPort) -> Result<(), SimError> {
    lookback_years(config)?;
    config.get_date("simulation", "end_date")?;

    let short = positive_int(config, "simulation", "short_window", 3)?;
    let long = positive_int(config, "simulation", "long_window", 12)?;
    WindowPair::new(short as usize, long as usize).map_err(|e| {
        invalid("simulation", "short_window", e.to_string())
    })?;
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), SimError> {
    let start = config.get_date("backtest", "start_date")?;
    let end = config.get_date("backtest", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }

    if let Some(option) = config.get_string("backtest", "option") {
        MaOption::from_str(&option)?;
    }
    Ok(())
}

fn validate_web(config: &dyn ConfigPort) -> Result<(), SimError> {
    if let Some(listen) = config.get_string("web", "listen") {
        SocketAddr::from_str(listen.trim()).map_err(|_| {
            invalid("web", "listen", format!("'{}' is not a socket address", listen.trim()))
        })?;
    }
    Ok(())
}
