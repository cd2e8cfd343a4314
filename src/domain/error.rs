//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stratsim.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("no price data for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("insufficient data for {symbol}: have {have} returns, need {need}")]
    InsufficientData {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("insufficient window: series has {have} points, moving average needs {window}")]
    InsufficientWindow { have: usize, window: usize },

    #[error("invalid strategy: {tag}")]
    InvalidStrategy { tag: String },

    #[error("invalid amount {amount}: must be a positive number")]
    InvalidAmount { amount: f64 },

    #[error("invalid moving-average windows: short={short}, long={long} (need 1 <= short < long)")]
    InvalidWindow { short: usize, long: usize },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Stable snake_case label used in per-symbol failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::DataUnavailable { .. } => "data_unavailable",
            SimError::InsufficientData { .. } => "insufficient_data",
            SimError::InsufficientWindow { .. } => "insufficient_window",
            SimError::InvalidStrategy { .. } => "invalid_strategy",
            SimError::InvalidAmount { .. } => "invalid_amount",
            SimError::InvalidWindow { .. } => "invalid_window",
            SimError::Data { .. } => "data_source",
            SimError::ConfigParse { .. }
            | SimError::ConfigMissing { .. }
            | SimError::ConfigInvalid { .. } => "config",
            SimError::Io(_) => "io",
        }
    }
}

impl From<&SimError> for std::process::ExitCode {
    fn from(err: &SimError) -> Self {
        let code: u8 = match err {
            SimError::Io(_) => 1,
            SimError::ConfigParse { .. }
            | SimError::ConfigMissing { .. }
            | SimError::ConfigInvalid { .. } => 2,
            SimError::Data { .. } => 3,
            SimError::InvalidStrategy { .. }
            | SimError::InvalidAmount { .. }
            | SimError::InvalidWindow { .. } => 4,
            SimError::DataUnavailable { .. }
            | SimError::InsufficientData { .. }
            | SimError::InsufficientWindow { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
