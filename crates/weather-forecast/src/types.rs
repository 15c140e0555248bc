//! Core data types shared by the forecasting pipeline.

use serde::{Deserialize, Serialize};

/// Columns of the served feature row, in the order they are assembled.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "dayofyear",
    "month",
    "day",
    "temp_lag1",
    "temp_lag7",
    "temp_rolling_7",
    "pressure_mean",
    "humidity_mean",
    "wind_mean",
    "precip_mean",
];

/// Number of columns in a feature row.
pub const FEATURE_COUNT: usize = 10;

/// Half-width of the heuristic confidence band, in °C.
pub const CONFIDENCE_MARGIN: f64 = 2.0;

/// Nominal coverage reported alongside the confidence band.
pub const CONFIDENCE_LEVEL: &str = "~95%";

/// Fixed-margin band around a point prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceInterval {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_level: String,
}

/// A rounded point prediction with its confidence band.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Forecast {
    pub temperature_celsius: f64,
    pub confidence_interval: ConfidenceInterval,
}

impl Forecast {
    /// Wrap a raw model output. Rejects NaN and infinities.
    pub fn from_prediction(value: f64) -> ForecastResult<Self> {
        if !value.is_finite() {
            return Err(ForecastError::NonFinitePrediction(value));
        }

        Ok(Self {
            temperature_celsius: round2(value),
            confidence_interval: ConfidenceInterval {
                lower_bound: round2(value - CONFIDENCE_MARGIN),
                upper_bound: round2(value + CONFIDENCE_MARGIN),
                confidence_level: CONFIDENCE_LEVEL.to_string(),
            },
        })
    }
}

/// Round to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Errors that can occur in the forecasting library.
#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Insufficient history: need at least {required} observations, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Feature '{0}' is required by the model but not provided")]
    MissingFeature(String),

    #[error("Expected {expected} input values, got {got}")]
    InputWidth { expected: usize, got: usize },

    #[error("Model returned a non-finite value: {0}")]
    NonFinitePrediction(f64),
}

/// Convenience result type.
pub type ForecastResult<T> = Result<T, ForecastError>;
