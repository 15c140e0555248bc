//! Forecast service: artifact loading and request-level operations.

pub mod artifacts;
pub mod forecaster;

pub use artifacts::{HistorySource, LoadedArtifacts};
pub use forecaster::ForecastService;
