//! Feature row assembly for a single forecast day.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::history::{HistoricalSeries, LAG_WINDOW};
use crate::types::{ForecastError, ForecastResult};

/// Forecast-day atmospheric means supplied by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AtmosphericMeans {
    /// Millibars.
    pub pressure_mean: f64,
    /// Percent relative humidity.
    pub humidity_mean: f64,
    /// Kilometres per hour.
    pub wind_mean: f64,
    /// Millimetres.
    pub precip_mean: f64,
}

/// The ten model inputs for one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureRow {
    pub dayofyear: u32,
    pub month: u32,
    pub day: u32,
    pub temp_lag1: f64,
    pub temp_lag7: f64,
    pub temp_rolling_7: f64,
    pub pressure_mean: f64,
    pub humidity_mean: f64,
    pub wind_mean: f64,
    pub precip_mean: f64,
}

impl FeatureRow {
    /// Combine calendar features of `date`, lags from `history`, and `means`.
    /// `temp_rolling_7` is the mean of the whole history series.
    pub fn assemble(
        date: NaiveDate,
        history: &HistoricalSeries,
        means: AtmosphericMeans,
    ) -> ForecastResult<Self> {
        if history.len() < LAG_WINDOW {
            return Err(ForecastError::InsufficientHistory {
                required: LAG_WINDOW,
                available: history.len(),
            });
        }

        Ok(Self {
            dayofyear: date.ordinal(),
            month: date.month(),
            day: date.day(),
            temp_lag1: history.lag(1)?,
            temp_lag7: history.lag(LAG_WINDOW)?,
            temp_rolling_7: history.mean()?,
            pressure_mean: means.pressure_mean,
            humidity_mean: means.humidity_mean,
            wind_mean: means.wind_mean,
            precip_mean: means.precip_mean,
        })
    }

    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<f64> {
        let value = match column {
            "dayofyear" => self.dayofyear as f64,
            "month" => self.month as f64,
            "day" => self.day as f64,
            "temp_lag1" => self.temp_lag1,
            "temp_lag7" => self.temp_lag7,
            "temp_rolling_7" => self.temp_rolling_7,
            "pressure_mean" => self.pressure_mean,
            "humidity_mean" => self.humidity_mean,
            "wind_mean" => self.wind_mean,
            "precip_mean" => self.precip_mean,
            _ => return None,
        };
        Some(value)
    }

    /// Values re-ordered to match a model's column names.
    pub fn ordered<S: AsRef<str>>(&self, columns: &[S]) -> ForecastResult<Vec<f64>> {
        columns
            .iter()
            .map(|c| {
                let name = c.as_ref();
                self.get(name)
                    .ok_or_else(|| ForecastError::MissingFeature(name.to_string()))
            })
            .collect()
    }
}

/// Parse a target date. Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, and ISO
/// date-times with or without an offset; only the calendar date is kept.
pub fn parse_target_date(raw: &str) -> ForecastResult<NaiveDate> {
    let raw = raw.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(d);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }

    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt.date());
        }
    }

    Err(ForecastError::InvalidDate(raw.to_string()))
}
