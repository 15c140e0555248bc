//! Historical daily mean temperature series.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;

use crate::features::parse_target_date;
use crate::types::{ForecastError, ForecastResult};

/// Column holding the daily mean temperature in the history CSV.
pub const TEMPERATURE_COLUMN: &str = "temp_c_mean";

/// Observations needed to compute the weekly lag.
pub const LAG_WINDOW: usize = 7;

/// Value used for every slot of the fallback series (global average, °C).
pub const FALLBACK_TEMPERATURE: f64 = 15.0;

/// One day of history. `date` is `None` for the undated fallback series and
/// for rows whose index is not a recognizable date.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: Option<NaiveDate>,
    pub temp_c_mean: f64,
}

/// Date-indexed temperature series in file order, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSeries {
    points: Vec<HistoryPoint>,
}

impl HistoricalSeries {
    pub fn new(points: Vec<HistoryPoint>) -> Self {
        Self { points }
    }

    /// Seven undated days at the global average, used when no history file exists.
    pub fn fallback() -> Self {
        Self::new(
            (0..LAG_WINDOW)
                .map(|_| HistoryPoint {
                    date: None,
                    temp_c_mean: FALLBACK_TEMPERATURE,
                })
                .collect(),
        )
    }

    /// Load from a CSV file. The first column is the date index.
    pub fn from_csv_path(path: &Path) -> ForecastResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parse CSV with a header row, a date in the first column, and a
    /// `temp_c_mean` column anywhere after it.
    pub fn from_csv_reader<R: Read>(reader: R) -> ForecastResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| ForecastError::History(format!("Failed to read header: {e}")))?
            .clone();
        let temp_idx = headers
            .iter()
            .position(|h| h == TEMPERATURE_COLUMN)
            .ok_or_else(|| {
                ForecastError::History(format!("Missing '{TEMPERATURE_COLUMN}' column"))
            })?;

        let mut points = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record =
                record.map_err(|e| ForecastError::History(format!("Row {}: {e}", row + 1)))?;

            let raw_date = record.get(0).unwrap_or_default();
            let date = parse_target_date(raw_date).ok();
            if date.is_none() {
                tracing::debug!("Row {}: unrecognized date index '{raw_date}'", row + 1);
            }

            let raw_temp = record.get(temp_idx).unwrap_or_default();
            let temp_c_mean: f64 = raw_temp.parse().map_err(|_| {
                ForecastError::History(format!(
                    "Row {}: invalid {TEMPERATURE_COLUMN} '{raw_temp}'",
                    row + 1
                ))
            })?;
            if !temp_c_mean.is_finite() {
                return Err(ForecastError::History(format!(
                    "Row {}: non-finite {TEMPERATURE_COLUMN}",
                    row + 1
                )));
            }

            points.push(HistoryPoint {
                date,
                temp_c_mean,
            });
        }

        Ok(Self::new(points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the most recent observation, if the series is dated.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().and_then(|p| p.date)
    }

    /// Value `days` steps back from the end; `lag(1)` is the latest value.
    pub fn lag(&self, days: usize) -> ForecastResult<f64> {
        if days == 0 || days > self.points.len() {
            return Err(ForecastError::InsufficientHistory {
                required: days.max(1),
                available: self.points.len(),
            });
        }
        Ok(self.points[self.points.len() - days].temp_c_mean)
    }

    /// Mean over the whole series.
    pub fn mean(&self) -> ForecastResult<f64> {
        if self.points.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                required: 1,
                available: 0,
            });
        }
        let total: f64 = self.points.iter().map(|p| p.temp_c_mean).sum();
        Ok(total / self.points.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
date,temp_c_mean,pressure_mean
2024-01-01,14.0,1013.0
2024-01-02,14.5,1012.0
2024-01-03,15.0,1011.0
2024-01-04,15.5,1010.0
2024-01-05,16.0,1014.0
2024-01-06,16.5,1015.0
2024-01-07,17.0,1016.0
2024-01-08,17.5,1016.5
";

    #[test]
    fn test_parse_csv() {
        let series = HistoricalSeries::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.len(), 8);
        assert_eq!(
            series.last_date(),
            NaiveDate::from_ymd_opt(2024, 1, 8)
        );
    }

    #[test]
    fn test_lags_and_mean() {
        let series = HistoricalSeries::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.lag(1).unwrap(), 17.5);
        assert_eq!(series.lag(7).unwrap(), 14.5);
        // 14.0 through 17.5 in steps of 0.5
        assert!((series.mean().unwrap() - 15.75).abs() < 1e-12);
    }

    #[test]
    fn test_short_series() {
        let csv = "date,temp_c_mean\n2024-01-01,14.0\n2024-01-02,15.0\n";
        let series = HistoricalSeries::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.lag(1).unwrap(), 15.0);
        assert!(matches!(
            series.lag(7),
            Err(ForecastError::InsufficientHistory { required: 7, available: 2 })
        ));
        assert_eq!(series.mean().unwrap(), 14.5);
        assert!(HistoricalSeries::new(Vec::new()).mean().is_err());
    }

    #[test]
    fn test_missing_temperature_column() {
        let csv = "date,temp\n2024-01-01,14.0\n";
        let err = HistoricalSeries::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("temp_c_mean"));
    }

    #[test]
    fn test_bad_value() {
        let csv = "date,temp_c_mean\n2024-01-01,warm\n";
        assert!(matches!(
            HistoricalSeries::from_csv_reader(csv.as_bytes()),
            Err(ForecastError::History(_))
        ));
    }

    #[test]
    fn test_datetime_index() {
        let csv = "date,temp_c_mean\n2024-03-01 00:00:00,9.0\n";
        let series = HistoricalSeries::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_lenient_date_index() {
        let csv = "\
date,temp_c_mean
2024/03/01,9.0
2024-03-02T00:00:00,9.5
day three,10.0
";
        let series = HistoricalSeries::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.lag(3).unwrap(), 9.0);
        assert_eq!(series.last_date(), None);

        let csv = "date,temp_c_mean\n2024/03/01,9.0\n";
        let dated = HistoricalSeries::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dated.last_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_fallback() {
        let series = HistoricalSeries::fallback();
        assert_eq!(series.len(), 7);
        assert_eq!(series.lag(7).unwrap(), 15.0);
        assert_eq!(series.mean().unwrap(), 15.0);
        assert_eq!(series.last_date(), None);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historical_temps.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let series = HistoricalSeries::from_csv_path(&path).unwrap();
        assert_eq!(series.len(), 8);
    }
}
