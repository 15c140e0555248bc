//! Prediction request body and its range checks.

use serde::{Deserialize, Serialize};

use weather_forecast::AtmosphericMeans;

/// Inclusive bounds for one numeric input field.
#[derive(Debug, Clone, Copy)]
pub struct FieldBound {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const PRESSURE_BOUND: FieldBound = FieldBound {
    field: "pressure_mean",
    min: 900.0,
    max: 1100.0,
};
pub const HUMIDITY_BOUND: FieldBound = FieldBound {
    field: "humidity_mean",
    min: 0.0,
    max: 100.0,
};
pub const WIND_BOUND: FieldBound = FieldBound {
    field: "wind_mean",
    min: 0.0,
    max: 200.0,
};
pub const PRECIP_BOUND: FieldBound = FieldBound {
    field: "precip_mean",
    min: 0.0,
    max: 500.0,
};

/// Forecast-day inputs for `POST /predict_temperature/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherInput {
    /// Target date, `YYYY-MM-DD`. Defaults to today.
    #[serde(default = "default_target_date")]
    pub target_date: String,
    /// Mean atmospheric pressure in millibars.
    #[serde(default = "default_pressure")]
    pub pressure_mean: f64,
    /// Mean relative humidity in percent.
    #[serde(default = "default_humidity")]
    pub humidity_mean: f64,
    /// Mean wind speed in km/h.
    #[serde(default = "default_wind")]
    pub wind_mean: f64,
    /// Mean precipitation in mm.
    #[serde(default = "default_precip")]
    pub precip_mean: f64,
}

fn default_target_date() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
fn default_pressure() -> f64 {
    1014.0
}
fn default_humidity() -> f64 {
    60.0
}
fn default_wind() -> f64 {
    10.0
}
fn default_precip() -> f64 {
    0.5
}

impl Default for WeatherInput {
    fn default() -> Self {
        Self {
            target_date: default_target_date(),
            pressure_mean: default_pressure(),
            humidity_mean: default_humidity(),
            wind_mean: default_wind(),
            precip_mean: default_precip(),
        }
    }
}

/// One rejected field, shaped like a validation error entry from the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationIssue {
    pub fn body(field: Option<&str>, msg: impl Into<String>, kind: &str) -> Self {
        let mut loc = vec!["body".to_string()];
        if let Some(field) = field {
            loc.push(field.to_string());
        }
        Self {
            loc,
            msg: msg.into(),
            kind: kind.to_string(),
        }
    }
}

impl WeatherInput {
    /// Check every numeric field against its bounds, collecting all violations.
    pub fn validate(&self) -> Result<(), Vec<ValidationIssue>> {
        let checks = [
            (PRESSURE_BOUND, self.pressure_mean),
            (HUMIDITY_BOUND, self.humidity_mean),
            (WIND_BOUND, self.wind_mean),
            (PRECIP_BOUND, self.precip_mean),
        ];

        let issues: Vec<ValidationIssue> = checks
            .iter()
            .filter_map(|(bound, value)| check_bound(bound, *value))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    pub fn means(&self) -> AtmosphericMeans {
        AtmosphericMeans {
            pressure_mean: self.pressure_mean,
            humidity_mean: self.humidity_mean,
            wind_mean: self.wind_mean,
            precip_mean: self.precip_mean,
        }
    }
}

fn check_bound(bound: &FieldBound, value: f64) -> Option<ValidationIssue> {
    if value.is_nan() {
        return Some(ValidationIssue::body(
            Some(bound.field),
            "Input should be a finite number",
            "finite_number",
        ));
    }
    if value < bound.min {
        return Some(ValidationIssue::body(
            Some(bound.field),
            format!("Input should be greater than or equal to {}", bound.min),
            "greater_than_equal",
        ));
    }
    if value > bound.max {
        return Some(ValidationIssue::body(
            Some(bound.field),
            format!("Input should be less than or equal to {}", bound.max),
            "less_than_equal",
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let input: WeatherInput = serde_json::from_str(r#"{"target_date": "2024-12-25"}"#).unwrap();
        assert_eq!(input.pressure_mean, 1014.0);
        assert_eq!(input.humidity_mean, 60.0);
        assert_eq!(input.wind_mean, 10.0);
        assert_eq!(input.precip_mean, 0.5);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_default_date_is_today() {
        let input: WeatherInput = serde_json::from_str("{}").unwrap();
        assert!(weather_forecast::parse_target_date(&input.target_date).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let input = WeatherInput {
            target_date: "2024-01-01".to_string(),
            pressure_mean: 900.0,
            humidity_mean: 100.0,
            wind_mean: 0.0,
            precip_mean: 500.0,
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_each_bound_rejects() {
        let cases = [
            ("pressure_mean", 899.9),
            ("pressure_mean", 1100.1),
            ("humidity_mean", -0.1),
            ("humidity_mean", 100.5),
            ("wind_mean", -1.0),
            ("wind_mean", 200.01),
            ("precip_mean", -0.5),
            ("precip_mean", 501.0),
        ];
        for (field, value) in cases {
            let mut input = WeatherInput::default();
            match field {
                "pressure_mean" => input.pressure_mean = value,
                "humidity_mean" => input.humidity_mean = value,
                "wind_mean" => input.wind_mean = value,
                _ => input.precip_mean = value,
            }
            let issues = input.validate().unwrap_err();
            assert_eq!(issues.len(), 1, "{field}={value}");
            assert_eq!(issues[0].loc, vec!["body".to_string(), field.to_string()]);
        }
    }

    #[test]
    fn test_collects_all_violations() {
        let input = WeatherInput {
            humidity_mean: 150.0,
            wind_mean: -3.0,
            ..WeatherInput::default()
        };
        let issues = input.validate().unwrap_err();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].kind, "less_than_equal");
        assert_eq!(issues[1].kind, "greater_than_equal");
    }
}
