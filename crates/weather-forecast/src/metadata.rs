//! Descriptive metadata written alongside a trained model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ForecastError, ForecastResult};

/// Free-form metadata record. Any well-formed JSON object is accepted; known
/// keys are kept as raw JSON and read through the accessors below.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_columns: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_samples: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ModelMetadata {
    pub fn from_json_path(path: &Path) -> ForecastResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> ForecastResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| ForecastError::Metadata(format!("Failed to parse metadata: {e}")))
    }

    pub fn model_version(&self) -> Option<String> {
        self.model_version.as_ref().and_then(display_value)
    }

    pub fn training_date(&self) -> Option<String> {
        self.training_date.as_ref().and_then(display_value)
    }

    /// Listed feature columns. Anything other than a list of strings reads as empty.
    pub fn feature_columns(&self) -> Vec<String> {
        let Some(value) = &self.feature_columns else {
            return Vec::new();
        };
        let columns: Option<Vec<String>> = value.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect()
        });
        columns.unwrap_or_else(|| {
            if !value.is_null() {
                tracing::warn!("Metadata feature_columns is not a list of strings: {value}");
            }
            Vec::new()
        })
    }

    /// Columns listed here but absent from `served`, and vice versa.
    pub fn column_drift(&self, served: &[&str]) -> (Vec<String>, Vec<String>) {
        let listed = self.feature_columns();
        let missing = served
            .iter()
            .filter(|s| !listed.iter().any(|c| c == *s))
            .map(|s| s.to_string())
            .collect();
        let unknown = listed
            .into_iter()
            .filter(|c| !served.contains(&c.as_str()))
            .collect();
        (unknown, missing)
    }
}

/// Strings as-is, `null` as absent, anything else as its JSON text.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
