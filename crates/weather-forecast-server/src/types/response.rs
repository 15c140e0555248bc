//! Response bodies for the HTTP endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use weather_forecast::ConfidenceInterval;

/// Body of a successful `POST /predict_temperature/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub date: String,
    pub predicted_global_temperature_celsius: f64,
    pub model_used: String,
    pub confidence_interval: ConfidenceInterval,
    pub model_version: String,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub model_loaded: bool,
    pub historical_data_loaded: bool,
    pub metadata_loaded: bool,
    pub model_version: String,
    pub training_date: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Body of `GET /model_info`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ModelInfoResponse {
    Available(ModelInfo),
    Unavailable { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub model_type: String,
    pub base_models: Vec<String>,
    pub final_estimator: String,
    pub features: Vec<String>,
    pub feature_count: usize,
    pub training_samples: Value,
    pub test_samples: Value,
    pub model_version: String,
    pub training_date: String,
}

/// Body of `GET /` when no static UI is installed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootStatus {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
    pub endpoints: EndpointIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointIndex {
    pub docs: String,
    pub predict: String,
    pub health: String,
}

impl Default for EndpointIndex {
    fn default() -> Self {
        Self {
            docs: "/docs".to_string(),
            predict: "/predict_temperature/".to_string(),
            health: "/health".to_string(),
        }
    }
}
