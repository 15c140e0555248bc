//! Request-level operations over the loaded artifacts.

use chrono::NaiveDate;
use serde_json::Value;

use weather_forecast::{
    parse_target_date, FeatureRow, Forecast, ForecastError, ForecastResult, ModelMetadata,
    Regressor, StackingRegressor,
};

use crate::config::ArtifactPaths;
use crate::types::{
    EndpointIndex, HealthResponse, HealthStatus, ModelInfo, ModelInfoResponse,
    PredictionResponse, RootStatus, ServerError, ServerResult, WeatherInput,
};

use super::artifacts::LoadedArtifacts;

/// Version reported by predictions when no metadata is loaded.
const FALLBACK_MODEL_VERSION: &str = "1.0";

const UNKNOWN: &str = "unknown";

const MODEL_TYPE: &str = "Ensemble Stacking Regressor";

/// Base estimators reported by `/model_info` when no model is loaded.
const DEFAULT_BASE_MODELS: [&str; 2] = ["XGBoost", "RidgeCV"];
const DEFAULT_FINAL_ESTIMATOR: &str = "XGBoost";

/// Immutable service state shared by every request.
pub struct ForecastService {
    artifacts: LoadedArtifacts,
}

impl ForecastService {
    pub fn new(artifacts: LoadedArtifacts) -> Self {
        Self { artifacts }
    }

    /// Load artifacts from disk and build the service.
    pub fn load(paths: &ArtifactPaths) -> Self {
        Self::new(LoadedArtifacts::load(paths))
    }

    pub fn artifacts(&self) -> &LoadedArtifacts {
        &self.artifacts
    }

    pub fn model_loaded(&self) -> bool {
        self.artifacts.model_loaded()
    }

    /// Validate, assemble features, and run the model.
    ///
    /// Checks run in a fixed order: field bounds (422), model presence
    /// (503), date format (400), then assembly and inference (500).
    pub fn predict(&self, input: &WeatherInput) -> ServerResult<PredictionResponse> {
        input.validate().map_err(ServerError::Validation)?;

        let model = self
            .artifacts
            .model
            .as_ref()
            .ok_or(ServerError::ModelNotLoaded)?;

        let date = parse_target_date(&input.target_date).map_err(|_| ServerError::InvalidDate)?;

        let forecast = self
            .run_model(model, date, input)
            .map_err(|e| ServerError::Prediction(e.to_string()))?;

        tracing::debug!(
            "Predicted {:.2} °C for {date}",
            forecast.temperature_celsius
        );

        Ok(PredictionResponse {
            date: input.target_date.clone(),
            predicted_global_temperature_celsius: forecast.temperature_celsius,
            model_used: model.description(),
            confidence_interval: forecast.confidence_interval,
            model_version: self
                .metadata_field(ModelMetadata::model_version)
                .unwrap_or_else(|| FALLBACK_MODEL_VERSION.to_string()),
        })
    }

    fn run_model(
        &self,
        model: &StackingRegressor,
        date: NaiveDate,
        input: &WeatherInput,
    ) -> ForecastResult<Forecast> {
        let history = self
            .artifacts
            .history
            .as_ref()
            .ok_or_else(|| ForecastError::History("historical data not loaded".to_string()))?;

        let row = FeatureRow::assemble(date, history, input.means())?;
        let values = row.ordered(&model.feature_names)?;
        let raw = model.predict(&values)?;
        Forecast::from_prediction(raw)
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: if self.model_loaded() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            model_loaded: self.model_loaded(),
            historical_data_loaded: self.artifacts.history.is_some(),
            metadata_loaded: self.artifacts.metadata.is_some(),
            model_version: self
                .metadata_field(ModelMetadata::model_version)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            training_date: self
                .metadata_field(ModelMetadata::training_date)
                .unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }

    pub fn model_info(&self) -> ModelInfoResponse {
        let Some(meta) = &self.artifacts.metadata else {
            return ModelInfoResponse::Unavailable {
                error: "Model metadata not available".to_string(),
            };
        };

        let (base_models, final_estimator) = match &self.artifacts.model {
            Some(model) => (
                model.base_names().iter().map(|s| s.to_string()).collect(),
                model.final_estimator.name.clone(),
            ),
            None => (
                DEFAULT_BASE_MODELS.iter().map(|s| s.to_string()).collect(),
                DEFAULT_FINAL_ESTIMATOR.to_string(),
            ),
        };

        let unknown = || Value::String(UNKNOWN.to_string());
        let features = meta.feature_columns();

        ModelInfoResponse::Available(ModelInfo {
            model_type: MODEL_TYPE.to_string(),
            base_models,
            final_estimator,
            feature_count: features.len(),
            features,
            training_samples: meta.training_samples.clone().unwrap_or_else(unknown),
            test_samples: meta.test_samples.clone().unwrap_or_else(unknown),
            model_version: meta.model_version().unwrap_or_else(|| UNKNOWN.to_string()),
            training_date: meta.training_date().unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }

    pub fn root_status(&self) -> RootStatus {
        RootStatus {
            status: "online".to_string(),
            message: "Global Weather Forecast API is running".to_string(),
            model_loaded: self.model_loaded(),
            endpoints: EndpointIndex::default(),
        }
    }

    fn metadata_field(&self, field: fn(&ModelMetadata) -> Option<String>) -> Option<String> {
        self.artifacts.metadata.as_ref().and_then(field)
    }
}
