//! Startup loading of the model, history, and metadata artifacts.

use std::path::Path;

use weather_forecast::{
    HistoricalSeries, ModelMetadata, ModelReader, StackingRegressor, FEATURE_COLUMNS,
};

use crate::config::ArtifactPaths;

/// Where the served history came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySource {
    File,
    Fallback,
}

/// Everything loaded at startup. Any artifact may be missing; the
/// service then runs degraded instead of refusing to start.
#[derive(Debug, Clone, Default)]
pub struct LoadedArtifacts {
    pub model: Option<StackingRegressor>,
    pub history: Option<HistoricalSeries>,
    pub history_source: Option<HistorySource>,
    pub metadata: Option<ModelMetadata>,
}

impl LoadedArtifacts {
    /// Load all artifacts, logging and skipping any that are missing or malformed.
    pub fn load(paths: &ArtifactPaths) -> Self {
        let model = load_model(&paths.model);
        let (history, history_source) = load_history(&paths.history);
        let metadata = load_metadata(&paths.metadata);

        let artifacts = Self {
            model,
            history,
            history_source,
            metadata,
        };
        artifacts.check_feature_columns();

        if artifacts.model.is_some() {
            tracing::info!("Artifacts loaded. Ready to serve predictions.");
        } else {
            tracing::warn!("No model loaded. API will run in degraded mode.");
        }

        artifacts
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Warn when the metadata or model columns disagree with the served row.
    fn check_feature_columns(&self) {
        if let Some(meta) = &self.metadata {
            if !meta.feature_columns().is_empty() {
                let (unknown, missing) = meta.column_drift(&FEATURE_COLUMNS);
                if !unknown.is_empty() || !missing.is_empty() {
                    tracing::warn!(
                        "Metadata feature columns differ from served features (unknown: {:?}, missing: {:?})",
                        unknown,
                        missing
                    );
                }
            }
        }

        if let Some(model) = &self.model {
            let unknown: Vec<&str> = model
                .feature_names
                .iter()
                .map(String::as_str)
                .filter(|c| !FEATURE_COLUMNS.contains(c))
                .collect();
            if !unknown.is_empty() {
                tracing::warn!(
                    "Model expects columns the service cannot provide: {:?}; predictions will fail",
                    unknown
                );
            }
        }
    }
}

fn load_model(path: &Path) -> Option<StackingRegressor> {
    if !path.exists() {
        tracing::warn!("Model file not found at {}", path.display());
        return None;
    }

    match ModelReader::read_from_file(path) {
        Ok(model) => {
            tracing::info!(
                "Model loaded from {} ({} base estimators, {} features)",
                path.display(),
                model.estimators.len(),
                model.feature_names.len()
            );
            Some(model)
        }
        Err(e) => {
            tracing::error!("Failed to load model from {}: {e}", path.display());
            None
        }
    }
}

fn load_history(path: &Path) -> (Option<HistoricalSeries>, Option<HistorySource>) {
    if !path.exists() {
        tracing::warn!(
            "Historical data not found at {}. Using fallback series.",
            path.display()
        );
        return (Some(HistoricalSeries::fallback()), Some(HistorySource::Fallback));
    }

    match HistoricalSeries::from_csv_path(path) {
        Ok(series) => {
            tracing::info!(
                "Historical data loaded from {} ({} days)",
                path.display(),
                series.len()
            );
            (Some(series), Some(HistorySource::File))
        }
        Err(e) => {
            tracing::error!("Failed to load historical data from {}: {e}", path.display());
            (None, None)
        }
    }
}

fn load_metadata(path: &Path) -> Option<ModelMetadata> {
    if !path.exists() {
        tracing::warn!("Metadata not found at {}", path.display());
        return None;
    }

    match ModelMetadata::from_json_path(path) {
        Ok(meta) => {
            tracing::info!("Metadata loaded from {}", path.display());
            Some(meta)
        }
        Err(e) => {
            tracing::error!("Failed to load metadata from {}: {e}", path.display());
            None
        }
    }
}
