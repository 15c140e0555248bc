//! Weather Forecast: core library for next-day global temperature inference.

pub mod features;
pub mod history;
pub mod metadata;
pub mod model;
pub mod storage;
pub mod types;

pub use features::{parse_target_date, AtmosphericMeans, FeatureRow};
pub use history::{HistoricalSeries, HistoryPoint, LAG_WINDOW};
pub use metadata::ModelMetadata;
pub use model::{
    Estimator, GradientBoostedModel, LinearModel, NamedEstimator, RegressionTree, Regressor,
    StackingRegressor, TreeNode,
};
pub use storage::{ModelReader, ModelWriter};
pub use types::*;
