//! Stacking ensemble inference.
//!
//! A [`StackingRegressor`] runs every base estimator on the feature row and
//! feeds their outputs, in declaration order, to a final estimator:
//!
//! ```text
//! z = [base_0(x), base_1(x), ..., base_n(x)]        (+ x when passthrough)
//! y = final(z)
//! ```
//!
//! Two estimator families are supported. Linear models compute
//! `intercept + Σ coef[i] · x[i]`; gradient boosted models compute
//! `base_score + Σ leaf(tree, x)` over regression trees stored as flat
//! node arrays rooted at index 0.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{ForecastError, ForecastResult};

/// A regressor mapping one input row to a scalar.
pub trait Regressor {
    /// Predict a single value. `input.len()` must equal the model's input width.
    fn predict(&self, input: &[f64]) -> ForecastResult<f64>;
}

/// Linear model with an intercept (ridge, OLS, and friends).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Regressor for LinearModel {
    fn predict(&self, input: &[f64]) -> ForecastResult<f64> {
        check_width(self.coefficients.len(), input)?;
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(input.iter())
            .map(|(c, x)| c * x)
            .sum();
        Ok(self.intercept + dot)
    }
}

/// A node of a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `left` when `input[feature] < threshold`, else `right`.
    /// NaN inputs follow `default_left`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_true")]
        default_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_true() -> bool {
    true
}

/// A single regression tree. Children always have a larger index than their parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk from the root to a leaf and return its value.
    ///
    /// Terminates because [`RegressionTree::validate`] guarantees child
    /// indices strictly increase along every path.
    pub fn leaf_value(&self, input: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    default_left,
                } => {
                    let x = input[*feature];
                    let go_left = if x.is_nan() {
                        *default_left
                    } else {
                        x < *threshold
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }

    /// Check structural invariants for a tree reading `width` input columns.
    pub fn validate(&self, width: usize) -> ForecastResult<()> {
        if self.nodes.is_empty() {
            return Err(ForecastError::InvalidModel("tree has no nodes".to_string()));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = node
            {
                if *feature >= width {
                    return Err(ForecastError::InvalidModel(format!(
                        "node {idx} splits on feature {feature}, but input width is {width}"
                    )));
                }
                if threshold.is_nan() {
                    return Err(ForecastError::InvalidModel(format!(
                        "node {idx} has a NaN threshold"
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(ForecastError::InvalidModel(format!(
                            "node {idx} has invalid child index {child}"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Gradient boosted tree ensemble (XGBoost-style additive trees).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradientBoostedModel {
    pub base_score: f64,
    /// Number of input columns the trees were grown on.
    pub num_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl Regressor for GradientBoostedModel {
    fn predict(&self, input: &[f64]) -> ForecastResult<f64> {
        check_width(self.num_features, input)?;
        Ok(self.base_score + self.trees.iter().map(|t| t.leaf_value(input)).sum::<f64>())
    }
}

/// One of the supported estimator families.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    Linear(LinearModel),
    GradientBoosted(GradientBoostedModel),
}

impl Estimator {
    /// Number of input columns this estimator consumes.
    pub fn input_width(&self) -> usize {
        match self {
            Estimator::Linear(m) => m.coefficients.len(),
            Estimator::GradientBoosted(m) => m.num_features,
        }
    }

    fn validate(&self, width: usize) -> ForecastResult<()> {
        if self.input_width() != width {
            return Err(ForecastError::InvalidModel(format!(
                "estimator expects {} inputs but is fed {width}",
                self.input_width()
            )));
        }
        if let Estimator::GradientBoosted(m) = self {
            for tree in &m.trees {
                tree.validate(width)?;
            }
        }
        Ok(())
    }
}

impl Regressor for Estimator {
    fn predict(&self, input: &[f64]) -> ForecastResult<f64> {
        match self {
            Estimator::Linear(m) => m.predict(input),
            Estimator::GradientBoosted(m) => m.predict(input),
        }
    }
}

/// An estimator with a display name, e.g. "XGBoost" or "RidgeCV".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedEstimator {
    pub name: String,
    pub estimator: Estimator,
}

/// Two-level stacking ensemble.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StackingRegressor {
    /// Column order the model was fit on.
    pub feature_names: Vec<String>,
    pub estimators: Vec<NamedEstimator>,
    pub final_estimator: NamedEstimator,
    /// Append the raw feature row to the base predictions for the final estimator.
    #[serde(default)]
    pub passthrough: bool,
}

impl StackingRegressor {
    /// Check that every estimator agrees with the widths it will be fed.
    pub fn validate(&self) -> ForecastResult<()> {
        if self.estimators.is_empty() {
            return Err(ForecastError::InvalidModel(
                "stacking ensemble needs at least one base estimator".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in &self.feature_names {
            if !seen.insert(name.as_str()) {
                return Err(ForecastError::InvalidModel(format!(
                    "duplicate feature name '{name}'"
                )));
            }
        }

        let width = self.feature_names.len();
        for named in &self.estimators {
            named
                .estimator
                .validate(width)
                .map_err(|e| prefix_error(&named.name, e))?;
        }
        self.final_estimator
            .estimator
            .validate(self.final_input_width())
            .map_err(|e| prefix_error(&self.final_estimator.name, e))?;

        Ok(())
    }

    /// Number of input columns the final estimator consumes.
    pub fn final_input_width(&self) -> usize {
        let passthrough = if self.passthrough {
            self.feature_names.len()
        } else {
            0
        };
        self.estimators.len() + passthrough
    }

    /// Names of the base estimators, in order.
    pub fn base_names(&self) -> Vec<&str> {
        self.estimators.iter().map(|e| e.name.as_str()).collect()
    }

    /// Human-readable label, e.g. "Ensemble Stacking Regressor (XGBoost + RidgeCV)".
    pub fn description(&self) -> String {
        format!(
            "Ensemble Stacking Regressor ({})",
            self.base_names().join(" + ")
        )
    }
}

impl Regressor for StackingRegressor {
    fn predict(&self, input: &[f64]) -> ForecastResult<f64> {
        check_width(self.feature_names.len(), input)?;

        let mut stacked = Vec::with_capacity(self.final_input_width());
        for named in &self.estimators {
            stacked.push(named.estimator.predict(input)?);
        }
        if self.passthrough {
            stacked.extend_from_slice(input);
        }

        self.final_estimator.estimator.predict(&stacked)
    }
}

fn check_width(expected: usize, input: &[f64]) -> ForecastResult<()> {
    if input.len() != expected {
        return Err(ForecastError::InputWidth {
            expected,
            got: input.len(),
        });
    }
    Ok(())
}

fn prefix_error(name: &str, e: ForecastError) -> ForecastError {
    match e {
        ForecastError::InvalidModel(msg) => ForecastError::InvalidModel(format!("{name}: {msg}")),
        other => other,
    }
}
