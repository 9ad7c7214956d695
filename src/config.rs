//! Training configuration.
//!
//! Holds every recognised hyperparameter, its default, and the range
//! validation that rejects a configuration before any training work starts.

use crate::errors::HistBoostError;
use crate::metrics::Metric;
use crate::utils::{validate_float_parameter, validate_int_parameter};
use serde::{Deserialize, Serialize};

/// The learning task, which selects the objective function and the
/// base-score formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Regression,
    Binary,
}

fn default_task() -> Task {
    Task::Regression
}
fn default_n_rounds() -> usize {
    100
}
fn default_learning_rate() -> f32 {
    0.1
}
fn default_max_depth() -> usize {
    6
}
fn default_min_data_in_leaf() -> usize {
    20
}
fn default_min_child_weight() -> f32 {
    1.0
}
fn default_reg_lambda() -> f32 {
    1.0
}
fn default_n_bins() -> u16 {
    256
}
fn default_subsample() -> f32 {
    1.0
}
fn default_colsample() -> f32 {
    1.0
}
fn default_seed() -> u64 {
    0
}
fn default_n_threads() -> i32 {
    -1
}
fn default_metric() -> Metric {
    Metric::RootMeanSquaredError
}

/// Configuration of the gradient booster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterConfig {
    /// Task type, regression or binary classification.
    #[serde(default = "default_task")]
    pub task: Task,
    /// Number of boosting rounds.
    #[serde(default = "default_n_rounds")]
    pub n_rounds: usize,
    /// Shrinkage applied to every tree's contribution.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Maximum tree depth, the root sits at depth 0.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Minimum number of rows per leaf.
    #[serde(default = "default_min_data_in_leaf")]
    pub min_data_in_leaf: usize,
    /// Minimum hessian sum per child.
    #[serde(default = "default_min_child_weight")]
    pub min_child_weight: f32,
    /// L2 penalty on leaf weights.
    #[serde(default = "default_reg_lambda")]
    pub reg_lambda: f32,
    /// Maximum number of bins per feature, including the missing bin.
    #[serde(default = "default_n_bins")]
    pub n_bins: u16,
    /// Per-round row sampling rate.
    #[serde(default = "default_subsample")]
    pub subsample: f32,
    /// Column sampling rate. Parsed and persisted, not honoured yet.
    #[serde(default = "default_colsample")]
    pub colsample: f32,
    /// Seed for the sampling stream.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker threads, -1 means all available.
    #[serde(default = "default_n_threads")]
    pub n_threads: i32,
    /// Evaluation metric emitted once per round.
    #[serde(default = "default_metric")]
    pub metric: Metric,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        BoosterConfig {
            task: default_task(),
            n_rounds: default_n_rounds(),
            learning_rate: default_learning_rate(),
            max_depth: default_max_depth(),
            min_data_in_leaf: default_min_data_in_leaf(),
            min_child_weight: default_min_child_weight(),
            reg_lambda: default_reg_lambda(),
            n_bins: default_n_bins(),
            subsample: default_subsample(),
            colsample: default_colsample(),
            seed: default_seed(),
            n_threads: default_n_threads(),
            metric: default_metric(),
        }
    }
}

impl BoosterConfig {
    /// Check every option against its documented range.
    pub fn validate(&self) -> Result<(), HistBoostError> {
        if self.n_rounds < 1 {
            return Err(HistBoostError::invalid_parameter(
                "n_rounds",
                "an integer >= 1",
                self.n_rounds,
            ));
        }
        validate_float_parameter(self.learning_rate, 0.0, 1.0, false, "learning_rate")?;
        validate_int_parameter(self.max_depth, 1, 32, "max_depth")?;
        if self.min_data_in_leaf < 1 {
            return Err(HistBoostError::invalid_parameter(
                "min_data_in_leaf",
                "an integer >= 1",
                self.min_data_in_leaf,
            ));
        }
        validate_float_parameter(self.min_child_weight, 0.0, f32::INFINITY, false, "min_child_weight")?;
        validate_float_parameter(self.reg_lambda, 0.0, f32::INFINITY, true, "reg_lambda")?;
        if self.n_bins < 1 || self.n_bins > 256 {
            return Err(HistBoostError::invalid_parameter(
                "n_bins",
                "an integer in [1, 256]",
                self.n_bins,
            ));
        }
        validate_float_parameter(self.subsample, 0.0, 1.0, false, "subsample")?;
        validate_float_parameter(self.colsample, 0.0, 1.0, false, "colsample")?;
        if self.n_threads != -1 && self.n_threads < 1 {
            return Err(HistBoostError::invalid_parameter(
                "n_threads",
                "-1 or a positive integer",
                self.n_threads,
            ));
        }
        Ok(())
    }

    /// Resolve `n_threads` against the machine.
    pub fn resolved_threads(&self) -> usize {
        if self.n_threads == -1 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            self.n_threads as usize
        }
    }
}
