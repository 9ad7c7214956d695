//! Objective functions.
//!
//! Regression and binary classification differ only in the derivative
//! formulas and the base-score calculation, so the objective is a small
//! capability set selected once at training entry; the round loop then
//! calls it over whole buffers, never per row.

mod log_loss;
mod squared_loss;

pub use log_loss::LogLoss;
pub use squared_loss::SquaredLoss;

use crate::config::Task;
use crate::metrics::Metric;
use std::sync::Arc;

pub trait ObjectiveFunction: Send + Sync {
    /// Base score of the empty ensemble.
    fn initial_value(&self, y: &[f32]) -> f32;

    /// Recompute first and second derivatives in place for the current raw
    /// predictions. Buffers are allocated once and reused across rounds.
    fn gradient(&self, y: &[f32], yhat: &[f32], grad: &mut [f32], hess: &mut [f32]);

    /// Metric to fall back to when the caller did not pick one.
    fn default_metric(&self) -> Metric;
}

impl Task {
    /// Instantiate the objective for this task.
    pub fn objective(&self) -> Arc<dyn ObjectiveFunction> {
        match self {
            Task::Regression => Arc::new(SquaredLoss::default()),
            Task::Binary => Arc::new(LogLoss::default()),
        }
    }
}
