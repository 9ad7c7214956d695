//! Squared error objective for regression.

use crate::metrics::Metric;
use crate::objective_functions::ObjectiveFunction;
use rayon::prelude::*;

#[derive(Debug, Default, Clone)]
pub struct SquaredLoss {}

impl ObjectiveFunction for SquaredLoss {
    fn initial_value(&self, y: &[f32]) -> f32 {
        y.iter().sum::<f32>() / y.len() as f32
    }

    #[inline]
    fn gradient(&self, y: &[f32], yhat: &[f32], grad: &mut [f32], hess: &mut [f32]) {
        grad.par_iter_mut()
            .zip(hess.par_iter_mut())
            .zip(y.par_iter().zip(yhat.par_iter()))
            .for_each(|((g, h), (y_, yhat_))| {
                *g = yhat_ - y_;
                *h = 1.0;
            });
    }

    fn default_metric(&self) -> Metric {
        Metric::RootMeanSquaredError
    }
}
