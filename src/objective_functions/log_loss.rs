//! Binary logistic objective, fitted in raw score space.

use crate::metrics::Metric;
use crate::objective_functions::ObjectiveFunction;
use crate::utils::sigmoid;
use rayon::prelude::*;

#[derive(Debug, Default, Clone)]
pub struct LogLoss {}

impl ObjectiveFunction for LogLoss {
    /// Log-odds of the label mean, with the mean clamped away from the
    /// extremes so the logit stays finite on constant labels.
    fn initial_value(&self, y: &[f32]) -> f32 {
        let mean = (y.iter().sum::<f32>() / y.len() as f32).clamp(0.01, 0.99);
        (mean / (1.0 - mean)).ln()
    }

    #[inline]
    fn gradient(&self, y: &[f32], yhat: &[f32], grad: &mut [f32], hess: &mut [f32]) {
        grad.par_iter_mut()
            .zip(hess.par_iter_mut())
            .zip(y.par_iter().zip(yhat.par_iter()))
            .for_each(|((g, h), (y_, yhat_))| {
                let p = sigmoid(*yhat_);
                *g = p - y_;
                *h = p * (1.0 - p);
            });
    }

    fn default_metric(&self) -> Metric {
        Metric::LogLoss
    }
}
