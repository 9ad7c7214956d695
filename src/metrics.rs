//! Evaluation metrics.
//!
//! All metrics take the label vector and the raw ensemble scores; logloss
//! applies the sigmoid internally and AUC is rank-based, so the caller
//! never needs to transform predictions before evaluating.

use crate::errors::HistBoostError;
use crate::utils::sigmoid;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type MetricFn = fn(&[f32], &[f32]) -> f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "rmse")]
    RootMeanSquaredError,
    #[serde(rename = "mae")]
    MeanAbsoluteError,
    #[serde(rename = "logloss")]
    LogLoss,
    #[serde(rename = "auc")]
    AUC,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::RootMeanSquaredError => "rmse",
            Metric::MeanAbsoluteError => "mae",
            Metric::LogLoss => "logloss",
            Metric::AUC => "auc",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = HistBoostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rmse" => Ok(Metric::RootMeanSquaredError),
            "mae" => Ok(Metric::MeanAbsoluteError),
            "logloss" => Ok(Metric::LogLoss),
            "auc" => Ok(Metric::AUC),
            _ => Err(HistBoostError::invalid_parameter(
                "metric",
                "one of rmse, mae, logloss, auc",
                s,
            )),
        }
    }
}

pub fn metric_callable(metric: Metric) -> MetricFn {
    match metric {
        Metric::RootMeanSquaredError => root_mean_squared_error,
        Metric::MeanAbsoluteError => mean_absolute_error,
        Metric::LogLoss => log_loss,
        Metric::AUC => roc_auc_score,
    }
}

pub fn root_mean_squared_error(y: &[f32], yhat: &[f32]) -> f32 {
    let sum: f32 = y.iter().zip(yhat).map(|(y_, yhat_)| (y_ - yhat_) * (y_ - yhat_)).sum();
    (sum / y.len() as f32).sqrt()
}

pub fn mean_absolute_error(y: &[f32], yhat: &[f32]) -> f32 {
    let sum: f32 = y.iter().zip(yhat).map(|(y_, yhat_)| (y_ - yhat_).abs()).sum();
    sum / y.len() as f32
}

/// Negative log likelihood of the labels under the sigmoid of the raw
/// scores, clamped away from 0 and 1.
pub fn log_loss(y: &[f32], yhat: &[f32]) -> f32 {
    let sum: f32 = y
        .iter()
        .zip(yhat)
        .map(|(y_, yhat_)| {
            let p = sigmoid(*yhat_).clamp(1e-7, 1.0 - 1e-7);
            -(y_ * p.ln() + (1.0 - y_) * (1.0 - p).ln())
        })
        .sum();
    sum / y.len() as f32
}

fn trapezoid_area(x0: f32, x1: f32, y0: f32, y1: f32) -> f32 {
    (x0 - x1).abs() * (y0 + y1) * 0.5
}

/// Area under the ROC curve via the trapezoid rule over the score-sorted
/// rows. Returns 0 when either class is absent.
pub fn roc_auc_score(y: &[f32], yhat: &[f32]) -> f32 {
    let mut indices = (0..y.len()).collect::<Vec<_>>();
    indices.sort_unstable_by(|&a, &b| yhat[b].total_cmp(&yhat[a]));

    let mut auc = 0.0_f32;
    let mut label = y[indices[0]];
    let mut fp = 1.0 - label;
    let mut tp = label;
    let mut tp_prev = 0.0_f32;
    let mut fp_prev = 0.0_f32;

    for i in 1..indices.len() {
        if yhat[indices[i]] != yhat[indices[i - 1]] {
            auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
            tp_prev = tp;
            fp_prev = fp;
        }
        label = y[indices[i]];
        fp += 1.0 - label;
        tp += label;
    }

    auc += trapezoid_area(fp_prev, fp, tp_prev, tp);
    if fp <= 0.0 || tp <= 0.0 {
        return 0.0;
    }
    auc / (tp * fp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::precision_round;

    #[test]
    fn test_metric_parsing() {
        assert_eq!("rmse".parse::<Metric>().unwrap(), Metric::RootMeanSquaredError);
        assert_eq!("mae".parse::<Metric>().unwrap(), Metric::MeanAbsoluteError);
        assert_eq!("logloss".parse::<Metric>().unwrap(), Metric::LogLoss);
        assert_eq!("auc".parse::<Metric>().unwrap(), Metric::AUC);
        assert!("gini".parse::<Metric>().is_err());
    }

    #[test]
    fn test_root_mean_squared_error() {
        let y = vec![1.0, 3.0, 4.0, 5.0];
        let yhat = vec![3.0, 2.0, 3.0, 4.0];
        // Squared errors: 4, 1, 1, 1 -> mean 7/4.
        assert_eq!(
            precision_round(root_mean_squared_error(&y, &yhat) as f64, 6),
            precision_round((7.0f64 / 4.0).sqrt(), 6)
        );
    }

    #[test]
    fn test_mean_absolute_error() {
        let y = vec![1.0, 3.0, 4.0];
        let yhat = vec![3.0, 2.0, 3.0];
        assert_eq!(precision_round(mean_absolute_error(&y, &yhat) as f64, 6), precision_round(4.0 / 3.0, 6));
    }

    #[test]
    fn test_log_loss_at_zero_scores() {
        // Raw score 0 is probability one half for every row.
        let y = vec![1.0, 0.0, 1.0];
        let yhat = vec![0.0, 0.0, 0.0];
        assert_eq!(precision_round(log_loss(&y, &yhat) as f64, 6), precision_round((2.0f64).ln(), 6));
    }

    #[test]
    fn test_auc_perfect_and_reversed_ranking() {
        let y = vec![0.0, 0.0, 1.0, 1.0];
        assert_eq!(roc_auc_score(&y, &[0.1, 0.2, 0.8, 0.9]), 1.0);
        assert_eq!(roc_auc_score(&y, &[0.9, 0.8, 0.2, 0.1]), 0.0);
    }

    #[test]
    fn test_auc_with_ties() {
        let y = vec![0.0, 1.0];
        // Identical scores give one trapezoid covering half the square.
        assert_eq!(roc_auc_score(&y, &[0.5, 0.5]), 0.5);
    }

    #[test]
    fn test_auc_single_class_is_zero() {
        assert_eq!(roc_auc_score(&[1.0, 1.0], &[0.3, 0.7]), 0.0);
    }
}
