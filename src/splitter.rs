//! Split finding.
//!
//! Given a node's totals and histograms, sweep every feature's bins with a
//! left prefix sum and keep the candidate with the highest regularised
//! gain. Candidates stop before the last value-carrying bin, so the missing
//! bin can never join the left prefix and at least one real bin always
//! stays on the right; missing values therefore follow the right child,
//! which is also the prediction-time routing rule.

use crate::binning::{BinInfo, BinnedMatrix};
use crate::histogram::NodeHistogram;
use crate::utils::gain;
use rayon::prelude::*;
use rayon::ThreadPool;

/// A chosen split.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitInfo {
    pub split_feature: usize,
    pub split_bin: usize,
    /// Raw edge value; prediction sends `x <= split_value` left.
    pub split_value: f32,
    pub split_gain: f32,
    pub left_gradient_sum: f32,
    pub left_hessian_sum: f32,
    pub right_gradient_sum: f32,
    pub right_hessian_sum: f32,
}

/// Split finder parameterised by the regularisation settings.
#[derive(Debug, Clone)]
pub struct Splitter {
    pub min_child_weight: f32,
    pub reg_lambda: f32,
}

impl Splitter {
    pub fn new(min_child_weight: f32, reg_lambda: f32) -> Self {
        Splitter {
            min_child_weight,
            reg_lambda,
        }
    }

    /// Best split across all features, or `None` when no candidate
    /// satisfies the child-weight constraints.
    ///
    /// Features are scanned in parallel; the reduction over the collected
    /// per-feature results runs in feature order with strict-improvement
    /// comparisons, so ties resolve to the smaller feature id and, inside a
    /// feature, to the smaller bin.
    pub fn best_split(
        &self,
        hist: &NodeHistogram,
        data: &BinnedMatrix,
        gradient_sum: f32,
        hessian_sum: f32,
        pool: &ThreadPool,
    ) -> Option<SplitInfo> {
        let candidates: Vec<Option<SplitInfo>> = pool.install(|| {
            (0..data.n_cols())
                .into_par_iter()
                .map(|col| {
                    self.best_split_for_feature(
                        col,
                        hist.grad_col(col),
                        hist.hess_col(col),
                        &data.bins[col],
                        gradient_sum,
                        hessian_sum,
                    )
                })
                .collect()
        });

        let mut best: Option<SplitInfo> = None;
        for candidate in candidates.into_iter().flatten() {
            match &best {
                Some(current) if candidate.split_gain <= current.split_gain => {}
                _ => best = Some(candidate),
            }
        }
        best
    }

    /// Prefix-sum sweep over one feature.
    fn best_split_for_feature(
        &self,
        col: usize,
        grad_hist: &[f32],
        hess_hist: &[f32],
        bin_info: &BinInfo,
        gradient_sum: f32,
        hessian_sum: f32,
    ) -> Option<SplitInfo> {
        let n_value_bins = bin_info.n_value_bins();
        if n_value_bins < 2 {
            return None;
        }
        let parent_gain = gain(gradient_sum, hessian_sum, self.reg_lambda);

        let mut best: Option<SplitInfo> = None;
        let mut left_gradient_sum = 0.0_f32;
        let mut left_hessian_sum = 0.0_f32;

        for bin in 0..(n_value_bins - 1) {
            left_gradient_sum += grad_hist[bin];
            left_hessian_sum += hess_hist[bin];
            let right_gradient_sum = gradient_sum - left_gradient_sum;
            let right_hessian_sum = hessian_sum - left_hessian_sum;

            if left_hessian_sum < self.min_child_weight || right_hessian_sum < self.min_child_weight {
                continue;
            }

            let split_gain = gain(left_gradient_sum, left_hessian_sum, self.reg_lambda)
                + gain(right_gradient_sum, right_hessian_sum, self.reg_lambda)
                - parent_gain;

            let improves = match &best {
                Some(current) => split_gain > current.split_gain,
                None => true,
            };
            if improves {
                best = Some(SplitInfo {
                    split_feature: col,
                    split_bin: bin,
                    split_value: bin_info.edges[bin],
                    split_gain,
                    left_gradient_sum,
                    left_hessian_sum,
                    right_gradient_sum,
                    right_hessian_sum,
                });
            }
        }
        best
    }
}
