//! Single regression tree: histogram-driven construction and traversal.

use crate::binning::BinnedMatrix;
use crate::config::BoosterConfig;
use crate::data::DataMatrix;
use crate::histogram::NodeHistogram;
use crate::node::TreeNode;
use crate::splitter::{SplitInfo, Splitter};
use crate::utils::weight;
use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

/// A fitted tree as a flat node array; node 0 is the root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

/// Everything a node build step needs to see, bundled so the recursion
/// signature stays readable.
struct BuildContext<'a> {
    data: &'a DataMatrix,
    binned: &'a BinnedMatrix,
    grad: &'a [f32],
    hess: &'a [f32],
    config: &'a BoosterConfig,
    splitter: Splitter,
    pool: &'a ThreadPool,
}

impl Tree {
    pub fn new() -> Self {
        Tree { nodes: Vec::new() }
    }

    /// Grow the tree on the given row set.
    ///
    /// * `data` - Raw matrix, used for partitioning on raw values.
    /// * `binned` - Binned companion of `data`.
    /// * `grad` / `hess` - Current per-row derivatives.
    /// * `rows` - Root row set (the sampled rows for this round).
    pub fn fit(
        &mut self,
        data: &DataMatrix,
        binned: &BinnedMatrix,
        grad: &[f32],
        hess: &[f32],
        rows: Vec<u32>,
        config: &BoosterConfig,
        pool: &ThreadPool,
    ) {
        self.nodes.clear();
        let ctx = BuildContext {
            data,
            binned,
            grad,
            hess,
            config,
            splitter: Splitter::new(config.min_child_weight, config.reg_lambda),
            pool,
        };
        self.build_node(&ctx, rows, 0);
    }

    /// Recursive pre-order construction. Emits a placeholder for an
    /// internal node, builds both subtrees, then patches the record, so
    /// child indices are always greater than the parent's.
    fn build_node(&mut self, ctx: &BuildContext, rows: Vec<u32>, depth: usize) -> usize {
        let mut gradient_sum = 0.0_f32;
        let mut hessian_sum = 0.0_f32;
        for &row in &rows {
            gradient_sum += ctx.grad[row as usize];
            hessian_sum += ctx.hess[row as usize];
        }

        if depth >= ctx.config.max_depth
            || rows.len() <= ctx.config.min_data_in_leaf
            || hessian_sum < ctx.config.min_child_weight
        {
            return self.push_leaf(gradient_sum, hessian_sum, ctx.config.reg_lambda);
        }

        let mut hist = NodeHistogram::empty(ctx.binned.n_cols(), ctx.config.n_bins as usize);
        hist.update(ctx.binned, &rows, ctx.grad, ctx.hess, ctx.pool);

        let split = match ctx
            .splitter
            .best_split(&hist, ctx.binned, gradient_sum, hessian_sum, ctx.pool)
        {
            Some(split) => split,
            None => return self.push_leaf(gradient_sum, hessian_sum, ctx.config.reg_lambda),
        };

        let (left_rows, right_rows) = partition_rows(ctx.data, &rows, &split);
        if left_rows.is_empty() || right_rows.is_empty() {
            // The binned candidate did not separate the raw values; fall
            // back to a leaf rather than retrying the next-best split.
            return self.push_leaf(gradient_sum, hessian_sum, ctx.config.reg_lambda);
        }

        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::new_leaf(0.0));

        let left_idx = self.build_node(ctx, left_rows, depth + 1);
        let right_idx = self.build_node(ctx, right_rows, depth + 1);

        self.nodes[node_idx] = TreeNode::new_parent(
            split.split_feature,
            split.split_value,
            split.split_gain,
            left_idx,
            right_idx,
        );
        node_idx
    }

    fn push_leaf(&mut self, gradient_sum: f32, hessian_sum: f32, reg_lambda: f32) -> usize {
        // With reg_lambda = 0 a hessian-free leaf would divide by zero;
        // leaf weights must stay finite.
        let w = weight(gradient_sum, hessian_sum, reg_lambda);
        self.nodes.push(TreeNode::new_leaf(if w.is_finite() { w } else { 0.0 }));
        self.nodes.len() - 1
    }

    /// Walk one row from the root to a leaf.
    #[inline]
    pub fn predict_row(&self, row: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.weight_value;
            }
            idx = node.get_child_idx(row[node.split_feature]);
        }
    }

    /// Predict every row of a matrix, in parallel.
    pub fn predict(&self, data: &DataMatrix, pool: &ThreadPool) -> Vec<f32> {
        pool.install(|| {
            (0..data.n_rows())
                .into_par_iter()
                .map(|row| self.predict_row(data.get_row(row)))
                .collect()
        })
    }

    /// Depth of the tree, root at 0. Used by tests and diagnostics.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut stack = vec![(0usize, 0usize)];
        let mut max_depth = 0;
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            if node.is_leaf {
                max_depth = max_depth.max(depth);
            } else {
                stack.push((node.left_child, depth + 1));
                stack.push((node.right_child, depth + 1));
            }
        }
        max_depth
    }
}

/// Partition a row set by the raw feature values: `x <= threshold` goes
/// left, missing and larger values go right. Relative order is preserved
/// on both sides so downstream sums stay reproducible.
fn partition_rows(data: &DataMatrix, rows: &[u32], split: &SplitInfo) -> (Vec<u32>, Vec<u32>) {
    let mut left = Vec::with_capacity(rows.len());
    let mut right = Vec::with_capacity(rows.len());
    for &row in rows {
        let value = data.get(row as usize, split.split_feature);
        if value.is_nan() || value > split.split_value {
            right.push(row);
        } else {
            left.push(row);
        }
    }
    (left, right)
}
