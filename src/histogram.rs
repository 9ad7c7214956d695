//! Gradient histogram accumulation.
//!
//! For a node's row set, accumulate per-feature, per-bin sums of gradients
//! and hessians. This is the hottest loop of training; the layout is a flat
//! `n_cols * n_bins` array per statistic so a feature's histogram is one
//! contiguous slice.

use crate::binning::BinnedMatrix;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Per-node histogram matrix: one gradient and one hessian sum per
/// (feature, bin) cell.
#[derive(Debug)]
pub struct NodeHistogram {
    pub grad: Vec<f32>,
    pub hess: Vec<f32>,
    n_bins: usize,
}

impl NodeHistogram {
    /// Allocate an empty histogram for `n_cols` features.
    pub fn empty(n_cols: usize, n_bins: usize) -> Self {
        NodeHistogram {
            grad: vec![0.0; n_cols * n_bins],
            hess: vec![0.0; n_cols * n_bins],
            n_bins,
        }
    }

    /// Gradient sums of one feature.
    #[inline]
    pub fn grad_col(&self, col: usize) -> &[f32] {
        &self.grad[col * self.n_bins..(col + 1) * self.n_bins]
    }

    /// Hessian sums of one feature.
    #[inline]
    pub fn hess_col(&self, col: usize) -> &[f32] {
        &self.hess[col * self.n_bins..(col + 1) * self.n_bins]
    }

    /// Accumulate the histogram over `rows`.
    ///
    /// Features are distributed over the pool; each feature is filled by a
    /// single task visiting rows in index order, so the sums are identical
    /// for every thread count.
    pub fn update(&mut self, data: &BinnedMatrix, rows: &[u32], grad: &[f32], hess: &[f32], pool: &ThreadPool) {
        let n_bins = self.n_bins;
        self.grad.iter_mut().for_each(|g| *g = 0.0);
        self.hess.iter_mut().for_each(|h| *h = 0.0);
        pool.install(|| {
            self.grad
                .par_chunks_mut(n_bins)
                .zip(self.hess.par_chunks_mut(n_bins))
                .enumerate()
                .for_each(|(col, (grad_hist, hess_hist))| {
                    for &row in rows {
                        let row = row as usize;
                        let bin = data.get(row, col) as usize;
                        grad_hist[bin] += grad[row];
                        hess_hist[bin] += hess[row];
                    }
                });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataMatrix;

    fn pool() -> ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn test_histogram_sums() {
        // One feature, values landing in bins 0, 1, 1, 2.
        let data = DataMatrix::new(vec![1.0, 2.0, 2.0, 3.0], vec![], 4, 1).unwrap();
        let binned = BinnedMatrix::create_bins(&data, 8).unwrap();
        let grad = vec![0.5, -1.0, 2.0, 4.0];
        let hess = vec![1.0, 1.0, 1.0, 1.0];

        let mut hist = NodeHistogram::empty(1, 8);
        hist.update(&binned, &[0, 1, 2, 3], &grad, &hess, &pool());

        assert_eq!(hist.grad_col(0)[0], 0.5);
        assert_eq!(hist.grad_col(0)[1], 1.0);
        assert_eq!(hist.grad_col(0)[2], 4.0);
        assert_eq!(hist.hess_col(0)[1], 2.0);
        // Total mass equals the node totals.
        assert_eq!(hist.grad_col(0).iter().sum::<f32>(), 5.5);
        assert_eq!(hist.hess_col(0).iter().sum::<f32>(), 4.0);
    }

    #[test]
    fn test_histogram_respects_row_subset() {
        let data = DataMatrix::new(vec![1.0, 2.0, 2.0, 3.0], vec![], 4, 1).unwrap();
        let binned = BinnedMatrix::create_bins(&data, 8).unwrap();
        let grad = vec![1.0; 4];
        let hess = vec![1.0; 4];

        let mut hist = NodeHistogram::empty(1, 8);
        hist.update(&binned, &[1, 2], &grad, &hess, &pool());
        assert_eq!(hist.grad_col(0)[0], 0.0);
        assert_eq!(hist.grad_col(0)[1], 2.0);
        assert_eq!(hist.hess_col(0).iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn test_missing_rows_land_in_missing_bin() {
        let data = DataMatrix::new(vec![1.0, f32::NAN, 2.0], vec![], 3, 1).unwrap();
        let binned = BinnedMatrix::create_bins(&data, 4).unwrap();
        let missing_bin = binned.bins[0].missing_bin();
        let grad = vec![1.0, 7.0, 1.0];
        let hess = vec![1.0, 1.0, 1.0];

        let mut hist = NodeHistogram::empty(1, 4);
        hist.update(&binned, &[0, 1, 2], &grad, &hess, &pool());
        assert_eq!(hist.grad_col(0)[missing_bin], 7.0);
    }
}
