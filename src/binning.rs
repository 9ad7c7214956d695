//! Feature binning.
//!
//! Each feature column is quantised into at most `n_bins` one-byte codes.
//! Columns with fewer unique values than bins keep one bin per value; wide
//! columns get approximate equal-frequency quantile edges. The code
//! `edges.len()` is reserved for missing values.

use crate::data::DataMatrix;
use crate::errors::HistBoostError;

/// Per-feature bin edges.
///
/// `exact` marks columns whose edges are the raw unique values. For those,
/// `get_bin` is a rank lookup (first edge >= v), so `code <= b` is exactly
/// `v <= edges[b]`. Quantile columns keep the upper-bound lookup
/// (first edge > v); values at or above the top edge share the last code
/// with missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct BinInfo {
    pub edges: Vec<f32>,
    pub exact: bool,
}

impl BinInfo {
    /// Compute the edge list for one feature column.
    ///
    /// * `values` - The raw column, missing entries included.
    /// * `n_bins` - Maximum number of codes, missing bin included.
    pub fn from_column(values: &[f32], n_bins: u16) -> Self {
        let mut sorted: Vec<f32> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());
        sorted.dedup();

        let b = n_bins as usize;
        if sorted.len() < b {
            BinInfo {
                edges: sorted,
                exact: true,
            }
        } else {
            let u = sorted.len();
            let edges = (1..b).map(|i| sorted[i * u / b]).collect();
            BinInfo { edges, exact: false }
        }
    }

    /// Map a raw value to its bin code.
    #[inline]
    pub fn get_bin(&self, value: f32) -> u8 {
        if value.is_nan() {
            return self.edges.len() as u8;
        }
        let idx = if self.exact {
            self.edges.partition_point(|e| *e < value)
        } else {
            self.edges.partition_point(|e| *e <= value)
        };
        idx.min(self.edges.len()) as u8
    }

    /// The code reserved for missing values.
    #[inline]
    pub fn missing_bin(&self) -> usize {
        self.edges.len()
    }

    /// Number of codes that can hold non-missing values. Split candidates
    /// must leave at least one of these on the right-hand side.
    #[inline]
    pub fn n_value_bins(&self) -> usize {
        if self.exact {
            self.edges.len()
        } else {
            self.edges.len() + 1
        }
    }
}

/// Row-major matrix of bin codes plus the edges that produced them.
#[derive(Debug, Clone)]
pub struct BinnedMatrix {
    rows: usize,
    cols: usize,
    codes: Vec<u8>,
    pub bins: Vec<BinInfo>,
}

impl BinnedMatrix {
    /// Derive edges from `data` and bin it.
    pub fn create_bins(data: &DataMatrix, n_bins: u16) -> Result<Self, HistBoostError> {
        if data.n_rows() == 0 {
            return Err(HistBoostError::EmptyDataset("rows".to_string()));
        }
        if data.n_cols() == 0 {
            return Err(HistBoostError::EmptyDataset("columns".to_string()));
        }
        let bins: Vec<BinInfo> = (0..data.n_cols())
            .map(|col| BinInfo::from_column(&data.get_col(col), n_bins))
            .collect();
        Ok(Self::project(data, bins))
    }

    /// Bin `data` through edges computed on another matrix.
    pub fn apply_bins(data: &DataMatrix, bins: &[BinInfo]) -> Result<Self, HistBoostError> {
        if bins.len() != data.n_cols() {
            return Err(HistBoostError::InconsistentShape(format!(
                "{} bin tables for {} columns",
                bins.len(),
                data.n_cols()
            )));
        }
        Ok(Self::project(data, bins.to_vec()))
    }

    fn project(data: &DataMatrix, bins: Vec<BinInfo>) -> Self {
        let rows = data.n_rows();
        let cols = data.n_cols();
        let mut codes = vec![0u8; rows * cols];
        for row in 0..rows {
            for (col, bin_info) in bins.iter().enumerate() {
                codes[row * cols + col] = bin_info.get_bin(data.get(row, col));
            }
        }
        BinnedMatrix { rows, cols, codes, bins }
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.codes[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_column() {
        // Five unique values into four bins takes the quantile branch.
        let info = BinInfo::from_column(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert!(!info.exact);
        assert_eq!(info.edges, vec![2.0, 3.0, 4.0]);
        let codes: Vec<u8> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|v| info.get_bin(*v)).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 3]);
        assert_eq!(info.get_bin(f32::NAN), 3);
    }

    #[test]
    fn test_exact_column_with_missing() {
        let info = BinInfo::from_column(&[1.0, f32::NAN, 3.0, f32::NAN, 5.0], 4);
        assert!(info.exact);
        assert_eq!(info.edges, vec![1.0, 3.0, 5.0]);
        let codes: Vec<u8> = [1.0, f32::NAN, 3.0, f32::NAN, 5.0]
            .iter()
            .map(|v| info.get_bin(*v))
            .collect();
        assert_eq!(codes, vec![0, 3, 1, 3, 2]);
    }

    #[test]
    fn test_edges_strictly_increasing() {
        let mut values = Vec::new();
        for i in 0..1000 {
            values.push(((i * 37) % 100) as f32 / 7.0);
        }
        for n_bins in [2u16, 16, 64, 256] {
            let info = BinInfo::from_column(&values, n_bins);
            assert!(info.edges.len() <= n_bins as usize - 1 || info.exact);
            for pair in info.edges.windows(2) {
                assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn test_all_missing_column() {
        let info = BinInfo::from_column(&[f32::NAN, f32::NAN], 16);
        assert!(info.edges.is_empty());
        assert_eq!(info.get_bin(f32::NAN), 0);
        assert_eq!(info.n_value_bins(), 0);
    }

    #[test]
    fn test_create_and_apply_bins() {
        let train = DataMatrix::new(vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0], vec![], 3, 2).unwrap();
        let binned = BinnedMatrix::create_bins(&train, 8).unwrap();
        assert_eq!(binned.get(0, 0), 0);
        assert_eq!(binned.get(2, 1), 2);

        // Projection of new data through the training edges.
        let test = DataMatrix::new(vec![2.5, f32::NAN], vec![], 1, 2).unwrap();
        let projected = BinnedMatrix::apply_bins(&test, &binned.bins).unwrap();
        // 2.5 sits between unique values 2 and 3, rank lookup gives bin 2.
        assert_eq!(projected.get(0, 0), 2);
        assert_eq!(projected.get(0, 1) as usize, binned.bins[1].missing_bin());
    }

    #[test]
    fn test_apply_bins_idempotent() {
        let data = DataMatrix::new(vec![5.0, 1.0, 9.0, 2.0, 7.0, 3.0], vec![], 3, 2).unwrap();
        let binned = BinnedMatrix::create_bins(&data, 4).unwrap();
        let once = BinnedMatrix::apply_bins(&data, &binned.bins).unwrap();
        let twice = BinnedMatrix::apply_bins(&data, &binned.bins).unwrap();
        assert_eq!(once.codes, twice.codes);
        assert_eq!(once.codes, binned.codes);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let no_rows = DataMatrix::new(vec![], vec![], 0, 3).unwrap();
        assert!(matches!(
            BinnedMatrix::create_bins(&no_rows, 4),
            Err(HistBoostError::EmptyDataset(_))
        ));
    }
}
