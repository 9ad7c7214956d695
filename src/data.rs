//! Dataset container and CSV loading.

use crate::errors::HistBoostError;
use std::fs;
use std::path::Path;

/// Tokens in a CSV cell that denote a missing value, besides the empty field.
const MISSING_TOKENS: [&str; 3] = ["NA", "N/A", "?"];

/// An immutable row-major feature matrix with an optional label column.
///
/// Missing cells carry `f32::NAN`. The label vector is either empty
/// (inference-only data) or exactly `rows` long.
#[derive(Debug, Clone, Default)]
pub struct DataMatrix {
    rows: usize,
    cols: usize,
    features: Vec<f32>,
    labels: Vec<f32>,
}

impl DataMatrix {
    /// Build a matrix from a row-major feature buffer.
    pub fn new(features: Vec<f32>, labels: Vec<f32>, rows: usize, cols: usize) -> Result<Self, HistBoostError> {
        if features.len() != rows * cols {
            return Err(HistBoostError::InconsistentShape(format!(
                "feature buffer holds {} values, expected {} ({} rows x {} cols)",
                features.len(),
                rows * cols,
                rows,
                cols
            )));
        }
        if !labels.is_empty() && labels.len() != rows {
            return Err(HistBoostError::InconsistentShape(format!(
                "label count {} does not match row count {}",
                labels.len(),
                rows
            )));
        }
        Ok(DataMatrix {
            rows,
            cols,
            features,
            labels,
        })
    }

    /// Load a matrix from a CSV file with a header row.
    ///
    /// * `path` - File to read.
    /// * `label_column` - 0-based index of the label column, or -1 for none.
    pub fn from_csv<P: AsRef<Path>>(path: P, label_column: i64) -> Result<Self, HistBoostError> {
        let file = path.as_ref().display().to_string();
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| HistBoostError::IoError(file.clone(), e.to_string()))?;

        let mut lines = content.lines();
        let header = lines
            .next()
            .ok_or_else(|| HistBoostError::InconsistentShape(format!("{} has no header row", file)))?;
        let n_fields = header.split(',').count();
        if label_column >= n_fields as i64 {
            return Err(HistBoostError::invalid_parameter(
                "label_column",
                &format!("an index below the column count {}", n_fields),
                label_column,
            ));
        }
        let cols = if label_column >= 0 { n_fields - 1 } else { n_fields };

        let mut features: Vec<f32> = Vec::new();
        let mut labels: Vec<f32> = Vec::new();
        let mut rows = 0;

        for (line_idx, line) in lines.enumerate() {
            if line.is_empty() {
                continue;
            }
            let row = line_idx + 1;
            let mut fields = 0;
            for (column, cell) in line.split(',').enumerate() {
                let cell = cell.trim();
                let value = if cell.is_empty() || MISSING_TOKENS.contains(&cell) {
                    f32::NAN
                } else {
                    cell.parse::<f32>().map_err(|_| HistBoostError::ParseError {
                        file: file.clone(),
                        row,
                        column,
                        value: cell.to_string(),
                    })?
                };
                if column as i64 == label_column {
                    labels.push(value);
                } else {
                    features.push(value);
                }
                fields += 1;
            }
            if fields != n_fields {
                return Err(HistBoostError::InconsistentShape(format!(
                    "{} row {} has {} columns, expected {}",
                    file, row, fields, n_fields
                )));
            }
            rows += 1;
        }

        if label_column >= 0 && labels.len() != rows {
            return Err(HistBoostError::InconsistentShape(format!(
                "{} has {} labels for {} rows",
                file,
                labels.len(),
                rows
            )));
        }

        DataMatrix::new(features, labels, rows, cols)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// A single cell.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.features[row * self.cols + col]
    }

    /// A whole row; contiguous because the storage is row-major.
    #[inline]
    pub fn get_row(&self, row: usize) -> &[f32] {
        &self.features[row * self.cols..(row + 1) * self.cols]
    }

    /// Copy out one column.
    pub fn get_col(&self, col: usize) -> Vec<f32> {
        (0..self.rows).map(|row| self.get(row, col)).collect()
    }

    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    pub fn has_labels(&self) -> bool {
        !self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_new_shape_checks() {
        assert!(DataMatrix::new(vec![1.0, 2.0, 3.0, 4.0], vec![], 2, 2).is_ok());
        assert!(matches!(
            DataMatrix::new(vec![1.0, 2.0, 3.0], vec![], 2, 2),
            Err(HistBoostError::InconsistentShape(_))
        ));
        assert!(matches!(
            DataMatrix::new(vec![1.0, 2.0, 3.0, 4.0], vec![1.0], 2, 2),
            Err(HistBoostError::InconsistentShape(_))
        ));
    }

    #[test]
    fn test_from_csv_with_label() {
        let file = write_csv("a,b,y\n1,2,0\n3,,1\nNA,4,0\n");
        let data = DataMatrix::from_csv(file.path(), 2).unwrap();
        assert_eq!(data.n_rows(), 3);
        assert_eq!(data.n_cols(), 2);
        assert_eq!(data.labels(), &[0.0, 1.0, 0.0]);
        assert_eq!(data.get(0, 0), 1.0);
        assert!(data.get(1, 1).is_nan());
        assert!(data.get(2, 0).is_nan());
    }

    #[test]
    fn test_from_csv_without_label() {
        let file = write_csv("a,b\n1,2\n?,N/A\n");
        let data = DataMatrix::from_csv(file.path(), -1).unwrap();
        assert_eq!(data.n_rows(), 2);
        assert_eq!(data.n_cols(), 2);
        assert!(!data.has_labels());
        assert!(data.get(1, 0).is_nan());
        assert!(data.get(1, 1).is_nan());
    }

    #[test]
    fn test_from_csv_parse_error_location() {
        let file = write_csv("a,b\n1,2\n3,oops\n");
        match DataMatrix::from_csv(file.path(), -1) {
            Err(HistBoostError::ParseError { row, column, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, 1);
                assert_eq!(value, "oops");
            }
            other => panic!("expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_from_csv_ragged_rows() {
        let file = write_csv("a,b\n1,2\n3\n");
        assert!(matches!(
            DataMatrix::from_csv(file.path(), -1),
            Err(HistBoostError::InconsistentShape(_))
        ));
    }

    #[test]
    fn test_from_csv_missing_file() {
        assert!(matches!(
            DataMatrix::from_csv("definitely/not/here.csv", -1),
            Err(HistBoostError::IoError(_, _))
        ));
    }
}
