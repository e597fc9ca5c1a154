//! Compressed sparse row matrices.

use crate::dense::DenseMatrix;
use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Width of the integer type used for CSR index arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    I32,
    I64,
}

/// A CSR sparse matrix with 64-bit indices.
///
/// The structure is validated once at construction and never mutated.
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: Element> {
    row_pointers: Vec<i64>,
    column_indices: Vec<i64>,
    values: Vec<T>,
    shape: (usize, usize),
}

/// CSR index arrays narrowed to 32 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrIndices32 {
    pub row_pointers: Vec<i32>,
    pub column_indices: Vec<i32>,
}

impl<T: Element> CsrMatrix<T> {
    /// Create a CSR matrix from its components.
    ///
    /// # Errors
    /// Returns `InvalidCsr` unless:
    /// - `row_pointers.len() == rows + 1`
    /// - `column_indices.len() == values.len()`
    /// - `row_pointers[0] == 0`, non-decreasing, `row_pointers[rows] == nnz`
    /// - every column index lies in `[0, cols)`
    pub fn new(
        row_pointers: Vec<i64>,
        column_indices: Vec<i64>,
        values: Vec<T>,
        shape: (usize, usize),
    ) -> Result<Self> {
        let (rows, cols) = shape;
        let nnz = values.len();

        if row_pointers.len() != rows + 1 {
            return Err(TensorError::InvalidCsr(format!(
                "row_pointers has {} entries, expected rows + 1 = {}",
                row_pointers.len(),
                rows + 1
            )));
        }
        if column_indices.len() != nnz {
            return Err(TensorError::InvalidCsr(format!(
                "column_indices has {} entries but values has {}",
                column_indices.len(),
                nnz
            )));
        }
        if row_pointers[0] != 0 {
            return Err(TensorError::InvalidCsr(format!(
                "row_pointers[0] = {}, expected 0",
                row_pointers[0]
            )));
        }
        if let Some(w) = row_pointers.windows(2).position(|w| w[1] < w[0]) {
            return Err(TensorError::InvalidCsr(format!(
                "row_pointers decreases at row {}",
                w
            )));
        }
        if row_pointers[rows] != nnz as i64 {
            return Err(TensorError::InvalidCsr(format!(
                "row_pointers[{}] = {}, expected nnz = {}",
                rows, row_pointers[rows], nnz
            )));
        }
        if let Some(&c) = column_indices
            .iter()
            .find(|&&c| c < 0 || c as u64 >= cols as u64)
        {
            return Err(TensorError::InvalidCsr(format!(
                "column index {} outside [0, {})",
                c, cols
            )));
        }

        Ok(CsrMatrix {
            row_pointers,
            column_indices,
            values,
            shape,
        })
    }

    /// An all-zero matrix of the given shape.
    pub fn empty(shape: (usize, usize)) -> Self {
        CsrMatrix {
            row_pointers: vec![0; shape.0 + 1],
            column_indices: Vec::new(),
            values: Vec::new(),
            shape,
        }
    }

    pub fn row_pointers(&self) -> &[i64] {
        &self.row_pointers
    }

    pub fn column_indices(&self) -> &[i64] {
        &self.column_indices
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.0
    }

    pub fn cols(&self) -> usize {
        self.shape.1
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(column, value)` pairs stored in `row`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let start = self.row_pointers[row] as usize;
        let end = self.row_pointers[row + 1] as usize;
        self.column_indices[start..end]
            .iter()
            .zip(&self.values[start..end])
            .map(|(&c, &v)| (c as usize, v))
    }

    /// Checked conversion of the index arrays to 32 bits.
    ///
    /// # Errors
    /// Returns `IndexOverflow` if `nnz`, any row pointer or any column index
    /// exceeds `i32::MAX`.
    pub fn narrow_indices(&self) -> Result<CsrIndices32> {
        let narrow = |what: &'static str, v: i64| {
            i32::try_from(v).map_err(|_| TensorError::IndexOverflow { what, value: v })
        };
        narrow("nnz", self.nnz() as i64)?;
        let row_pointers = self
            .row_pointers
            .iter()
            .map(|&p| narrow("row pointer", p))
            .collect::<Result<Vec<_>>>()?;
        let column_indices = self
            .column_indices
            .iter()
            .map(|&c| narrow("column index", c))
            .collect::<Result<Vec<_>>>()?;
        Ok(CsrIndices32 {
            row_pointers,
            column_indices,
        })
    }

    /// Expand to a row-major dense matrix. Duplicate entries are summed.
    pub fn to_dense(&self) -> Result<DenseMatrix<T>> {
        let (rows, cols) = self.shape;
        let mut data = vec![T::zero(); rows * cols];
        for r in 0..rows {
            for (c, v) in self.row(r) {
                data[r * cols + c] = data[r * cols + c] + v;
            }
        }
        DenseMatrix::from_vec(data, Shape::new(vec![rows, cols]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity2() -> CsrMatrix<f32> {
        CsrMatrix::new(vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0], (2, 2)).unwrap()
    }

    #[test]
    fn test_identity() {
        let a = identity2();
        assert_eq!(a.nnz(), 2);
        assert_eq!(a.rows(), 2);
        assert_eq!(a.cols(), 2);
        assert_eq!(a.to_dense().unwrap().to_vec().unwrap(), vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_row_iteration() {
        let a = CsrMatrix::new(vec![0, 2, 2, 3], vec![0, 2, 1], vec![5.0f32, 6.0, 7.0], (3, 3))
            .unwrap();
        assert_eq!(a.row(0).collect::<Vec<_>>(), vec![(0, 5.0), (2, 6.0)]);
        assert_eq!(a.row(1).count(), 0);
        assert_eq!(a.row(2).collect::<Vec<_>>(), vec![(1, 7.0)]);
    }

    #[test]
    fn test_empty() {
        let a = CsrMatrix::<f64>::empty((3, 4));
        assert_eq!(a.nnz(), 0);
        assert_eq!(a.row_pointers(), &[0, 0, 0, 0]);
        assert_eq!(a.to_dense().unwrap().to_vec().unwrap(), vec![0.0; 12]);
    }

    #[test]
    fn test_invalid_row_pointer_length() {
        assert!(CsrMatrix::new(vec![0, 1], vec![0], vec![1.0f32], (2, 2)).is_err());
    }

    #[test]
    fn test_invalid_first_pointer() {
        assert!(CsrMatrix::new(vec![1, 1, 1], vec![0], vec![1.0f32], (2, 2)).is_err());
    }

    #[test]
    fn test_decreasing_row_pointers() {
        let err = CsrMatrix::new(vec![0, 2, 1], vec![0, 1], vec![1.0f32, 1.0], (2, 2));
        assert!(matches!(err, Err(TensorError::InvalidCsr(_))));
    }

    #[test]
    fn test_last_pointer_must_equal_nnz() {
        assert!(CsrMatrix::new(vec![0, 1, 1], vec![0, 1], vec![1.0f32, 1.0], (2, 2)).is_err());
    }

    #[test]
    fn test_column_out_of_range() {
        assert!(CsrMatrix::new(vec![0, 1, 2], vec![0, 2], vec![1.0f32, 1.0], (2, 2)).is_err());
        assert!(CsrMatrix::new(vec![0, 1, 2], vec![0, -1], vec![1.0f32, 1.0], (2, 2)).is_err());
    }

    #[test]
    fn test_values_index_length_mismatch() {
        assert!(CsrMatrix::new(vec![0, 1, 2], vec![0], vec![1.0f32, 1.0], (2, 2)).is_err());
    }

    #[test]
    fn test_narrow_indices() {
        let idx = identity2().narrow_indices().unwrap();
        assert_eq!(idx.row_pointers, vec![0, 1, 2]);
        assert_eq!(idx.column_indices, vec![0, 1]);
    }

    #[test]
    fn test_narrow_indices_overflow() {
        let wide = i32::MAX as i64 + 1;
        let a = CsrMatrix::new(vec![0, 1], vec![wide], vec![1.0f32], (1, wide as usize + 1))
            .unwrap();
        match a.narrow_indices() {
            Err(TensorError::IndexOverflow { what, value }) => {
                assert_eq!(what, "column index");
                assert_eq!(value, wide);
            }
            other => panic!("expected IndexOverflow, got {:?}", other),
        }
    }
}
