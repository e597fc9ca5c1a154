use crate::element::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::Storage;

/// A dense matrix (or batch of matrices) over shared strided storage.
///
/// Strides are in elements. The last two axes are rows and columns. Cloning
/// a `DenseMatrix` produces another view of the same buffer.
#[derive(Debug, Clone)]
pub struct DenseMatrix<T: Element> {
    storage: Storage<T>,
    shape: Shape,
    strides: Vec<usize>,
    offset: usize,
}

impl<T: Element> DenseMatrix<T> {
    /// Create a row-major contiguous matrix from data in row-major order.
    pub fn from_vec(data: Vec<T>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        let strides = shape.strides();
        Self::from_parts(Storage::from_vec(data), shape, strides, 0)
    }

    /// Create a matrix whose data is given column-major per matrix, with
    /// batches packed one after another.
    pub fn from_column_major(data: Vec<T>, shape: Shape) -> Result<Self> {
        check_len(data.len(), &shape)?;
        let strides = shape.column_major_strides();
        Self::from_parts(Storage::from_vec(data), shape, strides, 0)
    }

    /// Zero-filled row-major matrix.
    pub fn zeros(shape: Shape) -> Result<Self> {
        let strides = shape.strides();
        Self::from_parts(Storage::zeros(shape.numel()), shape, strides, 0)
    }

    /// Zero-filled column-major matrix.
    pub fn zeros_column_major(shape: Shape) -> Result<Self> {
        let strides = shape.column_major_strides();
        Self::from_parts(Storage::zeros(shape.numel()), shape, strides, 0)
    }

    /// Build a view over existing storage with explicit strides and offset.
    ///
    /// # Errors
    /// Fails if the shape has fewer than two axes, the stride rank differs
    /// from the shape rank, or the view reaches past the end of the storage.
    pub fn from_parts(
        storage: Storage<T>,
        shape: Shape,
        strides: Vec<usize>,
        offset: usize,
    ) -> Result<Self> {
        if shape.ndim() < 2 {
            return Err(TensorError::NotAMatrix(shape.ndim()));
        }
        if strides.len() != shape.ndim() {
            return Err(TensorError::StrideRank {
                strides: strides.len(),
                dims: shape.ndim(),
            });
        }
        if shape.numel() > 0 {
            let max_index = offset
                + shape
                    .dims()
                    .iter()
                    .zip(&strides)
                    .map(|(d, s)| (d - 1) * s)
                    .sum::<usize>();
            let len = storage.len()?;
            if max_index >= len {
                return Err(TensorError::OutOfBounds {
                    strides,
                    offset,
                    max_index,
                    len,
                });
            }
        }
        Ok(DenseMatrix {
            storage,
            shape,
            strides,
            offset,
        })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Number of rows (second-to-last axis).
    pub fn rows(&self) -> usize {
        self.shape.dim(self.ndim() - 2)
    }

    /// Number of columns (last axis).
    pub fn cols(&self) -> usize {
        self.shape.dim(self.ndim() - 1)
    }

    /// Innermost-stride test: the last axis has unit stride.
    pub fn is_row_major(&self) -> bool {
        self.strides[self.ndim() - 1] == 1
    }

    /// The second-to-last axis has unit stride.
    pub fn is_column_major(&self) -> bool {
        self.strides[self.ndim() - 2] == 1
    }

    /// Row-major with a leading dimension of at least `max(1, cols)` and
    /// packed batch axes, i.e. directly consumable as a row-major BLAS operand.
    pub fn is_blas_compatible_row_major(&self) -> bool {
        self.row_major_ld().is_some()
    }

    /// Column-major counterpart of [`is_blas_compatible_row_major`](Self::is_blas_compatible_row_major).
    pub fn is_blas_compatible_column_major(&self) -> bool {
        self.column_major_ld().is_some()
    }

    /// Leading dimension when read as a row-major BLAS operand: unit stride
    /// across columns and a row stride of at least `max(1, cols)`.
    pub fn row_major_ld(&self) -> Option<usize> {
        let n = self.ndim();
        let ld = self.strides[n - 2];
        let ok = self.strides[n - 1] == 1
            && ld >= self.cols().max(1)
            && self.batches_packed(ld * self.rows());
        ok.then_some(ld)
    }

    /// Leading dimension when read as a column-major BLAS operand.
    pub fn column_major_ld(&self) -> Option<usize> {
        let n = self.ndim();
        let ld = self.strides[n - 1];
        let ok = self.strides[n - 2] == 1
            && ld >= self.rows().max(1)
            && self.batches_packed(ld * self.cols());
        ok.then_some(ld)
    }

    fn batches_packed(&self, matrix_span: usize) -> bool {
        let n = self.ndim();
        if n == 2 {
            return true;
        }
        if self.shape.dim(n - 3) > 1 && self.strides[n - 3] < matrix_span.max(1) {
            return false;
        }
        (0..n - 3).all(|i| {
            self.shape.dim(i) == 1
                || self.strides[i] == self.strides[i + 1] * self.shape.dim(i + 1).max(1)
        })
    }

    /// Zero-copy view with the last two axes swapped.
    pub fn transpose(&self) -> DenseMatrix<T> {
        let n = self.ndim();
        let mut strides = self.strides.clone();
        strides.swap(n - 2, n - 1);
        DenseMatrix {
            storage: self.storage.clone(),
            shape: self.shape.transposed(),
            strides,
            offset: self.offset,
        }
    }

    /// Storage positions of every element, in logical row-major order.
    pub fn physical_offsets(&self) -> Vec<usize> {
        let numel = self.shape.numel();
        let mut out = Vec::with_capacity(numel);
        if numel == 0 {
            return out;
        }
        let dims = self.shape.dims();
        let mut index = vec![0usize; dims.len()];
        let mut pos = self.offset;
        for _ in 0..numel {
            out.push(pos);
            for axis in (0..dims.len()).rev() {
                index[axis] += 1;
                pos += self.strides[axis];
                if index[axis] < dims[axis] {
                    break;
                }
                pos -= self.strides[axis] * dims[axis];
                index[axis] = 0;
            }
        }
        out
    }

    /// Logical values in row-major order.
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let data = self.storage.read()?;
        Ok(self.physical_offsets().into_iter().map(|p| data[p]).collect())
    }

    /// Fresh row-major contiguous copy with its own buffer.
    pub fn contiguous(&self) -> Result<DenseMatrix<T>> {
        DenseMatrix::from_vec(self.to_vec()?, self.shape.clone())
    }

    /// Fresh column-major copy with its own buffer.
    pub fn contiguous_column_major(&self) -> Result<DenseMatrix<T>> {
        let out = DenseMatrix::zeros_column_major(self.shape.clone())?;
        out.copy_from(self)?;
        Ok(out)
    }

    /// Copy the logical contents of `src` into this view.
    ///
    /// Source values are gathered before the destination is locked, so the
    /// two views may share storage.
    pub fn copy_from(&self, src: &DenseMatrix<T>) -> Result<()> {
        if src.shape != self.shape {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.dims().to_vec(),
                got: src.shape.dims().to_vec(),
            });
        }
        let values = src.to_vec()?;
        let mut data = self.storage.write()?;
        for (p, v) in self.physical_offsets().into_iter().zip(values) {
            data[p] = v;
        }
        Ok(())
    }

    /// True if both views address exactly the same elements of the same buffer.
    pub fn is_same(&self, other: &DenseMatrix<T>) -> bool {
        self.storage.same_buffer(&other.storage)
            && self.shape == other.shape
            && self.strides == other.strides
            && self.offset == other.offset
    }
}

fn check_len(len: usize, shape: &Shape) -> Result<()> {
    if len != shape.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: shape.dims().to_vec(),
            got: vec![len],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(data: Vec<f32>, dims: &[usize]) -> DenseMatrix<f32> {
        DenseMatrix::from_vec(data, Shape::from_slice(dims)).unwrap()
    }

    #[test]
    fn test_row_major_layout() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(a.strides(), &[3, 1]);
        assert!(a.is_row_major());
        assert!(!a.is_column_major());
        assert!(a.is_blas_compatible_row_major());
        assert!(!a.is_blas_compatible_column_major());
        assert_eq!(a.row_major_ld(), Some(3));
        assert_eq!(a.column_major_ld(), None);
    }

    #[test]
    fn test_column_major_layout() {
        // [[1, 2, 3], [4, 5, 6]] stored column by column
        let a = DenseMatrix::from_column_major(
            vec![1.0f32, 4.0, 2.0, 5.0, 3.0, 6.0],
            Shape::new(vec![2, 3]),
        )
        .unwrap();
        assert_eq!(a.strides(), &[1, 2]);
        assert!(!a.is_row_major());
        assert!(a.is_blas_compatible_column_major());
        assert_eq!(a.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_transpose_is_a_view() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let t = a.transpose();
        assert_eq!(t.shape().dims(), &[3, 2]);
        assert!(t.is_blas_compatible_column_major());
        assert!(t.storage().same_buffer(a.storage()));
        assert_eq!(t.to_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_neither_layout() {
        let storage = Storage::from_vec((0..8).map(|v| v as f32).collect());
        let a = DenseMatrix::from_parts(storage, Shape::new(vec![2, 2]), vec![2, 4], 0).unwrap();
        assert!(!a.is_row_major());
        assert!(!a.is_column_major());
        assert_eq!(a.row_major_ld(), None);
        assert_eq!(a.column_major_ld(), None);
        assert_eq!(a.to_vec().unwrap(), vec![0.0, 4.0, 2.0, 6.0]);
    }

    #[test]
    fn test_padded_leading_dimension() {
        let storage = Storage::from_vec(vec![1.0f32; 8]);
        let a = DenseMatrix::from_parts(storage, Shape::new(vec![2, 3]), vec![4, 1], 0).unwrap();
        assert!(a.is_blas_compatible_row_major());
        assert_eq!(a.row_major_ld(), Some(4));
    }

    #[test]
    fn test_single_row_needs_unit_fast_stride() {
        // A 1x3 matrix allocated column-major has strides [1, 1]: its row
        // stride is shorter than a row, so it is only column-major usable.
        let a = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![1, 3])).unwrap();
        assert!(a.is_row_major());
        assert_eq!(a.row_major_ld(), None);
        assert_eq!(a.column_major_ld(), Some(1));

        let v = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![3, 1])).unwrap();
        assert!(!v.is_row_major());
        assert_eq!(v.column_major_ld(), Some(3));
        assert_eq!(v.row_major_ld(), None);
    }

    #[test]
    fn test_single_column_with_non_unit_strides() {
        let storage = Storage::from_vec(vec![0.0f32; 8]);
        let a = DenseMatrix::from_parts(storage, Shape::new(vec![3, 1]), vec![2, 5], 0).unwrap();
        assert!(!a.is_blas_compatible_row_major());
        assert!(!a.is_blas_compatible_column_major());
        assert!(!a.transpose().is_blas_compatible_row_major());
        assert!(!a.transpose().is_blas_compatible_column_major());
    }

    #[test]
    fn test_zero_width_is_compatible() {
        let a = DenseMatrix::<f32>::zeros(Shape::new(vec![3, 0])).unwrap();
        assert_eq!(a.row_major_ld(), Some(1));
        let b = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![0, 2])).unwrap();
        assert_eq!(b.column_major_ld(), Some(1));
        assert!(a.to_vec().unwrap().is_empty());
    }

    #[test]
    fn test_batched_compatibility() {
        let packed = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 3, 4])).unwrap();
        assert!(packed.is_blas_compatible_row_major());
        let col = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![2, 3, 4])).unwrap();
        assert!(col.is_blas_compatible_column_major());

        // Batch stride smaller than one matrix: batches overlap.
        let storage = Storage::from_vec(vec![0.0f32; 24]);
        let overlapping =
            DenseMatrix::from_parts(storage, Shape::new(vec![2, 3, 4]), vec![4, 4, 1], 0).unwrap();
        assert!(!overlapping.is_blas_compatible_row_major());
    }

    #[test]
    fn test_from_parts_out_of_bounds() {
        let storage = Storage::from_vec(vec![0.0f32; 4]);
        let err = DenseMatrix::from_parts(storage, Shape::new(vec![2, 2]), vec![2, 2], 0);
        assert!(matches!(err, Err(TensorError::OutOfBounds { .. })));
    }

    #[test]
    fn test_from_parts_rank_checks() {
        let storage = Storage::from_vec(vec![0.0f32; 4]);
        assert!(matches!(
            DenseMatrix::from_parts(storage.clone(), Shape::new(vec![4]), vec![1], 0),
            Err(TensorError::NotAMatrix(1))
        ));
        assert!(matches!(
            DenseMatrix::from_parts(storage, Shape::new(vec![2, 2]), vec![1], 0),
            Err(TensorError::StrideRank { .. })
        ));
    }

    #[test]
    fn test_contiguous_copies() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let t = a.transpose();
        let c = t.contiguous().unwrap();
        assert!(!c.storage().same_buffer(a.storage()));
        assert!(c.shape().is_contiguous(c.strides()));
        assert_eq!(c.to_vec().unwrap(), vec![1.0, 3.0, 2.0, 4.0]);

        let cm = a.contiguous_column_major().unwrap();
        assert_eq!(cm.strides(), &[1, 2]);
        assert_eq!(cm.storage().read().unwrap().as_slice(), &[1.0, 3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_copy_from_strided_destination() {
        let storage = Storage::from_vec(vec![0.0f32; 8]);
        let dst = DenseMatrix::from_parts(storage, Shape::new(vec![2, 2]), vec![2, 4], 0).unwrap();
        dst.copy_from(&m(vec![1.0, 2.0, 3.0, 4.0], &[2, 2])).unwrap();
        assert_eq!(dst.to_vec().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(
            dst.storage().read().unwrap().as_slice(),
            &[1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 4.0, 0.0]
        );
    }

    #[test]
    fn test_copy_from_shape_mismatch() {
        let dst = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 2])).unwrap();
        let src = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 3])).unwrap();
        assert!(dst.copy_from(&src).is_err());
    }

    #[test]
    fn test_is_same() {
        let a = m(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]);
        let alias = a.clone();
        assert!(a.is_same(&alias));
        assert!(!a.is_same(&a.transpose()));
        assert!(!a.is_same(&a.contiguous().unwrap()));
    }

    #[test]
    fn test_from_vec_len_mismatch() {
        assert!(DenseMatrix::from_vec(vec![1.0f32, 2.0], Shape::new(vec![3, 1])).is_err());
    }
}
