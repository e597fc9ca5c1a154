use std::fmt;

/// A matrix (or batch of matrices) shape, wrapping a vector of dimension sizes.
///
/// The last two axes are the matrix rows and columns; any leading axes are
/// batch axes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Computes row-major contiguous strides for this shape.
    ///
    /// For a shape [d0, d1, d2], the strides are [d1*d2, d2, 1]. Empty axes
    /// count as size 1, so a zero-width matrix still has a valid leading
    /// dimension.
    pub fn strides(&self) -> Vec<usize> {
        if self.dims.is_empty() {
            return vec![];
        }
        let mut strides = vec![0usize; self.dims.len()];
        strides[self.dims.len() - 1] = 1;
        for i in (0..self.dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1].max(1);
        }
        strides
    }

    /// Computes strides where each matrix (last two axes) is stored
    /// column-major and the batch axes are packed row-major on top.
    ///
    /// For a shape [b, r, c], the strides are [r*c, 1, r].
    /// Shapes with fewer than two axes fall back to [`Shape::strides`].
    pub fn column_major_strides(&self) -> Vec<usize> {
        let n = self.dims.len();
        if n < 2 {
            return self.strides();
        }
        let rows = self.dims[n - 2];
        let mut strides = vec![0usize; n];
        strides[n - 2] = 1;
        strides[n - 1] = rows.max(1);
        let mut block = rows.max(1) * self.dims[n - 1].max(1);
        for i in (0..n - 2).rev() {
            strides[i] = block;
            block *= self.dims[i].max(1);
        }
        strides
    }

    /// Checks if the given strides correspond to a contiguous (row-major) layout
    /// for this shape.
    pub fn is_contiguous(&self, strides: &[usize]) -> bool {
        if strides.len() != self.dims.len() {
            return false;
        }
        let expected = self.strides();
        strides == expected.as_slice()
    }

    /// Returns this shape with the last two axes swapped.
    pub fn transposed(&self) -> Shape {
        let mut dims = self.dims.clone();
        let n = dims.len();
        if n >= 2 {
            dims.swap(n - 2, n - 1);
        }
        Shape { dims }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}
