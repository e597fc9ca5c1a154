//! Operand descriptors handed to an SpMM primitive.
//!
//! Descriptors own (or share) everything the primitive reads, so they can be
//! moved into work enqueued on a stream.

use spmm_tensor::{CsrMatrix, DenseMatrix, Element, IndexWidth};

use crate::error::{Result, SpmmError};
use crate::layout::DenseLayout;

/// CSR index arrays at the width the primitive will consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparseIndices {
    I32 {
        row_pointers: Vec<i32>,
        column_indices: Vec<i32>,
    },
    I64 {
        row_pointers: Vec<i64>,
        column_indices: Vec<i64>,
    },
}

impl SparseIndices {
    pub fn width(&self) -> IndexWidth {
        match self {
            SparseIndices::I32 { .. } => IndexWidth::I32,
            SparseIndices::I64 { .. } => IndexWidth::I64,
        }
    }

    /// Half-open range of entries stored in `row`.
    pub fn row_range(&self, row: usize) -> (usize, usize) {
        match self {
            SparseIndices::I32 { row_pointers, .. } => {
                (row_pointers[row] as usize, row_pointers[row + 1] as usize)
            }
            SparseIndices::I64 { row_pointers, .. } => {
                (row_pointers[row] as usize, row_pointers[row + 1] as usize)
            }
        }
    }

    /// Column of the entry at position `i`.
    pub fn column(&self, i: usize) -> usize {
        match self {
            SparseIndices::I32 { column_indices, .. } => column_indices[i] as usize,
            SparseIndices::I64 { column_indices, .. } => column_indices[i] as usize,
        }
    }
}

/// Sparse CSR operand descriptor.
#[derive(Debug, Clone)]
pub struct SparseDescriptor<T: Element> {
    rows: usize,
    cols: usize,
    indices: SparseIndices,
    values: Vec<T>,
}

impl<T: Element> SparseDescriptor<T> {
    /// Descriptor with the matrix's native 64-bit indices.
    pub fn csr(a: &CsrMatrix<T>) -> Self {
        SparseDescriptor {
            rows: a.rows(),
            cols: a.cols(),
            indices: SparseIndices::I64 {
                row_pointers: a.row_pointers().to_vec(),
                column_indices: a.column_indices().to_vec(),
            },
            values: a.values().to_vec(),
        }
    }

    /// Descriptor with indices narrowed to 32 bits.
    ///
    /// # Errors
    /// Fails with an index overflow if any index does not fit.
    pub fn csr_narrowed(a: &CsrMatrix<T>) -> Result<Self> {
        let narrowed = a.narrow_indices()?;
        log::debug!(
            "narrowed CSR indices to 32 bits ({} rows, nnz={})",
            a.rows(),
            a.nnz()
        );
        Ok(SparseDescriptor {
            rows: a.rows(),
            cols: a.cols(),
            indices: SparseIndices::I32 {
                row_pointers: narrowed.row_pointers,
                column_indices: narrowed.column_indices,
            },
            values: a.values().to_vec(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn index_width(&self) -> IndexWidth {
        self.indices.width()
    }

    pub fn indices(&self) -> &SparseIndices {
        &self.indices
    }

    /// Iterate over `(column, value)` pairs stored in `row`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let (start, end) = self.indices.row_range(row);
        (start..end).map(move |i| (self.indices.column(i), self.values[i]))
    }
}

/// Dense operand descriptor: a 2-D view plus its layout and leading dimension.
#[derive(Debug, Clone)]
pub struct DenseDescriptor<T: Element> {
    matrix: DenseMatrix<T>,
    layout: DenseLayout,
    ld: usize,
}

impl<T: Element> DenseDescriptor<T> {
    /// Describe `matrix` in the layout reported by its innermost stride.
    pub fn new(matrix: &DenseMatrix<T>) -> Result<Self> {
        Self::with_layout(matrix, DenseLayout::of(matrix))
    }

    /// Describe `matrix` as a `layout` operand.
    ///
    /// A matrix with unit strides on both axes reports row-major by its
    /// innermost stride whatever its shape, so callers that have already
    /// decided on a layout pass it here.
    ///
    /// # Errors
    /// Returns `InvalidDescriptor` if the matrix is not 2-D or its strides
    /// are not BLAS-compatible in `layout`.
    pub fn with_layout(matrix: &DenseMatrix<T>, layout: DenseLayout) -> Result<Self> {
        if matrix.ndim() != 2 {
            return Err(SpmmError::InvalidDescriptor(format!(
                "dense descriptor needs a 2-D matrix, got shape {}",
                matrix.shape()
            )));
        }
        let ld = match layout {
            DenseLayout::RowMajor => matrix.row_major_ld(),
            DenseLayout::ColumnMajor => matrix.column_major_ld(),
        }
        .ok_or_else(|| {
            SpmmError::InvalidDescriptor(format!(
                "strides {:?} are not {}-compatible for shape {}",
                matrix.strides(),
                layout,
                matrix.shape()
            ))
        })?;
        Ok(DenseDescriptor {
            matrix: matrix.clone(),
            layout,
            ld,
        })
    }

    pub fn matrix(&self) -> &DenseMatrix<T> {
        &self.matrix
    }

    pub fn layout(&self) -> DenseLayout {
        self.layout
    }

    pub fn ld(&self) -> usize {
        self.ld
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }
}
