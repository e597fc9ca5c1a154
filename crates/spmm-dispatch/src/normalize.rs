//! Dense operand normalization.

use std::ops::Deref;

use spmm_tensor::{DenseMatrix, Element};

use crate::config::Capabilities;
use crate::error::Result;
use crate::layout::DenseLayout;

/// A dense operand that is either the caller's matrix or a fresh copy.
#[derive(Debug)]
pub enum Prepared<'a, T: Element> {
    /// The caller's matrix, used in place.
    Borrowed(&'a DenseMatrix<T>),
    /// A contiguous copy with its own buffer.
    Owned(DenseMatrix<T>),
}

impl<T: Element> Prepared<'_, T> {
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Prepared::Borrowed(_))
    }
}

impl<T: Element> Deref for Prepared<'_, T> {
    type Target = DenseMatrix<T>;

    fn deref(&self) -> &DenseMatrix<T> {
        match self {
            Prepared::Borrowed(m) => m,
            Prepared::Owned(m) => m,
        }
    }
}

/// Make `matrix` consumable by the primitive.
///
/// With row-major support, a matrix is borrowed when it is BLAS-compatible in
/// the layout its innermost stride reports, which is the layout the
/// reconciler reads it in. Anything else is copied row-major. Without
/// row-major support, only column-major-compatible matrices are borrowed and
/// copies are column-major.
pub fn prepare_dense<'a, T: Element>(
    matrix: &'a DenseMatrix<T>,
    caps: &Capabilities,
) -> Result<Prepared<'a, T>> {
    if caps.row_major_dense {
        let usable = match DenseLayout::of(matrix) {
            DenseLayout::RowMajor => matrix.is_blas_compatible_row_major(),
            DenseLayout::ColumnMajor => matrix.is_blas_compatible_column_major(),
        };
        if usable {
            return Ok(Prepared::Borrowed(matrix));
        }
        log::debug!(
            "copying {} operand with strides {:?} to row-major",
            matrix.shape(),
            matrix.strides()
        );
        Ok(Prepared::Owned(matrix.contiguous()?))
    } else {
        if matrix.is_blas_compatible_column_major() {
            return Ok(Prepared::Borrowed(matrix));
        }
        log::debug!(
            "copying {} operand with strides {:?} to column-major",
            matrix.shape(),
            matrix.strides()
        );
        Ok(Prepared::Owned(matrix.contiguous_column_major()?))
    }
}
