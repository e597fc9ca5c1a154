use spmm_tensor::{CsrMatrix, DenseMatrix, Element};

use crate::error::{Result, SpmmError};

/// One `C = alpha * A @ B + beta * C` request.
///
/// `c` is the accumulator: results are written through its shared storage.
#[derive(Debug, Clone, Copy)]
pub struct MatmulRequest<'a, T: Element> {
    pub a: &'a CsrMatrix<T>,
    pub b: &'a DenseMatrix<T>,
    pub c: &'a DenseMatrix<T>,
    pub alpha: T,
    pub beta: T,
}

impl<'a, T: Element> MatmulRequest<'a, T> {
    pub fn new(
        a: &'a CsrMatrix<T>,
        b: &'a DenseMatrix<T>,
        c: &'a DenseMatrix<T>,
        alpha: T,
        beta: T,
    ) -> Self {
        MatmulRequest {
            a,
            b,
            c,
            alpha,
            beta,
        }
    }

    /// Check that `A[m x k] @ B[k x n]` fits into a 2-D `C[m x n]`.
    pub fn validate(&self) -> Result<()> {
        let (m, k) = self.a.shape();
        let mismatch = || SpmmError::ShapeMismatch {
            m,
            k,
            k2: self.b.shape().dims().first().copied().unwrap_or(0),
            n: self.b.shape().dims().last().copied().unwrap_or(0),
            c: self.c.shape().dims().to_vec(),
        };
        if self.b.ndim() != 2 || self.c.ndim() != 2 {
            return Err(mismatch());
        }
        if self.b.rows() != k || self.c.rows() != m || self.c.cols() != self.b.cols() {
            return Err(mismatch());
        }
        Ok(())
    }
}

/// Sparse × dense multiply-accumulate.
///
/// Implementations enqueue the work on their stream and return; results are
/// visible in the accumulator once the stream is synchronized.
pub trait SparseDenseMatmul {
    fn addmm<T: Element>(&self, request: MatmulRequest<'_, T>) -> Result<()>;
}
