//! Fallback path for toolkits without the descriptor-based API.
//!
//! There is no layout reconciliation here: the worker always runs on
//! column-major operands with 32-bit CSR indices, copying `B` and `C` into
//! that layout when they are not already in it.

use std::sync::Arc;

use spmm_tensor::{DenseMatrix, Element, TensorError};

use crate::error::Result;
use crate::host::spmm::csrmm_column_major;
use crate::matmul::{MatmulRequest, SparseDenseMatmul};
use crate::stream::Stream;

#[derive(Debug)]
pub struct LegacySpmm {
    stream: Arc<Stream>,
}

impl LegacySpmm {
    pub fn new(stream: Arc<Stream>) -> Self {
        LegacySpmm { stream }
    }
}

fn column_major<T: Element>(m: &DenseMatrix<T>) -> Result<DenseMatrix<T>> {
    if m.is_blas_compatible_column_major() {
        Ok(m.clone())
    } else {
        Ok(m.contiguous_column_major()?)
    }
}

fn column_major_ld<T: Element>(m: &DenseMatrix<T>) -> Result<usize> {
    m.column_major_ld()
        .ok_or_else(|| TensorError::Other("operand is not column-major".to_string()).into())
}

impl SparseDenseMatmul for LegacySpmm {
    fn addmm<T: Element>(&self, request: MatmulRequest<'_, T>) -> Result<()> {
        request.validate()?;

        let indices = request.a.narrow_indices()?;
        let values = request.a.values().to_vec();
        let (m, _) = request.a.shape();
        let n = request.c.cols();
        let (alpha, beta) = (request.alpha, request.beta);

        let b = column_major(request.b)?;
        let c = column_major(request.c)?;
        let ldb = column_major_ld(&b)?;
        let ldc = column_major_ld(&c)?;
        log::debug!(
            "legacy csrmm {}x{} (nnz={}) ldb={} ldc={} temporary_c={}",
            m,
            n,
            values.len(),
            ldb,
            ldc,
            !c.is_same(request.c)
        );

        let copy_back = (!c.is_same(request.c)).then(|| (request.c.clone(), c.clone()));
        self.stream.enqueue("legacy csrmm", move || {
            let b_data: Vec<T> = b.storage().read()?[b.offset()..].to_vec();
            let mut c_data = c.storage().write()?;
            let c_off = c.offset();
            csrmm_column_major(
                m,
                n,
                alpha,
                &indices.row_pointers,
                &indices.column_indices,
                &values,
                &b_data,
                ldb,
                beta,
                &mut c_data[c_off..],
                ldc,
            );
            Ok(())
        })?;

        if let Some((target, temporary)) = copy_back {
            self.stream.enqueue("accumulator copy-back", move || {
                target.copy_from(&temporary)?;
                Ok(())
            })?;
        }
        Ok(())
    }
}
