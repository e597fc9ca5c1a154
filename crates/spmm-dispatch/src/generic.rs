//! Descriptor-based SpMM path.

use std::sync::Arc;

use spmm_tensor::Element;

use crate::allocator::CachingAllocator;
use crate::config::{Capabilities, SpmmAlgorithm};
use crate::descriptor::{DenseDescriptor, SparseDescriptor};
use crate::error::{PrimitiveStage, Result, SpmmError};
use crate::layout::{reconcile, ReconciledPlan};
use crate::matmul::{MatmulRequest, SparseDenseMatmul};
use crate::normalize::prepare_dense;
use crate::primitive::{SpmmArgs, SpmmPrimitive};
use crate::stream::Stream;

/// Runs requests through a fixed-layout [`SpmmPrimitive`].
///
/// Per call: normalize `B` and `C`, reconcile their layouts, query scratch,
/// allocate it, execute, and copy a temporary accumulator back into the
/// caller's matrix. Nothing is cached between calls.
#[derive(Debug)]
pub struct GenericSpmm<P> {
    primitive: P,
    caps: Capabilities,
    algorithm: SpmmAlgorithm,
    stream: Arc<Stream>,
    allocator: CachingAllocator,
}

impl<P: SpmmPrimitive> GenericSpmm<P> {
    pub fn new(
        primitive: P,
        caps: Capabilities,
        algorithm: SpmmAlgorithm,
        stream: Arc<Stream>,
        allocator: CachingAllocator,
    ) -> Self {
        GenericSpmm {
            primitive,
            caps,
            algorithm,
            stream,
            allocator,
        }
    }

    pub fn primitive(&self) -> &P {
        &self.primitive
    }
}

impl<P: SpmmPrimitive> SparseDenseMatmul for GenericSpmm<P> {
    fn addmm<T: Element>(&self, request: MatmulRequest<'_, T>) -> Result<()> {
        request.validate()?;

        let c = prepare_dense(request.c, &self.caps)?;
        let b = prepare_dense(request.b, &self.caps)?;
        let plan = if self.caps.row_major_dense {
            reconcile(&b, &c)
        } else {
            ReconciledPlan::column_major_only()
        };
        log::debug!(
            "{} addmm {:?}: B {} C {} transpose_b={}",
            self.primitive.name(),
            request.a.shape(),
            b.shape(),
            c.shape(),
            plan.transpose_b
        );

        let a_desc = if self.caps.wide_indices {
            SparseDescriptor::csr(request.a)
        } else {
            SparseDescriptor::csr_narrowed(request.a)?
        };
        let b_view = if plan.transpose_b {
            b.transpose()
        } else {
            (*b).clone()
        };
        let args = SpmmArgs {
            op_a: plan.op_a,
            op_b: plan.op_b,
            alpha: request.alpha,
            beta: request.beta,
            a: a_desc,
            b: DenseDescriptor::with_layout(&b_view, plan.layout_b)?,
            c: DenseDescriptor::with_layout(&c, plan.layout_c)?,
            compute_type: T::DTYPE,
            algorithm: self.algorithm,
        };

        let size = self
            .primitive
            .buffer_size(&args)
            .map_err(|status| SpmmError::Primitive {
                stage: PrimitiveStage::BufferSize,
                status,
            })?;
        log::debug!("scratch for {:?}: {} bytes", self.algorithm, size);
        let scratch = self.allocator.allocate(size)?;
        self.primitive
            .execute(&self.stream, args, scratch)
            .map_err(|status| SpmmError::Primitive {
                stage: PrimitiveStage::Execute,
                status,
            })?;

        if !request.c.is_same(&c) {
            let target = request.c.clone();
            let temporary = (*c).clone();
            drop(c);
            self.stream.enqueue("accumulator copy-back", move || {
                target.copy_from(&temporary)?;
                Ok(())
            })?;
        }
        Ok(())
    }
}
