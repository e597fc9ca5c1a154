pub mod spmm;

use spmm_tensor::{Element, IndexWidth};

use crate::allocator::ScratchBlock;
use crate::config::{Capabilities, SpmmAlgorithm};
use crate::error::PrimitiveStatus;
use crate::layout::{DenseLayout, Operation};
use crate::primitive::{SpmmArgs, SpmmPrimitive};
use crate::stream::Stream;

/// Pure-Rust reference SpMM primitive.
///
/// Enforces the same operand rules as the device library it stands in for:
/// non-transposed sparse operand, dense operands sharing one layout, and
/// row-major operands or 64-bit indices only where the capabilities allow.
#[derive(Debug, Clone)]
pub struct HostSpmm {
    caps: Capabilities,
}

impl HostSpmm {
    pub fn new(caps: Capabilities) -> Self {
        HostSpmm { caps }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn validate<T: Element>(&self, args: &SpmmArgs<T>) -> Result<(), PrimitiveStatus> {
        if args.op_a != Operation::NonTranspose {
            return Err(PrimitiveStatus::NotSupported);
        }
        if args.compute_type != T::DTYPE {
            return Err(PrimitiveStatus::NotSupported);
        }
        if args.b.layout() != args.c.layout() {
            return Err(PrimitiveStatus::NotSupported);
        }
        if !self.caps.row_major_dense && args.c.layout() == DenseLayout::RowMajor {
            return Err(PrimitiveStatus::NotSupported);
        }
        if !self.caps.wide_indices && args.a.index_width() == IndexWidth::I64 {
            return Err(PrimitiveStatus::NotSupported);
        }

        // op(B) is k x n.
        let (k, n) = match args.op_b {
            Operation::NonTranspose => (args.b.rows(), args.b.cols()),
            Operation::Transpose => (args.b.cols(), args.b.rows()),
        };
        if args.a.cols() != k || args.a.rows() != args.c.rows() || args.c.cols() != n {
            return Err(PrimitiveStatus::InvalidValue);
        }
        Ok(())
    }

    fn required_scratch<T: Element>(args: &SpmmArgs<T>) -> usize {
        match args.algorithm {
            SpmmAlgorithm::CsrAlg2 => args.c.cols() * args.compute_type.size_in_bytes(),
            SpmmAlgorithm::Default | SpmmAlgorithm::CsrAlg1 => 0,
        }
    }
}

impl SpmmPrimitive for HostSpmm {
    fn name(&self) -> &str {
        "host"
    }

    fn buffer_size<T: Element>(&self, args: &SpmmArgs<T>) -> Result<usize, PrimitiveStatus> {
        self.validate(args)?;
        Ok(Self::required_scratch(args))
    }

    fn execute<T: Element>(
        &self,
        stream: &Stream,
        args: SpmmArgs<T>,
        scratch: ScratchBlock,
    ) -> Result<(), PrimitiveStatus> {
        self.validate(&args)?;
        if scratch.len() < Self::required_scratch(&args) {
            return Err(PrimitiveStatus::InsufficientWorkspace);
        }
        stream
            .enqueue("host spmm", move || {
                // The scratch block stays on loan until the kernel finishes.
                let _scratch = scratch;
                spmm::spmm_descriptors(&args)
            })
            .map_err(|e| {
                log::error!("failed to enqueue host spmm: {}", e);
                PrimitiveStatus::ExecutionFailed
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::CachingAllocator;
    use crate::config::ToolkitVersion;
    use crate::descriptor::{DenseDescriptor, SparseDescriptor};
    use spmm_tensor::{CsrMatrix, DenseMatrix, Shape};

    fn args(
        b: &DenseMatrix<f32>,
        c: &DenseMatrix<f32>,
        op_b: Operation,
        algorithm: SpmmAlgorithm,
    ) -> SpmmArgs<f32> {
        let a = CsrMatrix::new(vec![0, 1, 2], vec![0, 1], vec![1.0, 1.0], (2, 2)).unwrap();
        SpmmArgs {
            op_a: Operation::NonTranspose,
            op_b,
            alpha: 1.0,
            beta: 0.0,
            a: SparseDescriptor::csr(&a),
            b: DenseDescriptor::new(b).unwrap(),
            c: DenseDescriptor::new(c).unwrap(),
            compute_type: spmm_tensor::DType::F32,
            algorithm,
        }
    }

    fn row_b() -> DenseMatrix<f32> {
        DenseMatrix::from_vec(vec![2.0, 3.0], Shape::new(vec![2, 1])).unwrap()
    }

    #[test]
    fn test_buffer_size_by_algorithm() {
        let host = HostSpmm::new(Capabilities::full());
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 1])).unwrap();
        let alg2 = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg2);
        assert_eq!(host.buffer_size(&alg2).unwrap(), 4);
        let alg1 = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg1);
        assert_eq!(host.buffer_size(&alg1).unwrap(), 0);
    }

    #[test]
    fn test_rejects_mixed_layouts() {
        let host = HostSpmm::new(Capabilities::full());
        let b = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![2, 3])).unwrap();
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 3])).unwrap();
        let a = args(&b, &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg2);
        assert_eq!(host.buffer_size(&a), Err(PrimitiveStatus::NotSupported));
    }

    #[test]
    fn test_rejects_transposed_sparse() {
        let host = HostSpmm::new(Capabilities::full());
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 1])).unwrap();
        let mut a = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg2);
        a.op_a = Operation::Transpose;
        assert_eq!(host.buffer_size(&a), Err(PrimitiveStatus::NotSupported));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let host = HostSpmm::new(Capabilities::full());
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 2])).unwrap();
        let a = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg2);
        assert_eq!(host.buffer_size(&a), Err(PrimitiveStatus::InvalidValue));
    }

    #[test]
    fn test_rejects_unsupported_features_on_old_toolkit() {
        let host = HostSpmm::new(Capabilities::for_toolkit(ToolkitVersion::new(10, 2)));
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 1])).unwrap();
        let row = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::Default);
        assert_eq!(host.buffer_size(&row), Err(PrimitiveStatus::NotSupported));

        let b = DenseMatrix::from_column_major(vec![2.0f32, 3.0], Shape::new(vec![2, 1])).unwrap();
        let c = DenseMatrix::<f32>::zeros_column_major(Shape::new(vec![2, 1])).unwrap();
        let wide = args(&b, &c, Operation::NonTranspose, SpmmAlgorithm::Default);
        assert_eq!(wide.a.index_width(), IndexWidth::I64);
        assert_eq!(host.buffer_size(&wide), Err(PrimitiveStatus::NotSupported));
    }

    #[test]
    fn test_execute_requires_workspace() {
        let host = HostSpmm::new(Capabilities::full());
        let stream = Stream::new("host-test").unwrap();
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 1])).unwrap();
        let a = args(&row_b(), &c, Operation::NonTranspose, SpmmAlgorithm::CsrAlg2);
        let scratch = CachingAllocator::new().allocate(0).unwrap();
        assert_eq!(
            host.execute(&stream, a, scratch),
            Err(PrimitiveStatus::InsufficientWorkspace)
        );
        assert_eq!(stream.submitted(), 0);
    }

    #[test]
    fn test_execute_transposed_b() {
        let host = HostSpmm::new(Capabilities::full());
        let stream = Stream::new("host-test").unwrap();
        let alloc = CachingAllocator::new();
        // B is [[2], [3]] column-major; its transpose view is row-major 1x2.
        let b = DenseMatrix::from_column_major(vec![2.0f32, 3.0], Shape::new(vec![2, 1])).unwrap();
        let c = DenseMatrix::<f32>::zeros(Shape::new(vec![2, 1])).unwrap();
        let a = args(&b.transpose(), &c, Operation::Transpose, SpmmAlgorithm::CsrAlg2);
        let scratch = alloc.allocate(host.buffer_size(&a).unwrap()).unwrap();
        host.execute(&stream, a, scratch).unwrap();
        stream.synchronize().unwrap();
        assert_eq!(c.to_vec().unwrap(), vec![2.0, 3.0]);
        assert_eq!(alloc.stats().bytes_in_use, 0);
    }

    #[test]
    fn test_scratch_scales_with_element_size() {
        use half::bf16;
        let host = HostSpmm::new(Capabilities::full());
        let a = CsrMatrix::new(vec![0, 1], vec![0], vec![bf16::ONE], (1, 1)).unwrap();
        let b = DenseMatrix::<bf16>::zeros(Shape::new(vec![1, 3])).unwrap();
        let c = DenseMatrix::<bf16>::zeros(Shape::new(vec![1, 3])).unwrap();
        let args = SpmmArgs {
            op_a: Operation::NonTranspose,
            op_b: Operation::NonTranspose,
            alpha: bf16::ONE,
            beta: bf16::ZERO,
            a: SparseDescriptor::csr(&a),
            b: DenseDescriptor::new(&b).unwrap(),
            c: DenseDescriptor::new(&c).unwrap(),
            compute_type: spmm_tensor::DType::BF16,
            algorithm: SpmmAlgorithm::CsrAlg2,
        };
        assert_eq!(host.buffer_size(&args).unwrap(), 6);
    }
}
