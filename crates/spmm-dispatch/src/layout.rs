//! Operand layout reconciliation.
//!
//! The SpMM primitive only accepts dense operand pairs that share a physical
//! layout. When `B` and `C` disagree, `B` is handed over as its transpose
//! view (which has the opposite layout, hence `C`'s) with the transpose
//! operation flag set, so `op(B^T) = B` and no data moves.
//!
//! | B layout | C layout | transpose_b |
//! |----------|----------|-------------|
//! | row      | row      | false       |
//! | row      | col      | true        |
//! | col      | row      | true        |
//! | col      | col      | false       |

use std::fmt;

use spmm_tensor::{DenseMatrix, Element};

/// Physical layout of a dense operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenseLayout {
    RowMajor,
    ColumnMajor,
}

impl DenseLayout {
    /// Layout by the innermost-stride test on the last logical axis.
    pub fn of<T: Element>(matrix: &DenseMatrix<T>) -> Self {
        if matrix.is_row_major() {
            DenseLayout::RowMajor
        } else {
            DenseLayout::ColumnMajor
        }
    }

    /// The layout of this operand's transpose view.
    pub fn flipped(self) -> Self {
        match self {
            DenseLayout::RowMajor => DenseLayout::ColumnMajor,
            DenseLayout::ColumnMajor => DenseLayout::RowMajor,
        }
    }
}

impl fmt::Display for DenseLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenseLayout::RowMajor => write!(f, "row-major"),
            DenseLayout::ColumnMajor => write!(f, "column-major"),
        }
    }
}

/// Operation applied to an operand by the primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    NonTranspose,
    Transpose,
}

/// Decision for one request. Computed per call, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciledPlan {
    pub transpose_b: bool,
    /// Always `NonTranspose`: sparse transposition is not supported.
    pub op_a: Operation,
    pub op_b: Operation,
    /// Layout of the `B` descriptor, i.e. after the optional transpose view.
    pub layout_b: DenseLayout,
    pub layout_c: DenseLayout,
}

impl ReconciledPlan {
    /// Plan for toolkits that only take column-major operands. Normalization
    /// has already made both operands column-major, so `B` is never
    /// transposed.
    pub fn column_major_only() -> Self {
        ReconciledPlan {
            transpose_b: false,
            op_a: Operation::NonTranspose,
            op_b: Operation::NonTranspose,
            layout_b: DenseLayout::ColumnMajor,
            layout_c: DenseLayout::ColumnMajor,
        }
    }
}

/// `B` must be transposed exactly when the two operands disagree on order.
pub fn decide_transpose(b_row_major: bool, c_row_major: bool) -> bool {
    b_row_major != c_row_major
}

/// Plan for already-normalized operands `b` and `c`.
pub fn reconcile<T: Element>(b: &DenseMatrix<T>, c: &DenseMatrix<T>) -> ReconciledPlan {
    let source_b = DenseLayout::of(b);
    let layout_c = DenseLayout::of(c);
    let transpose_b = decide_transpose(b.is_row_major(), c.is_row_major());
    let (op_b, layout_b) = if transpose_b {
        (Operation::Transpose, source_b.flipped())
    } else {
        (Operation::NonTranspose, source_b)
    };
    ReconciledPlan {
        transpose_b,
        op_a: Operation::NonTranspose,
        op_b,
        layout_b,
        layout_c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spmm_tensor::Shape;

    fn row(r: usize, c: usize) -> DenseMatrix<f32> {
        DenseMatrix::zeros(Shape::new(vec![r, c])).unwrap()
    }

    fn col(r: usize, c: usize) -> DenseMatrix<f32> {
        DenseMatrix::zeros_column_major(Shape::new(vec![r, c])).unwrap()
    }

    #[test]
    fn test_decision_table() {
        assert!(!decide_transpose(true, true));
        assert!(decide_transpose(true, false));
        assert!(decide_transpose(false, true));
        assert!(!decide_transpose(false, false));
    }

    #[test]
    fn test_column_major_only_plan() {
        let plan = ReconciledPlan::column_major_only();
        assert!(!plan.transpose_b);
        assert_eq!(plan.op_b, Operation::NonTranspose);
        assert_eq!(plan.layout_b, DenseLayout::ColumnMajor);
        assert_eq!(plan.layout_c, DenseLayout::ColumnMajor);
    }

    #[test]
    fn test_agreeing_layouts() {
        let plan = reconcile(&row(3, 2), &row(4, 2));
        assert!(!plan.transpose_b);
        assert_eq!(plan.op_b, Operation::NonTranspose);
        assert_eq!(plan.layout_b, DenseLayout::RowMajor);

        let plan = reconcile(&col(3, 2), &col(4, 2));
        assert!(!plan.transpose_b);
        assert_eq!(plan.layout_b, DenseLayout::ColumnMajor);
        assert_eq!(plan.layout_c, DenseLayout::ColumnMajor);
    }

    #[test]
    fn test_disagreeing_layouts_match_c_after_transpose() {
        let plan = reconcile(&col(3, 2), &row(4, 2));
        assert!(plan.transpose_b);
        assert_eq!(plan.op_b, Operation::Transpose);
        assert_eq!(plan.layout_b, plan.layout_c);

        let plan = reconcile(&row(3, 2), &col(4, 2));
        assert!(plan.transpose_b);
        assert_eq!(plan.layout_b, DenseLayout::ColumnMajor);
        assert_eq!(plan.op_a, Operation::NonTranspose);
    }

    #[test]
    fn test_transposed_view_layout_is_flipped() {
        let b = col(3, 2);
        assert_eq!(DenseLayout::of(&b.transpose()), DenseLayout::of(&b).flipped());
    }

    proptest! {
        #[test]
        fn prop_transpose_iff_layouts_differ(
            k in 1usize..6,
            n in 1usize..6,
            m in 1usize..6,
            b_row in any::<bool>(),
            c_row in any::<bool>(),
        ) {
            let b = if b_row { row(k, n) } else { col(k, n) };
            let c = if c_row { row(m, n) } else { col(m, n) };
            let plan = reconcile(&b, &c);
            prop_assert_eq!(plan.transpose_b, b.is_row_major() != c.is_row_major());
            prop_assert_eq!(plan.layout_b, plan.layout_c);
        }
    }
}
