#![forbid(unsafe_code)]

mod array;
mod dedupe;
mod key;
mod ops;
mod setops;
mod sort;
mod util;

use sf_types::{DType, TypeError};
use thiserror::Error;

pub use array::{Array, ArrayData, Axis, Shape};
pub use dedupe::{array_to_duplicated, array_to_duplicated_hashable, array_to_duplicated_sortable};
pub use key::{ILocKey, Slice, slice_to_ascending_slice};
pub use ops::{
    ArithmeticOp, BinaryOp, ComparisonOp, LogicalOp, Product, UnaryOp, binary_op,
    binary_op_scalar, dot_1d, matmul, unary_op,
};
pub use setops::{
    intersect1d, intersect2d, isin, ufunc_set_iter, ufunc_unique, union1d, union2d,
};
pub use sort::{argsort, is_sortable, try_sort};
pub use util::{
    TypeResolution, array_shift, concat_resolved, fill_dtype, full_for_fill, infer_element_dtype,
    isna_array, iterable_to_array, resolve_type_iter, roll_1d, roll_2d, shift_positions,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("assignment destination is read-only")]
    Immutable,
    #[error("arrays of rank {ndim} are not supported")]
    RankUnsupported { ndim: usize },
    #[error("axis {axis} is out of bounds for a 2D array")]
    AxisInvalid { axis: usize },
    #[error("position {position} is out of bounds for length {len}")]
    PositionOutOfBounds { position: i64, len: usize },
    #[error("boolean mask of length {mask_len} does not match length {len}")]
    MaskLengthMismatch { mask_len: usize, len: usize },
    #[error("slice step cannot be zero")]
    SliceStepZero,
    #[error("shapes {left} and {right} are not compatible")]
    ShapeMismatch { left: Shape, right: Shape },
    #[error("shapes not alignable for matrix multiplication: {left} and {right}")]
    NotAlignable { left: Shape, right: Shape },
    #[error("{values} values cannot fill shape {shape}")]
    LengthMismatch { values: usize, shape: Shape },
    #[error("expected dtype {expected}, found {found}")]
    DtypeMismatch { expected: DType, found: DType },
    #[error("unsupported operand types for {op}: {left} and {right}")]
    UnsupportedOperation {
        op: &'static str,
        left: String,
        right: String,
    },
    #[error("integers to negative integer powers are not allowed")]
    NegativeIntegerPower,
    #[error("values are not mutually orderable")]
    Unorderable,
    #[error("expected an array of rank {expected}, found rank {found}")]
    ExpectedRank { expected: usize, found: usize },
    #[error("need at least one array to concatenate")]
    NothingToConcatenate,
    #[error("a set operation needs at least one array")]
    NoOperands,
    #[error(transparent)]
    Type(#[from] TypeError),
}

#[cfg(test)]
mod tests {
    use super::{ArrayError, Shape};

    #[test]
    fn errors_render_shapes_and_positions() {
        let err = ArrayError::NotAlignable {
            left: Shape::Two(2, 3),
            right: Shape::One(2),
        };
        assert_eq!(
            err.to_string(),
            "shapes not alignable for matrix multiplication: (2, 3) and (2,)"
        );
        assert_eq!(
            ArrayError::Immutable.to_string(),
            "assignment destination is read-only"
        );
    }
}
