//! Alignment of labeled operands ahead of elementwise operators.

use sf_array::{Array, Shape};
use sf_blocks::{TypeBlocks, na_fill_for};
use sf_index::{AlignMode, AlignmentPlan, AxisIndex, Conform, align, validate_alignment_plan};
use sf_types::Scalar;
use tracing::debug;

use crate::FrameError;

/// Outer-align two axes and check the plan against both source lengths.
pub(crate) fn align_outer(left: &AxisIndex, right: &AxisIndex) -> Result<AlignmentPlan, FrameError> {
    let plan = align(left, right, AlignMode::Outer)?;
    validate_alignment_plan(&plan, left.len(), right.len())?;
    Ok(plan)
}

/// Bring a 1D array onto the aligned index; new positions hold NaN, or NaT
/// for temporal dtypes.
pub(crate) fn conform_array(array: &Array, conform: &Conform) -> Result<Array, FrameError> {
    match conform {
        Conform::Identity => Ok(array.clone()),
        Conform::Reindex(positions) => {
            Ok(array.take_rows_with_fill(positions, &na_fill_for(array.dtype()))?)
        }
    }
}

pub(crate) fn conform_rows(blocks: &TypeBlocks, conform: &Conform) -> Result<TypeBlocks, FrameError> {
    match conform {
        Conform::Identity => Ok(blocks.clone()),
        Conform::Reindex(positions) => Ok(blocks.take_rows_with_fill_by(positions, na_fill_for)?),
    }
}

pub(crate) fn conform_columns(blocks: &TypeBlocks, conform: &Conform) -> Result<TypeBlocks, FrameError> {
    match conform {
        Conform::Identity => Ok(blocks.clone()),
        Conform::Reindex(positions) => {
            Ok(blocks.take_columns_with_fill(positions, &Scalar::Float(f64::NAN))?)
        }
    }
}

/// Align the inner dimension of a matrix product. Differently ordered
/// labels are conformed; differing label sets cannot be multiplied.
pub(crate) fn align_inner_dimension(
    left: &AxisIndex,
    right: &AxisIndex,
    left_shape: Shape,
    right_shape: Shape,
) -> Result<AlignmentPlan, FrameError> {
    let plan = align_outer(left, right)?;
    let aligned = plan.union_index.len();
    if aligned != left.len() || aligned != right.len() {
        debug!(left = left.len(), right = right.len(), aligned, "matmul labels do not align");
        return Err(FrameError::NotAlignable {
            left: left_shape,
            right: right_shape,
        });
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use sf_array::{Array, Shape};
    use sf_index::{AxisIndex, Conform};
    use sf_types::Scalar;

    use super::{align_inner_dimension, conform_array};
    use crate::FrameError;

    fn ix(labels: &[&str]) -> AxisIndex {
        AxisIndex::new(labels.iter().map(|s| Scalar::str(*s))).expect("unique")
    }

    #[test]
    fn conform_fills_integers_with_nan() {
        let values = Array::from_i64s(vec![1, 2]);
        let out = conform_array(&values, &Conform::Reindex(vec![Some(1), None])).expect("conform");
        assert_eq!(out.get(0), Some(Scalar::Float(2.0)));
        assert!(out.get(1).is_some_and(|v| v.is_nan()));
        assert!(!out.is_writeable());
    }

    #[test]
    fn inner_dimension_requires_equal_label_sets() {
        let plan = align_inner_dimension(&ix(&["a", "b"]), &ix(&["b", "a"]), Shape::Two(1, 2), Shape::One(2))
            .expect("same labels");
        assert_eq!(plan.union_index.len(), 2);
        let err = align_inner_dimension(&ix(&["a", "b"]), &ix(&["a", "c"]), Shape::Two(1, 2), Shape::One(2))
            .expect_err("different labels");
        assert_eq!(
            err.to_string(),
            "shapes not alignable for matrix multiplication: (1, 2) and (2,)"
        );
        assert!(matches!(err, FrameError::NotAlignable { .. }));
    }
}
