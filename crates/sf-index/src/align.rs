use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::IndexError;
use crate::axis::AxisIndex;

/// Alignment mode for label-based joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    /// Only labels present in both indices.
    Inner,
    /// All left labels; right fills missing.
    Left,
    /// All right labels; left fills missing.
    Right,
    /// All labels from both indices (union). Default for operators.
    #[default]
    Outer,
}

/// How one operand reaches the aligned index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conform {
    /// Labels already match in order; the data is reused as is.
    Identity,
    /// For each aligned position, the source position or `None` to fill.
    Reindex(Vec<Option<usize>>),
}

impl Conform {
    fn between(source: &AxisIndex, target: &AxisIndex) -> Self {
        if source.equals(target) {
            Self::Identity
        } else {
            Self::Reindex(source.get_indexer(target))
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }

    /// Whether any aligned position has no source.
    #[must_use]
    pub fn needs_fill(&self) -> bool {
        match self {
            Self::Identity => false,
            Self::Reindex(positions) => positions.iter().any(Option::is_none),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPlan {
    pub union_index: AxisIndex,
    pub left: Conform,
    pub right: Conform,
}

/// Align two indices using the given join mode.
///
/// Equal indices short-circuit to identity on both sides without a lookup
/// per label.
pub fn align(left: &AxisIndex, right: &AxisIndex, mode: AlignMode) -> Result<AlignmentPlan, IndexError> {
    if left.equals(right) {
        debug!(len = left.len(), ?mode, "alignment short-circuit on equal indices");
        return Ok(AlignmentPlan {
            union_index: left.clone(),
            left: Conform::Identity,
            right: Conform::Identity,
        });
    }
    let union_index = match mode {
        AlignMode::Inner => left.intersection(right)?,
        AlignMode::Left => left.clone(),
        AlignMode::Right => right.clone(),
        AlignMode::Outer => left.union(right)?,
    };
    debug!(
        left = left.len(),
        right = right.len(),
        aligned = union_index.len(),
        ?mode,
        "alignment reindexes"
    );
    Ok(AlignmentPlan {
        left: Conform::between(left, &union_index),
        right: Conform::between(right, &union_index),
        union_index,
    })
}

fn validate_side(conform: &Conform, source_len: usize, aligned_len: usize) -> Result<(), IndexError> {
    match conform {
        Conform::Identity if source_len == aligned_len => Ok(()),
        Conform::Reindex(positions)
            if positions.len() == aligned_len
                && positions.iter().flatten().all(|&p| p < source_len) =>
        {
            Ok(())
        }
        _ => Err(IndexError::InvalidAlignmentVectors),
    }
}

/// Check that both sides of a plan address `left_len` and `right_len` source
/// rows and produce exactly the aligned length.
pub fn validate_alignment_plan(
    plan: &AlignmentPlan,
    left_len: usize,
    right_len: usize,
) -> Result<(), IndexError> {
    let aligned = plan.union_index.len();
    validate_side(&plan.left, left_len, aligned)?;
    validate_side(&plan.right, right_len, aligned)
}

#[cfg(test)]
mod tests {
    use sf_types::Scalar;

    use super::{AlignMode, Conform, align, validate_alignment_plan};
    use crate::{AxisIndex, IndexError};

    fn ix(labels: &[&str]) -> AxisIndex {
        AxisIndex::new(labels.iter().map(|s| Scalar::str(*s))).expect("unique")
    }

    #[test]
    fn outer_alignment_fills_missing() {
        let left = ix(&["a", "b", "c", "d"]);
        let right = ix(&["a", "b", "c"]);
        let plan = align(&left, &right, AlignMode::Outer).expect("align");
        assert!(plan.union_index.equals(&left));
        assert_eq!(plan.left, Conform::Identity);
        assert_eq!(
            plan.right,
            Conform::Reindex(vec![Some(0), Some(1), Some(2), None])
        );
        assert!(plan.right.needs_fill());
        validate_alignment_plan(&plan, 4, 3).expect("valid");
    }

    #[test]
    fn equal_indices_short_circuit() {
        let left = ix(&["c", "a"]);
        let plan = align(&left, &left.clone(), AlignMode::Outer).expect("align");
        assert!(plan.left.is_identity() && plan.right.is_identity());
        assert_eq!(plan.union_index.labels(), left.labels());
    }

    #[test]
    fn inner_left_and_right_modes() {
        let left = ix(&["a", "b", "c"]);
        let right = ix(&["b", "c", "d"]);
        let inner = align(&left, &right, AlignMode::Inner).expect("inner");
        assert_eq!(inner.union_index.len(), 2);
        assert_eq!(inner.left, Conform::Reindex(vec![Some(1), Some(2)]));

        let keep_left = align(&left, &right, AlignMode::Left).expect("left");
        assert_eq!(keep_left.left, Conform::Identity);
        assert_eq!(keep_left.right, Conform::Reindex(vec![None, Some(0), Some(1)]));

        let keep_right = align(&left, &right, AlignMode::Right).expect("right");
        assert_eq!(keep_right.right, Conform::Identity);
        assert_eq!(keep_right.left, Conform::Reindex(vec![Some(1), Some(2), None]));
    }

    #[test]
    fn validation_rejects_bad_vectors() {
        let left = ix(&["a", "b"]);
        let right = ix(&["b"]);
        let mut plan = align(&left, &right, AlignMode::Outer).expect("align");
        plan.right = Conform::Reindex(vec![Some(5), None]);
        assert_eq!(
            validate_alignment_plan(&plan, 2, 1),
            Err(IndexError::InvalidAlignmentVectors)
        );
    }
}
