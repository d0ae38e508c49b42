#![forbid(unsafe_code)]

mod align;
mod axis;
mod hierarchy;
mod index;

use sf_array::ArrayError;
use sf_types::TypeError;
use thiserror::Error;

pub use align::{AlignMode, AlignmentPlan, Conform, align, validate_alignment_plan};
pub use axis::AxisIndex;
pub use hierarchy::{HLoc, HSelector, IndexHierarchy, IndexHierarchyGO};
pub use index::{GrowOnly, Index, IndexGO, IndexMode, LabelSlice, LocKey, Relabel, Static};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("labels have non-unique values: {label}")]
    DuplicateLabel { label: String },
    #[error("key not found: {key}")]
    KeyNotFound { key: String },
    #[error("expected {expected} labels, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("expected labels of depth {expected}, found depth {found}")]
    DepthMismatch { expected: usize, found: usize },
    #[error("selector at depth {depth} must be a single label")]
    NonTerminalSelector { depth: usize },
    #[error("level order {order:?} is not a permutation of depth {depth}")]
    InvalidLevelOrder { order: Vec<usize>, depth: usize },
    #[error("cannot drop {count} levels from a hierarchy of depth {depth}")]
    InvalidLevelDrop { count: i64, depth: usize },
    #[error("a hierarchy needs at least one level")]
    EmptyHierarchy,
    #[error("labels are not mutually orderable")]
    Unorderable,
    #[error("alignment vectors must have equal lengths")]
    InvalidAlignmentVectors,
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

#[cfg(test)]
mod tests {
    use super::IndexError;

    #[test]
    fn errors_carry_the_offending_key() {
        let err = IndexError::KeyNotFound {
            key: "'z'".to_owned(),
        };
        assert_eq!(err.to_string(), "key not found: 'z'");
        let err = IndexError::InvalidLevelDrop { count: 3, depth: 2 };
        assert_eq!(
            err.to_string(),
            "cannot drop 3 levels from a hierarchy of depth 2"
        );
    }
}
