#![forbid(unsafe_code)]

mod engine;
mod frame;
mod series;

use sf_array::{ArrayError, Shape};
use sf_blocks::BlocksError;
use sf_index::IndexError;
use sf_types::{Scalar, TypeError};
use thiserror::Error;

pub use frame::Frame;
pub use series::Series;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrameError {
    #[error("index length ({index_len}) does not match values length ({values_len})")]
    LengthMismatch { index_len: usize, values_len: usize },
    #[error("shapes not alignable for matrix multiplication: {left} and {right}")]
    NotAlignable { left: Shape, right: Shape },
    #[error("name {name} cannot be used as a label")]
    NameUnhashable { name: String },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Blocks(#[from] BlocksError),
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result of a selection: its dimensionality follows the keys.
#[derive(Debug, Clone)]
pub enum Selection {
    Element(Scalar),
    Series(Series),
    Frame(Frame),
}

impl Selection {
    #[must_use]
    pub fn into_element(self) -> Option<Scalar> {
        match self {
            Self::Element(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_series(self) -> Option<Series> {
        match self {
            Self::Series(series) => Some(series),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_frame(self) -> Option<Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }
}
