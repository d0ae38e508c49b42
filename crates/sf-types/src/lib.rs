#![forbid(unsafe_code)]

mod cast;
mod dtype;
mod scalar;

use thiserror::Error;

pub use cast::{cast_lossless, cast_scalar, dtype_to_na};
pub use dtype::{DType, DTypeKind, TimeUnit, promote_numeric, resolve_dtype, resolve_dtype_iter};
pub use scalar::{
    Label, NAT, Scalar, cmp_f64, convert_datetime, convert_timedelta, parse_datetime,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypeError {
    #[error("no null sentinel or element type is defined for dtype {dtype}")]
    UnsupportedDtype { dtype: DType },
    #[error("cannot cast values of dtype {from} to {to}")]
    InvalidCast { from: DType, to: DType },
    #[error("cannot cast value {value} to {to}")]
    ValueCast { value: String, to: DType },
    #[error("cannot resolve a dtype from an empty collection of dtypes")]
    EmptyDtypes,
}

// ── Missingness utilities ──────────────────────────────────────────────

#[must_use]
pub fn isna(values: &[Scalar]) -> Vec<bool> {
    values.iter().map(Scalar::is_na).collect()
}

#[must_use]
pub fn count_na(values: &[Scalar]) -> usize {
    values.iter().filter(|v| v.is_na()).count()
}

/// Resolved dtype of a run of scalars, `None` when empty.
#[must_use]
pub fn infer_dtype(values: &[Scalar]) -> Option<DType> {
    resolve_dtype_iter(values.iter().map(Scalar::natural_dtype)).ok()
}
