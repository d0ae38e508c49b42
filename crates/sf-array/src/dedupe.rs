use std::collections::HashMap;

use sf_types::Scalar;
use tracing::debug;

use crate::ArrayError;
use crate::array::{Array, Axis};
use crate::sort::argsort;

/// One key per element (1D), or per row or column (2D). Both detection
/// paths group on these keys, so values equal across kinds or units land in
/// one group either way.
fn keys(array: &Array, axis: Axis) -> Vec<Scalar> {
    let raw = if array.ndim() == 1 {
        array.to_vec()
    } else {
        let rows = match axis {
            Axis::Rows => array.to_rows(),
            Axis::Columns => array.transpose().to_rows(),
        };
        rows.into_iter().map(Scalar::Tuple).collect()
    };
    raw.iter().map(Scalar::equality_key).collect()
}

fn combine(first: bool, last: bool, exclude_first: bool, exclude_last: bool) -> bool {
    match (exclude_first, exclude_last) {
        (true, false) => first,
        (false, true) => last,
        (false, false) => first || last,
        (true, true) => first && last,
    }
}

/// Flag duplicated elements, rows or columns.
///
/// With neither exclusion every member of a duplicate group is flagged;
/// `exclude_first` spares the first occurrence, `exclude_last` the last, and
/// both together spare the two ends. Sorts when the values allow, otherwise
/// groups by hash.
#[must_use]
pub fn array_to_duplicated(
    array: &Array,
    axis: Axis,
    exclude_first: bool,
    exclude_last: bool,
) -> Array {
    match array_to_duplicated_sortable(array, axis, exclude_first, exclude_last) {
        Ok(flags) => flags,
        Err(_) => {
            debug!(dtype = %array.dtype(), "duplicate detection falls back to hashing");
            array_to_duplicated_hashable(array, axis, exclude_first, exclude_last)
        }
    }
}

/// Sorting-based duplicate detection; fails with `Unorderable` for values
/// without a common order.
pub fn array_to_duplicated_sortable(
    array: &Array,
    axis: Axis,
    exclude_first: bool,
    exclude_last: bool,
) -> Result<Array, ArrayError> {
    let keys = keys(array, axis);
    let order = argsort(&keys).ok_or(ArrayError::Unorderable)?;
    let n = keys.len();

    // `same[i]`: the i-th sorted key equals its predecessor.
    let same: Vec<bool> = (0..n)
        .map(|i| i > 0 && keys[order[i]] == keys[order[i - 1]])
        .collect();
    let mut flags = vec![false; n];
    for i in 0..n {
        let first = same[i];
        let last = same.get(i + 1).copied().unwrap_or(false);
        flags[order[i]] = combine(first, last, exclude_first, exclude_last);
    }
    Ok(Array::from_bools(flags))
}

/// Hash-grouping duplicate detection; works for any values.
#[must_use]
pub fn array_to_duplicated_hashable(
    array: &Array,
    axis: Axis,
    exclude_first: bool,
    exclude_last: bool,
) -> Array {
    let keys = keys(array, axis);
    let mut totals: HashMap<&Scalar, usize> = HashMap::with_capacity(keys.len());
    for key in &keys {
        *totals.entry(key).or_default() += 1;
    }
    let mut seen: HashMap<&Scalar, usize> = HashMap::with_capacity(totals.len());
    let flags = keys
        .iter()
        .map(|key| {
            let count = seen.entry(key).or_default();
            *count += 1;
            let total = totals.get(key).copied().unwrap_or(1);
            // Sorted-adjacency semantics: "first" marks every occurrence
            // after the first, "last" every occurrence before the last.
            let first = *count > 1;
            let last = *count < total;
            combine(first, last, exclude_first, exclude_last)
        })
        .collect();
    Array::from_bools(flags)
}
