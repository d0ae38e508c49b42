use std::collections::HashSet;

use indexmap::IndexSet;
use sf_types::{DType, Scalar, TimeUnit, convert_datetime, convert_timedelta, resolve_dtype};
use tracing::debug;

use crate::ArrayError;
use crate::array::{Array, Shape};
use crate::sort::try_sort;
use crate::util::iterable_to_array;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOp {
    Union,
    Intersection,
}

/// Union keeps left-then-right insertion order, intersection keeps the left
/// order; both are sorted afterwards when the values allow.
fn combine(left: Vec<Scalar>, right: Vec<Scalar>, op: SetOp) -> Vec<Scalar> {
    let mut values: Vec<Scalar> = match op {
        SetOp::Union => {
            let mut set: IndexSet<Scalar> = left.into_iter().collect();
            set.extend(right);
            set.into_iter().collect()
        }
        SetOp::Intersection => {
            let right: HashSet<Scalar> = right.into_iter().collect();
            let set: IndexSet<Scalar> = left.into_iter().filter(|v| right.contains(v)).collect();
            set.into_iter().collect()
        }
    };
    try_sort(&mut values);
    values
}

fn elementwise_equal(left: &Array, right: &Array) -> bool {
    left.shape() == right.shape()
        && (left.shares_memory(right)
            || left.iter().zip(right.iter()).all(|(a, b)| a == b || a.value_eq(&b)))
}

/// Identity short-circuits shared by the 1D and 2D paths.
fn short_circuit(
    left: &Array,
    right: &Array,
    dtype: DType,
    op: SetOp,
    assume_unique: bool,
) -> Result<Option<Array>, ArrayError> {
    if op == SetOp::Intersection && (left.is_empty() || right.is_empty()) {
        return Array::empty(dtype).map(Some);
    }
    if !assume_unique {
        return Ok(None);
    }
    if op == SetOp::Union {
        if left.is_empty() {
            return Ok(Some(right.clone()));
        }
        if right.is_empty() {
            return Ok(Some(left.clone()));
        }
    }
    if elementwise_equal(left, right) {
        debug!(len = left.len(), "set operation on identical operands keeps order");
        return Ok(Some(left.clone()));
    }
    Ok(None)
}

fn set_1d(left: &Array, right: &Array, op: SetOp, assume_unique: bool) -> Result<Array, ArrayError> {
    let dtype = resolve_dtype(left.dtype(), right.dtype());
    if let Some(done) = short_circuit(left, right, dtype, op, assume_unique)? {
        return Ok(done);
    }
    if left.dtype().is_string() != right.dtype().is_string() || dtype.is_object() {
        debug!(%dtype, "set operation falls back to hashing");
        let values = combine(left.to_vec(), right.to_vec(), op);
        return iterable_to_array(values, Some(dtype));
    }
    let values = combine(
        left.astype(dtype)?.to_vec(),
        right.astype(dtype)?.to_vec(),
        op,
    );
    Array::from_scalars(&values, dtype)
}

/// Union of two 1D arrays. Identical operands under `assume_unique` come
/// back unchanged, preserving their order; other results are sorted when
/// orderable.
pub fn union1d(array: &Array, other: &Array, assume_unique: bool) -> Result<Array, ArrayError> {
    set_1d(array, other, SetOp::Union, assume_unique)
}

pub fn intersect1d(array: &Array, other: &Array, assume_unique: bool) -> Result<Array, ArrayError> {
    set_1d(array, other, SetOp::Intersection, assume_unique)
}

/// Rows of a 2D array, or the elements of a 1D array of tuples.
fn row_keys(array: &Array) -> Vec<Scalar> {
    if array.ndim() == 1 {
        return array.to_vec();
    }
    array.to_rows().into_iter().map(Scalar::Tuple).collect()
}

fn rows_to_array(rows: Vec<Scalar>, width: usize, dtype: DType) -> Result<Array, ArrayError> {
    let n = rows.len();
    let mut by_row: Vec<Vec<Scalar>> = Vec::with_capacity(n);
    for row in rows {
        match row {
            Scalar::Tuple(values) => by_row.push(values),
            other => by_row.push(vec![other]),
        }
    }
    let mut values = Vec::with_capacity(n * width);
    for col in 0..width {
        for row in &by_row {
            values.push(row.get(col).cloned().unwrap_or(Scalar::None));
        }
    }
    Array::from_shape_scalars(Shape::Two(n, width), &values, dtype)
}

fn set_2d(left: &Array, right: &Array, op: SetOp, assume_unique: bool) -> Result<Array, ArrayError> {
    let dtype = resolve_dtype(left.dtype(), right.dtype());
    if let Some(done) = short_circuit(left, right, dtype, op, assume_unique)? {
        return Ok(done);
    }
    if dtype.is_object() {
        debug!("row set operation falls back to tuples");
        let values = combine(row_keys(left), row_keys(right), op);
        return Array::from_scalars(&values, DType::Object);
    }
    for operand in [left, right] {
        if operand.ndim() != 2 {
            return Err(ArrayError::ExpectedRank {
                expected: 2,
                found: operand.ndim(),
            });
        }
    }
    if left.shape().cols() != right.shape().cols() {
        return Err(ArrayError::ShapeMismatch {
            left: left.shape(),
            right: right.shape(),
        });
    }
    let width = left.shape().cols();
    let values = combine(
        row_keys(&left.astype(dtype)?),
        row_keys(&right.astype(dtype)?),
        op,
    );
    rows_to_array(values, width, dtype)
}

/// Row-wise union. Object operands, 2D or 1D arrays of tuples, give a 1D
/// object array of tuples; other operands must both be 2D of equal width.
pub fn union2d(array: &Array, other: &Array, assume_unique: bool) -> Result<Array, ArrayError> {
    set_2d(array, other, SetOp::Union, assume_unique)
}

pub fn intersect2d(array: &Array, other: &Array, assume_unique: bool) -> Result<Array, ArrayError> {
    set_2d(array, other, SetOp::Intersection, assume_unique)
}

/// Fold a set operation over arrays of one rank. An intersection stops at
/// the first empty result.
pub fn ufunc_set_iter<I>(arrays: I, union: bool, assume_unique: bool) -> Result<Array, ArrayError>
where
    I: IntoIterator<Item = Array>,
{
    let mut arrays = arrays.into_iter();
    let mut result = arrays.next().ok_or(ArrayError::NoOperands)?;
    let ndim = result.ndim();
    for array in arrays {
        if array.ndim() != ndim {
            return Err(ArrayError::ExpectedRank {
                expected: ndim,
                found: array.ndim(),
            });
        }
        result = match (ndim, union) {
            (1, true) => union1d(&result, &array, assume_unique)?,
            (1, false) => intersect1d(&result, &array, assume_unique)?,
            (_, true) => union2d(&result, &array, assume_unique)?,
            (_, false) => intersect2d(&result, &array, assume_unique)?,
        };
        if !union && result.is_empty() {
            break;
        }
    }
    Ok(result)
}

/// Distinct elements, flattened: sorted when orderable, otherwise in order
/// of first appearance.
pub fn ufunc_unique(array: &Array) -> Result<Array, ArrayError> {
    let set: IndexSet<Scalar> = array.iter().collect();
    let mut values: Vec<Scalar> = set.into_iter().collect();
    try_sort(&mut values);
    Array::from_scalars(&values, array.dtype())
}

// ── Membership ─────────────────────────────────────────────────────────

/// Key under which equal-valued scalars of different representations meet:
/// integral floats and bools become ints, temporal values move to
/// nanoseconds where representable.
fn member_key(value: &Scalar) -> Option<Scalar> {
    if value.is_nan() || value.is_nat() {
        return None;
    }
    Some(match value {
        Scalar::Bool(v) => Scalar::Int(i64::from(*v)),
        Scalar::UInt(v) => i64::try_from(*v).map_or(Scalar::UInt(*v), Scalar::Int),
        Scalar::Float(v) => real_key(*v),
        Scalar::Complex(c) if c.im == 0.0 => real_key(c.re),
        Scalar::DateTime(v, unit) => convert_datetime(*v, *unit, TimeUnit::Nanosecond)
            .map_or_else(|| value.clone(), |ns| Scalar::DateTime(ns, TimeUnit::Nanosecond)),
        Scalar::TimeDelta(v, unit) => convert_timedelta(*v, *unit, TimeUnit::Nanosecond)
            .map_or_else(|| value.clone(), |ns| Scalar::TimeDelta(ns, TimeUnit::Nanosecond)),
        Scalar::Tuple(values) => {
            Scalar::Tuple(values.iter().map(|v| member_key(v).unwrap_or_else(|| v.clone())).collect())
        }
        other => other.clone(),
    })
}

fn real_key(v: f64) -> Scalar {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Scalar::Int(v as i64)
    } else {
        Scalar::Float(v)
    }
}

/// Per-element membership in `other`, with the shape of `array`. NaN and
/// NaT are never members.
#[must_use]
pub fn isin(array: &Array, other: &[Scalar]) -> Array {
    let shape = array.shape();
    if other.is_empty() {
        return Array::from_bools(vec![false; array.size()]).reshaped(shape);
    }
    let members: HashSet<Scalar> = other.iter().filter_map(member_key).collect();
    let flags = array
        .iter()
        .map(|v| member_key(&v).is_some_and(|k| members.contains(&k)))
        .collect();
    Array::from_bools(flags).reshaped(shape)
}

#[cfg(test)]
mod tests {
    use sf_types::{DType, Scalar};

    use super::{
        intersect1d, intersect2d, isin, ufunc_set_iter, ufunc_unique, union1d, union2d,
    };
    use crate::ArrayError;
    use crate::array::{Array, Shape};

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int).collect()
    }

    fn strs(values: &[&str]) -> Vec<Scalar> {
        values.iter().map(|s| Scalar::str(*s)).collect()
    }

    fn str_rows(rows: &[[&str; 2]]) -> Array {
        let rows: Vec<Vec<Scalar>> = rows.iter().map(|r| strs(r)).collect();
        Array::from_rows(&rows, DType::Str(0)).expect("rows")
    }

    #[test]
    fn identical_operands_keep_their_order() {
        let a = Array::from_strs(&["c", "a", "b"]);
        let b = Array::from_strs(&["c", "a", "b"]);
        let u = union1d(&a, &b, true).expect("union");
        assert_eq!(u.to_vec(), strs(&["c", "a", "b"]));
        assert!(u.shares_memory(&a));
        let sorted = union1d(&a, &b, false).expect("union");
        assert_eq!(sorted.to_vec(), strs(&["a", "b", "c"]));
    }

    #[test]
    fn bool_and_int_union_goes_through_object() {
        let a = Array::from_bools(vec![false, true, false]);
        let b = Array::from_i64s(vec![2, 3]);
        let u = union1d(&a, &b, false).expect("union");
        assert_eq!(u.dtype(), DType::Object);
        assert_eq!(
            u.to_vec(),
            vec![Scalar::Bool(false), Scalar::Bool(true), Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn string_union_sorts_and_widens() {
        let a = Array::from_strs(&["a", "b", "c"]);
        let b = Array::from_strs(&["aaa", "bbb", "ccc"]);
        let u = union1d(&a, &b, false).expect("union");
        assert_eq!(u.dtype(), DType::Str(3));
        assert_eq!(u.to_vec(), strs(&["a", "aaa", "b", "bbb", "c", "ccc"]));
    }

    #[test]
    fn union_with_empty_returns_the_other_operand() {
        let empty = Array::empty(DType::Float64).expect("empty");
        let big = Array::from_scalars(&[Scalar::UInt(9_007_199_254_740_993)], DType::UInt64)
            .expect("uint");
        let u = union1d(&empty, &big, true).expect("union");
        assert_eq!(u.dtype(), DType::UInt64);
        assert_eq!(u.to_vec(), vec![Scalar::UInt(9_007_199_254_740_993)]);
    }

    #[test]
    fn intersection_with_empty_is_empty_of_resolved_dtype() {
        let empty = Array::empty(DType::Int64).expect("empty");
        let f = Array::from_f64s(vec![1.0]);
        let i = intersect1d(&f, &empty, true).expect("intersect");
        assert_eq!(i.len(), 0);
        assert_eq!(i.dtype(), DType::Float64);
    }

    #[test]
    fn mixed_string_and_number_intersection() {
        let a = Array::from_scalars(&[Scalar::str("a"), Scalar::Int(1)], DType::Object)
            .expect("object");
        let b = Array::from_i64s(vec![1, 2]);
        let i = intersect1d(&a, &b, false).expect("intersect");
        assert_eq!(i.to_vec(), ints(&[1]));
    }

    #[test]
    fn row_intersection_of_strings() {
        let a = str_rows(&[["a", "b"], ["c", "d"], ["e", "f"]]);
        let b = str_rows(&[["a", "g"], ["c", "d"], ["e", "f"]]);
        let i = intersect2d(&a, &b, false).expect("intersect");
        assert_eq!(i.shape(), Shape::Two(2, 2));
        assert_eq!(i.to_rows(), vec![strs(&["c", "d"]), strs(&["e", "f"])]);
    }

    #[test]
    fn row_union_sorts_without_assume_unique() {
        let a = Array::from_rows(&[ints(&[3, 1]), ints(&[0, 1])], DType::Int64).expect("rows");
        let u = union2d(&a, &a, false).expect("union");
        assert_eq!(u.to_rows(), vec![ints(&[0, 1]), ints(&[3, 1])]);
        let kept = union2d(&a, &a, true).expect("union");
        assert_eq!(kept.to_rows(), vec![ints(&[3, 1]), ints(&[0, 1])]);
    }

    #[test]
    fn object_rows_become_tuples() {
        let a = Array::from_scalars(
            &[Scalar::tuple([Scalar::str("x"), Scalar::Int(1)])],
            DType::Object,
        )
        .expect("tuples");
        let b = Array::from_rows(&[vec![Scalar::str("x"), Scalar::Int(2)]], DType::Object)
            .expect("rows");
        let u = union2d(&a, &b, false).expect("union");
        assert_eq!(u.ndim(), 1);
        assert_eq!(
            u.to_vec(),
            vec![
                Scalar::tuple([Scalar::str("x"), Scalar::Int(1)]),
                Scalar::tuple([Scalar::str("x"), Scalar::Int(2)]),
            ]
        );
    }

    #[test]
    fn non_object_rows_need_two_dimensions() {
        let a = Array::arange(2);
        let b = Array::from_rows(&[ints(&[1, 2])], DType::Int64).expect("rows");
        assert!(matches!(
            union2d(&a, &b, false),
            Err(ArrayError::ExpectedRank { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn set_iter_folds_and_short_circuits() {
        let arrays = vec![
            Array::from_i64s(vec![1, 2, 3]),
            Array::from_i64s(vec![2, 3, 4]),
            Array::from_i64s(vec![3, 9]),
        ];
        let i = ufunc_set_iter(arrays.clone(), false, false).expect("intersect");
        assert_eq!(i.to_vec(), ints(&[3]));
        let u = ufunc_set_iter(arrays, true, false).expect("union");
        assert_eq!(u.to_vec(), ints(&[1, 2, 3, 4, 9]));

        let disjoint = vec![Array::arange(2), Array::from_i64s(vec![5]), Array::arange(4)];
        assert_eq!(ufunc_set_iter(disjoint, false, false).expect("empty").len(), 0);
        assert!(matches!(
            ufunc_set_iter(Vec::new(), true, false),
            Err(ArrayError::NoOperands)
        ));
    }

    #[test]
    fn unique_sorts_when_possible() {
        let a = Array::from_i64s(vec![3, 1, 3, 2]);
        assert_eq!(ufunc_unique(&a).expect("unique").to_vec(), ints(&[1, 2, 3]));
        let mixed = Array::from_scalars(
            &[Scalar::str("b"), Scalar::Int(1), Scalar::str("b"), Scalar::None],
            DType::Object,
        )
        .expect("object");
        assert_eq!(
            ufunc_unique(&mixed).expect("unique").to_vec(),
            vec![Scalar::str("b"), Scalar::Int(1), Scalar::None]
        );
    }

    #[test]
    fn isin_matches_across_numeric_kinds() {
        let a = Array::from_i64s(vec![1, 2, 3]);
        let flags = isin(&a, &[Scalar::Float(2.0), Scalar::str("3")]);
        assert_eq!(
            flags.to_vec(),
            vec![Scalar::Bool(false), Scalar::Bool(true), Scalar::Bool(false)]
        );
        let none = isin(&a, &[]);
        assert!(!none.is_writeable());
        assert_eq!(none.to_vec(), vec![Scalar::Bool(false); 3]);

        let f = Array::from_f64s(vec![f64::NAN, 1.0]);
        assert_eq!(
            isin(&f, &[Scalar::Float(f64::NAN), Scalar::Int(1)]).to_vec(),
            vec![Scalar::Bool(false), Scalar::Bool(true)]
        );
    }
}
