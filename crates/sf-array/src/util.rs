use sf_types::{DType, Scalar, TimeUnit, resolve_dtype, resolve_dtype_iter};
use tracing::debug;

use crate::ArrayError;
use crate::array::{Array, ArrayData, Axis, Shape, build_data};

/// Dtype able to hold both the values of `dtype` and `fill`.
#[must_use]
pub fn fill_dtype(dtype: DType, fill: &Scalar) -> DType {
    let resolved = resolve_dtype(dtype, fill.natural_dtype());
    if resolved != dtype {
        debug!(from = %dtype, to = %resolved, fill = %fill, "fill value widens dtype");
    }
    resolved
}

/// Array of `shape` holding `fill`; `dtype`, when given, is widened to hold
/// the fill.
pub fn full_for_fill(dtype: Option<DType>, shape: Shape, fill: &Scalar) -> Result<Array, ArrayError> {
    let dtype = dtype.map_or_else(|| fill.natural_dtype(), |d| fill_dtype(d, fill));
    Array::full(shape, dtype, fill)
}

// ── Missingness ────────────────────────────────────────────────────────

/// Per-element null test with the input's shape.
///
/// Floats and complex test NaN, temporal kinds test NaT, objects test `None`
/// or NaN; other kinds are never null.
#[must_use]
pub fn isna_array(array: &Array) -> Array {
    let flags: Vec<bool> = match array.data() {
        ArrayData::Float(v) => v.iter().map(|x| x.is_nan()).collect(),
        ArrayData::Complex(v) => v.iter().map(|c| c.re.is_nan() || c.im.is_nan()).collect(),
        ArrayData::DateTime(v) | ArrayData::TimeDelta(v) => {
            v.iter().map(|&x| x == sf_types::NAT).collect()
        }
        ArrayData::Object(v) => v.iter().map(Scalar::is_na).collect(),
        other => vec![false; other.len()],
    };
    let shape = array.shape();
    Array::from_bools(flags).reshaped(shape)
}

// ── Roll and shift ─────────────────────────────────────────────────────

fn roll_positions(size: usize, shift: i64) -> Vec<usize> {
    let shift = shift.rem_euclid(size as i64) as usize;
    (0..size).map(|i| (i + size - shift) % size).collect()
}

/// Source position for each of `size` slots after shifting by `shift`;
/// vacated slots are `None`. Shifts beyond the length vacate everything.
#[must_use]
pub fn shift_positions(size: usize, shift: i64) -> Vec<Option<usize>> {
    let size = size as i64;
    let shift = shift.clamp(-size, size);
    (0..size)
        .map(|i| {
            let source = i - shift;
            (0..size).contains(&source).then_some(source as usize)
        })
        .collect()
}

/// Circular shift along the first axis. Always returns new storage.
#[must_use]
pub fn roll_1d(array: &Array, shift: i64) -> Array {
    let size = array.len();
    if size <= 1 || shift.rem_euclid(size.max(1) as i64) == 0 {
        return array.copy();
    }
    array
        .take_rows(&roll_positions(size, shift))
        .unwrap_or_else(|_| array.copy())
}

/// Circular shift along `axis`. Always returns new storage.
#[must_use]
pub fn roll_2d(array: &Array, shift: i64, axis: Axis) -> Array {
    match axis {
        Axis::Rows => roll_1d(array, shift),
        Axis::Columns => {
            let size = array.shape().cols();
            if array.ndim() == 1 || size <= 1 || shift.rem_euclid(size as i64) == 0 {
                return array.copy();
            }
            array
                .take_columns(&roll_positions(size, shift))
                .unwrap_or_else(|_| array.copy())
        }
    }
}

/// Shift along `axis`. With `wrap` this is a roll; otherwise vacated
/// positions receive `fill_value` and the dtype widens to hold it.
pub fn array_shift(
    array: &Array,
    shift: i64,
    axis: Axis,
    wrap: bool,
    fill_value: &Scalar,
) -> Result<Array, ArrayError> {
    if wrap {
        return Ok(roll_2d(array, shift, axis));
    }
    if shift == 0 {
        return Ok(array.copy());
    }
    let positions = shift_positions(array.shape().along(axis), shift);
    match axis {
        Axis::Rows => array.take_rows_with_fill(&positions, fill_value),
        Axis::Columns if array.ndim() == 2 => array.take_columns_with_fill(&positions, fill_value),
        Axis::Columns => Err(ArrayError::AxisInvalid { axis: 1 }),
    }
}

// ── Concatenation ──────────────────────────────────────────────────────

/// Concatenate along `axis` after resolving one dtype for all inputs; the
/// result is read-only. Along columns, 1D inputs count as single columns.
pub fn concat_resolved(arrays: &[Array], axis: Axis) -> Result<Array, ArrayError> {
    let first = arrays.first().ok_or(ArrayError::NothingToConcatenate)?;
    let dtype = resolve_dtype_iter(arrays.iter().map(Array::dtype))?;
    let cast: Vec<Array> = arrays
        .iter()
        .map(|a| a.astype(dtype))
        .collect::<Result<_, _>>()?;

    let all_1d = cast.iter().all(|a| a.ndim() == 1);
    match axis {
        Axis::Rows => {
            let cols = first.shape().cols();
            if let Some(bad) = cast.iter().find(|a| a.shape().cols() != cols) {
                return Err(ArrayError::ShapeMismatch {
                    left: first.shape(),
                    right: bad.shape(),
                });
            }
            let rows: usize = cast.iter().map(Array::len).sum();
            let mut data = ArrayData::with_capacity(dtype, rows * cols)?;
            for col in 0..cols {
                for part in &cast {
                    let column = if part.ndim() == 1 {
                        part.clone()
                    } else {
                        part.take_columns(&[col])?
                    };
                    let extended = data.extend_from(column.data());
                    debug_assert!(extended);
                }
            }
            let shape = if all_1d {
                Shape::One(rows)
            } else {
                Shape::Two(rows, cols)
            };
            Ok(Array::from_parts(data, dtype, shape))
        }
        Axis::Columns => {
            let rows = first.len();
            if let Some(bad) = cast.iter().find(|a| a.len() != rows) {
                return Err(ArrayError::ShapeMismatch {
                    left: first.shape(),
                    right: bad.shape(),
                });
            }
            let cols: usize = cast.iter().map(|a| a.shape().cols()).sum();
            let mut data = ArrayData::with_capacity(dtype, rows * cols)?;
            for part in &cast {
                let extended = data.extend_from(part.data());
                debug_assert!(extended);
            }
            Ok(Array::from_parts(data, dtype, Shape::Two(rows, cols)))
        }
    }
}

// ── Construction from iterables ────────────────────────────────────────

/// Outcome of sampling an iterable for its dtype.
///
/// `values` owns every element consumed from the source, so a single-pass
/// iterator can still be turned into an array afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeResolution {
    /// `Some(Object)` when the sample forces object; `None` leaves the dtype
    /// to inference over all values.
    pub dtype: Option<DType>,
    pub has_tuple: bool,
    pub values: Vec<Scalar>,
}

/// Sample up to `sample_size` leading values: tuples, or strings mixed with
/// non-strings, force object.
pub fn resolve_type_iter<I>(values: I, sample_size: usize) -> TypeResolution
where
    I: IntoIterator<Item = Scalar>,
{
    let mut buffer: Vec<Scalar> = Vec::new();
    let mut resolved = None;
    let mut has_tuple = false;
    let mut has_str = false;
    let mut has_non_str = false;

    for value in values {
        if resolved.is_none() && buffer.len() < sample_size {
            match &value {
                Scalar::Tuple(_) => has_tuple = true,
                Scalar::Str(_) => has_str = true,
                _ => has_non_str = true,
            }
            if has_tuple || (has_str && has_non_str) {
                resolved = Some(DType::Object);
            }
        }
        buffer.push(value);
    }
    TypeResolution {
        dtype: resolved,
        has_tuple,
        values: buffer,
    }
}

/// Narrowest dtype holding every value in `values`.
#[must_use]
pub fn infer_element_dtype(values: &[Scalar]) -> DType {
    if values.is_empty() {
        return DType::Float64;
    }
    let mut str_width = None::<usize>;
    let mut bytes_width = None::<usize>;
    let mut dt_unit = None::<TimeUnit>;
    let mut td_unit = None::<TimeUnit>;
    let (mut has_bool, mut has_int, mut has_float, mut has_complex) = (false, false, false, false);
    let (mut has_negative, mut has_big) = (false, false);

    for value in values {
        match value {
            Scalar::None | Scalar::Tuple(_) => return DType::Object,
            Scalar::Bool(_) => has_bool = true,
            Scalar::Int(v) => {
                has_int = true;
                has_negative |= *v < 0;
            }
            Scalar::UInt(v) => {
                has_int = true;
                has_big |= *v > i64::MAX as u64;
            }
            Scalar::Float(_) => has_float = true,
            Scalar::Complex(_) => has_complex = true,
            Scalar::Str(s) => {
                str_width = Some(str_width.unwrap_or(0).max(s.chars().count()));
            }
            Scalar::Bytes(b) => bytes_width = Some(bytes_width.unwrap_or(0).max(b.len())),
            Scalar::DateTime(_, unit) => dt_unit = Some(dt_unit.map_or(*unit, |u| u.finer(*unit))),
            Scalar::TimeDelta(_, unit) => {
                td_unit = Some(td_unit.map_or(*unit, |u| u.finer(*unit)));
            }
        }
    }
    let numeric = has_bool || has_int || has_float || has_complex;
    let families = [
        numeric,
        str_width.is_some(),
        bytes_width.is_some(),
        dt_unit.is_some(),
        td_unit.is_some(),
    ];
    if families.iter().filter(|&&f| f).count() > 1 {
        return DType::Object;
    }
    if let Some(width) = str_width {
        return DType::Str(width.max(1));
    }
    if let Some(width) = bytes_width {
        return DType::Bytes(width.max(1));
    }
    if let Some(unit) = dt_unit {
        return DType::DateTime64(unit);
    }
    if let Some(unit) = td_unit {
        return DType::TimeDelta64(unit);
    }
    if has_complex {
        DType::Complex128
    } else if has_float {
        DType::Float64
    } else if has_big && has_negative {
        DType::Object
    } else if has_big {
        DType::UInt64
    } else if has_int {
        DType::Int64
    } else {
        DType::Bool
    }
}

/// Build a 1D array from any iterable without unwanted coercion: mixed
/// strings and tuples stay object; otherwise the dtype is inferred. An
/// explicit `dtype` is applied as given.
pub fn iterable_to_array<I>(values: I, dtype: Option<DType>) -> Result<Array, ArrayError>
where
    I: IntoIterator<Item = Scalar>,
{
    if let Some(dtype) = dtype {
        let values: Vec<Scalar> = values.into_iter().collect();
        return Array::from_scalars(&values, dtype);
    }
    let resolution = resolve_type_iter(values, 10);
    let dtype = resolution
        .dtype
        .unwrap_or_else(|| infer_element_dtype(&resolution.values));
    let (data, dtype) = build_data(&resolution.values, dtype)?;
    let n = resolution.values.len();
    Ok(Array::from_parts(data, dtype, Shape::One(n)))
}

#[cfg(test)]
mod tests {
    use sf_types::{DType, Scalar, TimeUnit};

    use super::{
        array_shift, concat_resolved, full_for_fill, infer_element_dtype, isna_array, iterable_to_array,
        resolve_type_iter, roll_1d, roll_2d, shift_positions,
    };
    use crate::array::{Array, Axis, Shape};

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int).collect()
    }

    fn grid(rows: usize, cols: usize) -> Array {
        let data: Vec<Vec<Scalar>> = (0..rows)
            .map(|r| (0..cols).map(|c| Scalar::Int((r * cols + c) as i64)).collect())
            .collect();
        Array::from_rows(&data, DType::Int64).expect("grid")
    }

    #[test]
    fn roll_1d_wraps_around() {
        let a = Array::from_i64s(vec![3, 4, 5, 6]);
        assert_eq!(roll_1d(&a, 1).to_vec(), ints(&[6, 3, 4, 5]));
        assert_eq!(roll_1d(&a, -1).to_vec(), ints(&[4, 5, 6, 3]));
        assert_eq!(roll_1d(&a, 4).to_vec(), a.to_vec());
        assert!(!roll_1d(&a, 0).shares_memory(&a));
        assert_eq!(roll_1d(&Array::from_f64s(vec![]), -4).len(), 0);
    }

    #[test]
    fn roll_2d_along_each_axis() {
        let a = grid(3, 4);
        assert_eq!(
            roll_2d(&a, -2, Axis::Rows).to_rows(),
            vec![ints(&[8, 9, 10, 11]), ints(&[0, 1, 2, 3]), ints(&[4, 5, 6, 7])]
        );
        assert_eq!(
            roll_2d(&a, -2, Axis::Columns).to_rows(),
            vec![ints(&[2, 3, 0, 1]), ints(&[6, 7, 4, 5]), ints(&[10, 11, 8, 9])]
        );
        let b = grid(2, 3);
        assert_eq!(
            roll_2d(&b, 1, Axis::Columns).to_rows(),
            vec![ints(&[2, 0, 1]), ints(&[5, 3, 4])]
        );
    }

    #[test]
    fn extreme_shifts_vacate_every_slot() {
        assert_eq!(shift_positions(3, 1), vec![None, Some(0), Some(1)]);
        assert_eq!(shift_positions(3, -1), vec![Some(1), Some(2), None]);
        assert_eq!(shift_positions(3, i64::MIN), vec![None; 3]);
        assert_eq!(shift_positions(3, i64::MAX), vec![None; 3]);
        let shifted = array_shift(&Array::arange(3), i64::MIN, Axis::Rows, false, &Scalar::Int(-1))
            .expect("shift");
        assert_eq!(shifted.to_vec(), vec![Scalar::Int(-1); 3]);
    }

    #[test]
    fn shift_without_wrap_fills_and_widens() {
        let a = Array::arange(6);
        let wrapped = array_shift(&a, 2, Axis::Rows, true, &Scalar::None).expect("roll");
        assert_eq!(wrapped.to_vec(), ints(&[4, 5, 0, 1, 2, 3]));

        let filled = array_shift(&a, 2, Axis::Rows, false, &Scalar::Int(-1)).expect("fill");
        assert_eq!(filled.to_vec(), ints(&[-1, -1, 0, 1, 2, 3]));
        assert_eq!(filled.dtype(), DType::Int64);

        let widened = array_shift(&a, -2, Axis::Rows, false, &Scalar::Float(1.5)).expect("fill");
        assert_eq!(widened.dtype(), DType::Float64);
        assert_eq!(widened.get(5), Some(Scalar::Float(1.5)));
        assert_eq!(widened.get(0), Some(Scalar::Float(2.0)));
    }

    #[test]
    fn shift_strings_widen_width() {
        let rows: Vec<Vec<Scalar>> = [["a", "b", "e", "d"], ["c", "d", "f", "w"], ["e", "f", "s", "q"]]
            .iter()
            .map(|r| r.iter().map(|s| Scalar::str(*s)).collect())
            .collect();
        let a = Array::from_rows(&rows, DType::Str(0)).expect("rows");
        let shifted = array_shift(&a, 2, Axis::Columns, false, &Scalar::str("XX")).expect("fill");
        assert_eq!(shifted.dtype(), DType::Str(2));
        assert_eq!(
            shifted.row(0).expect("row").to_vec(),
            vec![Scalar::str("XX"), Scalar::str("XX"), Scalar::str("a"), Scalar::str("b")]
        );
    }

    #[test]
    fn isna_by_family() {
        let floats = Array::from_f64s(vec![1.0, f64::NAN]);
        assert_eq!(isna_array(&floats).to_vec(), vec![Scalar::Bool(false), Scalar::Bool(true)]);
        let objects =
            Array::from_scalars(&[Scalar::None, Scalar::Int(1), Scalar::Float(f64::NAN)], DType::Object)
                .expect("object");
        assert_eq!(
            isna_array(&objects).to_vec(),
            vec![Scalar::Bool(true), Scalar::Bool(false), Scalar::Bool(true)]
        );
        let dates = Array::from_scalars(
            &[Scalar::nat(TimeUnit::Day), Scalar::DateTime(3, TimeUnit::Day)],
            DType::DateTime64(TimeUnit::Day),
        )
        .expect("dates");
        assert_eq!(isna_array(&dates).get(0), Some(Scalar::Bool(true)));
        assert_eq!(isna_array(&Array::arange(2)).to_vec(), vec![Scalar::Bool(false); 2]);
    }

    #[test]
    fn concat_resolves_dtype_and_is_read_only() {
        let a = Array::arange(2);
        let b = Array::from_f64s(vec![0.5]);
        let rows = concat_resolved(&[a.clone(), b], Axis::Rows).expect("concat");
        assert_eq!(rows.dtype(), DType::Float64);
        assert_eq!(rows.len(), 3);
        assert!(!rows.is_writeable());

        let cols = concat_resolved(&[a.clone(), a.clone()], Axis::Columns).expect("concat");
        assert_eq!(cols.shape(), Shape::Two(2, 2));

        let mixed = concat_resolved(&[a, Array::from_strs(&["x"])], Axis::Rows).expect("concat");
        assert_eq!(mixed.dtype(), DType::Object);
    }

    #[test]
    fn full_for_fill_widens_to_the_fill() {
        let a = full_for_fill(Some(DType::Int64), Shape::One(2), &Scalar::Float(f64::NAN))
            .expect("full");
        assert_eq!(a.dtype(), DType::Float64);
        let b = full_for_fill(None, Shape::Two(2, 2), &Scalar::str("ab")).expect("full");
        assert_eq!(b.dtype(), DType::Str(2));
    }

    #[test]
    fn type_sampling_buffers_single_pass_iterators() {
        let source = (0..20).map(Scalar::Int);
        let resolution = resolve_type_iter(source, 10);
        assert_eq!(resolution.dtype, None);
        assert_eq!(resolution.values.len(), 20);

        let mixed = vec![Scalar::str("a"), Scalar::Int(1), Scalar::Int(2)];
        let resolution = resolve_type_iter(mixed.into_iter(), 10);
        assert_eq!(resolution.dtype, Some(DType::Object));
        assert_eq!(resolution.values.len(), 3);

        let tuples = vec![Scalar::Int(1), Scalar::tuple([1, 2])];
        assert!(resolve_type_iter(tuples, 10).has_tuple);
    }

    #[test]
    fn iterable_to_array_avoids_coercion() {
        let mixed = iterable_to_array(vec![Scalar::str("a"), Scalar::Int(1)], None).expect("array");
        assert_eq!(mixed.dtype(), DType::Object);
        assert_eq!(mixed.get(1), Some(Scalar::Int(1)));

        let floats = iterable_to_array(vec![Scalar::Int(1), Scalar::Float(2.5)], None).expect("array");
        assert_eq!(floats.dtype(), DType::Float64);

        let strs = iterable_to_array(vec![Scalar::str("a"), Scalar::str("bbb")], None).expect("array");
        assert_eq!(strs.dtype(), DType::Str(3));

        assert_eq!(infer_element_dtype(&[Scalar::UInt(u64::MAX), Scalar::Int(-1)]), DType::Object);
        assert_eq!(infer_element_dtype(&[Scalar::Float(1.0), Scalar::None]), DType::Object);
        assert_eq!(infer_element_dtype(&[]), DType::Float64);

        let given = iterable_to_array(vec![Scalar::Int(1)], Some(DType::Float32)).expect("array");
        assert_eq!(given.dtype(), DType::Float32);
    }
}
