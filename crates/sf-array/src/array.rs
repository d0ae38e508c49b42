use std::fmt;
use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sf_types::{DType, Scalar, TimeUnit, cast_scalar};

use crate::ArrayError;
use crate::key::ILocKey;

/// Dispatch `$body` over every storage variant with `$v` bound to the vector.
macro_rules! each_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::array::ArrayData::Bool($v) => $body,
            $crate::array::ArrayData::Int($v) => $body,
            $crate::array::ArrayData::UInt($v) => $body,
            $crate::array::ArrayData::Float($v) => $body,
            $crate::array::ArrayData::Complex($v) => $body,
            $crate::array::ArrayData::Str($v) => $body,
            $crate::array::ArrayData::Bytes($v) => $body,
            $crate::array::ArrayData::DateTime($v) => $body,
            $crate::array::ArrayData::TimeDelta($v) => $body,
            $crate::array::ArrayData::Object($v) => $body,
        }
    };
}

/// Like `each_variant!`, re-wrapping the produced vector in the same variant.
macro_rules! map_variant {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::array::ArrayData::Bool($v) => $crate::array::ArrayData::Bool($body),
            $crate::array::ArrayData::Int($v) => $crate::array::ArrayData::Int($body),
            $crate::array::ArrayData::UInt($v) => $crate::array::ArrayData::UInt($body),
            $crate::array::ArrayData::Float($v) => $crate::array::ArrayData::Float($body),
            $crate::array::ArrayData::Complex($v) => $crate::array::ArrayData::Complex($body),
            $crate::array::ArrayData::Str($v) => $crate::array::ArrayData::Str($body),
            $crate::array::ArrayData::Bytes($v) => $crate::array::ArrayData::Bytes($body),
            $crate::array::ArrayData::DateTime($v) => $crate::array::ArrayData::DateTime($body),
            $crate::array::ArrayData::TimeDelta($v) => {
                $crate::array::ArrayData::TimeDelta($body)
            }
            $crate::array::ArrayData::Object($v) => $crate::array::ArrayData::Object($body),
        }
    };
}

/// Dispatch over two storages of the same variant; `$fallback` otherwise.
macro_rules! zip_variant {
    ($a:expr, $b:expr, $x:ident, $y:ident => $body:expr, else $fallback:expr) => {
        match ($a, $b) {
            ($crate::array::ArrayData::Bool($x), $crate::array::ArrayData::Bool($y)) => $body,
            ($crate::array::ArrayData::Int($x), $crate::array::ArrayData::Int($y)) => $body,
            ($crate::array::ArrayData::UInt($x), $crate::array::ArrayData::UInt($y)) => $body,
            ($crate::array::ArrayData::Float($x), $crate::array::ArrayData::Float($y)) => $body,
            ($crate::array::ArrayData::Complex($x), $crate::array::ArrayData::Complex($y)) => {
                $body
            }
            ($crate::array::ArrayData::Str($x), $crate::array::ArrayData::Str($y)) => $body,
            ($crate::array::ArrayData::Bytes($x), $crate::array::ArrayData::Bytes($y)) => $body,
            (
                $crate::array::ArrayData::DateTime($x),
                $crate::array::ArrayData::DateTime($y),
            ) => $body,
            (
                $crate::array::ArrayData::TimeDelta($x),
                $crate::array::ArrayData::TimeDelta($y),
            ) => $body,
            ($crate::array::ArrayData::Object($x), $crate::array::ArrayData::Object($y)) => $body,
            _ => $fallback,
        }
    };
}

/// Like `zip_variant!`, re-wrapping the produced vector; `None` on mismatch.
macro_rules! zip_map_variant {
    ($a:expr, $b:expr, $x:ident, $y:ident => $body:expr) => {
        match ($a, $b) {
            (ArrayData::Bool($x), ArrayData::Bool($y)) => Some(ArrayData::Bool($body)),
            (ArrayData::Int($x), ArrayData::Int($y)) => Some(ArrayData::Int($body)),
            (ArrayData::UInt($x), ArrayData::UInt($y)) => Some(ArrayData::UInt($body)),
            (ArrayData::Float($x), ArrayData::Float($y)) => Some(ArrayData::Float($body)),
            (ArrayData::Complex($x), ArrayData::Complex($y)) => Some(ArrayData::Complex($body)),
            (ArrayData::Str($x), ArrayData::Str($y)) => Some(ArrayData::Str($body)),
            (ArrayData::Bytes($x), ArrayData::Bytes($y)) => Some(ArrayData::Bytes($body)),
            (ArrayData::DateTime($x), ArrayData::DateTime($y)) => Some(ArrayData::DateTime($body)),
            (ArrayData::TimeDelta($x), ArrayData::TimeDelta($y)) => {
                Some(ArrayData::TimeDelta($body))
            }
            (ArrayData::Object($x), ArrayData::Object($y)) => Some(ArrayData::Object($body)),
            _ => None,
        }
    };
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    One(usize),
    Two(usize, usize),
}

impl Shape {
    /// Shape from a dimension list; only ranks 1 and 2 exist.
    pub fn from_dims(dims: &[usize]) -> Result<Self, ArrayError> {
        match *dims {
            [n] => Ok(Self::One(n)),
            [rows, cols] => Ok(Self::Two(rows, cols)),
            _ => Err(ArrayError::RankUnsupported { ndim: dims.len() }),
        }
    }

    #[must_use]
    pub const fn ndim(self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Two(..) => 2,
        }
    }

    #[must_use]
    pub const fn rows(self) -> usize {
        match self {
            Self::One(n) | Self::Two(n, _) => n,
        }
    }

    /// Column count; a 1D shape counts as one column.
    #[must_use]
    pub const fn cols(self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Two(_, cols) => cols,
        }
    }

    #[must_use]
    pub const fn size(self) -> usize {
        self.rows() * self.cols()
    }

    #[must_use]
    pub const fn along(self, axis: Axis) -> usize {
        match axis {
            Axis::Rows => self.rows(),
            Axis::Columns => self.cols(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(n) => write!(f, "({n},)"),
            Self::Two(rows, cols) => write!(f, "({rows}, {cols})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Rows,
    Columns,
}

impl Axis {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Rows => 0,
            Self::Columns => 1,
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Rows => Self::Columns,
            Self::Columns => Self::Rows,
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = ArrayError;

    fn try_from(axis: usize) -> Result<Self, Self::Error> {
        match axis {
            0 => Ok(Self::Rows),
            1 => Ok(Self::Columns),
            _ => Err(ArrayError::AxisInvalid { axis }),
        }
    }
}

/// Typed element storage. Integer dtypes of every width share `Int`/`UInt`,
/// with values kept inside the declared width.
#[derive(Debug, Clone)]
pub enum ArrayData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
    Complex(Vec<Complex64>),
    Str(Vec<String>),
    Bytes(Vec<Vec<u8>>),
    DateTime(Vec<i64>),
    TimeDelta(Vec<i64>),
    Object(Vec<Scalar>),
}

fn time_unit(dtype: DType) -> TimeUnit {
    match dtype {
        DType::DateTime64(unit) | DType::TimeDelta64(unit) => unit,
        _ => TimeUnit::Nanosecond,
    }
}

impl ArrayData {
    pub(crate) fn with_capacity(dtype: DType, capacity: usize) -> Result<Self, ArrayError> {
        Ok(match dtype {
            DType::Bool => Self::Bool(Vec::with_capacity(capacity)),
            DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => {
                Self::Int(Vec::with_capacity(capacity))
            }
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => {
                Self::UInt(Vec::with_capacity(capacity))
            }
            DType::Float32 | DType::Float64 => Self::Float(Vec::with_capacity(capacity)),
            DType::Complex64 | DType::Complex128 => Self::Complex(Vec::with_capacity(capacity)),
            DType::Str(_) => Self::Str(Vec::with_capacity(capacity)),
            DType::Bytes(_) => Self::Bytes(Vec::with_capacity(capacity)),
            DType::DateTime64(_) => Self::DateTime(Vec::with_capacity(capacity)),
            DType::TimeDelta64(_) => Self::TimeDelta(Vec::with_capacity(capacity)),
            DType::Object => Self::Object(Vec::with_capacity(capacity)),
            DType::Void(_) => return Err(sf_types::TypeError::UnsupportedDtype { dtype }.into()),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn scalar(&self, i: usize, dtype: DType) -> Scalar {
        match self {
            Self::Bool(v) => Scalar::Bool(v[i]),
            Self::Int(v) => Scalar::Int(v[i]),
            Self::UInt(v) => Scalar::UInt(v[i]),
            Self::Float(v) => Scalar::Float(v[i]),
            Self::Complex(v) => Scalar::Complex(v[i]),
            Self::Str(v) => Scalar::Str(v[i].clone()),
            Self::Bytes(v) => Scalar::Bytes(v[i].clone()),
            Self::DateTime(v) => Scalar::DateTime(v[i], time_unit(dtype)),
            Self::TimeDelta(v) => Scalar::TimeDelta(v[i], time_unit(dtype)),
            Self::Object(v) => v[i].clone(),
        }
    }

    /// Append a value already cast to this storage's dtype.
    fn push(&mut self, value: Scalar) -> bool {
        match (self, value) {
            (Self::Bool(v), Scalar::Bool(x)) => v.push(x),
            (Self::Int(v), Scalar::Int(x)) => v.push(x),
            (Self::UInt(v), Scalar::UInt(x)) => v.push(x),
            (Self::Float(v), Scalar::Float(x)) => v.push(x),
            (Self::Complex(v), Scalar::Complex(x)) => v.push(x),
            (Self::Str(v), Scalar::Str(x)) => v.push(x),
            (Self::Bytes(v), Scalar::Bytes(x)) => v.push(x),
            (Self::DateTime(v), Scalar::DateTime(x, _)) => v.push(x),
            (Self::TimeDelta(v), Scalar::TimeDelta(x, _)) => v.push(x),
            (Self::Object(v), x) => v.push(x),
            _ => return false,
        }
        true
    }

    fn replace(&mut self, i: usize, value: Scalar) -> bool {
        match (self, value) {
            (Self::Bool(v), Scalar::Bool(x)) => v[i] = x,
            (Self::Int(v), Scalar::Int(x)) => v[i] = x,
            (Self::UInt(v), Scalar::UInt(x)) => v[i] = x,
            (Self::Float(v), Scalar::Float(x)) => v[i] = x,
            (Self::Complex(v), Scalar::Complex(x)) => v[i] = x,
            (Self::Str(v), Scalar::Str(x)) => v[i] = x,
            (Self::Bytes(v), Scalar::Bytes(x)) => v[i] = x,
            (Self::DateTime(v), Scalar::DateTime(x, _)) => v[i] = x,
            (Self::TimeDelta(v), Scalar::TimeDelta(x, _)) => v[i] = x,
            (Self::Object(v), x) => v[i] = x,
            _ => return false,
        }
        true
    }

    pub(crate) fn gather(&self, positions: &[usize]) -> Self {
        map_variant!(self, v => positions.iter().map(|&i| v[i].clone()).collect())
    }

    /// Gather where `None` positions take the single element of `fill`.
    pub(crate) fn gather_fill(&self, positions: &[Option<usize>], fill: &Self) -> Option<Self> {
        zip_map_variant!(self, fill, v, f => {
            let f = f.first()?;
            positions
                .iter()
                .map(|p| p.map_or_else(|| f.clone(), |i| v[i].clone()))
                .collect()
        })
    }

    pub(crate) fn extend_from(&mut self, other: &Self) -> bool {
        zip_variant!(self, other, x, y => {
            x.extend_from_slice(y);
            true
        }, else false)
    }
}

/// Build storage for `dtype` from scalars, sizing zero-width string dtypes to
/// fit.
pub(crate) fn build_data(values: &[Scalar], dtype: DType) -> Result<(ArrayData, DType), ArrayError> {
    let mut data = ArrayData::with_capacity(dtype, values.len())?;
    let mut width = 0;
    for value in values {
        let cast = cast_scalar(value, dtype)?;
        match &cast {
            Scalar::Str(s) => width = width.max(s.chars().count()),
            Scalar::Bytes(b) => width = width.max(b.len()),
            _ => {}
        }
        let pushed = data.push(cast);
        debug_assert!(pushed, "cast value must match storage for {dtype}");
    }
    let dtype = match dtype {
        DType::Str(0) => DType::Str(width.max(1)),
        DType::Bytes(0) => DType::Bytes(width.max(1)),
        other => other,
    };
    Ok((data, dtype))
}

/// Immutable-by-default 1D or 2D array.
///
/// 2D data is column-major, so a column is a contiguous run and an `n x 1`
/// array shares layout with its 1D counterpart. Storage sits behind an `Arc`;
/// derivations that do not change values share it.
#[derive(Debug, Clone)]
pub struct Array {
    dtype: DType,
    shape: Shape,
    data: Arc<ArrayData>,
    writeable: bool,
}

impl Array {
    pub(crate) fn from_parts(data: ArrayData, dtype: DType, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.size());
        Self {
            dtype,
            shape,
            data: Arc::new(data),
            writeable: false,
        }
    }

    pub fn from_scalars(values: &[Scalar], dtype: DType) -> Result<Self, ArrayError> {
        Self::from_shape_scalars(Shape::One(values.len()), values, dtype)
    }

    /// Values are read column-major for 2D shapes.
    pub fn from_shape_scalars(
        shape: Shape,
        values: &[Scalar],
        dtype: DType,
    ) -> Result<Self, ArrayError> {
        if values.len() != shape.size() {
            return Err(ArrayError::LengthMismatch {
                values: values.len(),
                shape,
            });
        }
        let (data, dtype) = build_data(values, dtype)?;
        Ok(Self::from_parts(data, dtype, shape))
    }

    /// 2D array from row-major rows of equal width.
    pub fn from_rows(rows: &[Vec<Scalar>], dtype: DType) -> Result<Self, ArrayError> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(ArrayError::LengthMismatch {
                values: row.len(),
                shape: Shape::Two(rows.len(), width),
            });
        }
        let mut values = Vec::with_capacity(rows.len() * width);
        for col in 0..width {
            values.extend(rows.iter().map(|row| row[col].clone()));
        }
        Self::from_shape_scalars(Shape::Two(rows.len(), width), &values, dtype)
    }

    #[must_use]
    pub fn from_bools(values: Vec<bool>) -> Self {
        let n = values.len();
        Self::from_parts(ArrayData::Bool(values), DType::Bool, Shape::One(n))
    }

    #[must_use]
    pub fn from_i64s(values: Vec<i64>) -> Self {
        let n = values.len();
        Self::from_parts(ArrayData::Int(values), DType::Int64, Shape::One(n))
    }

    #[must_use]
    pub fn from_f64s(values: Vec<f64>) -> Self {
        let n = values.len();
        Self::from_parts(ArrayData::Float(values), DType::Float64, Shape::One(n))
    }

    #[must_use]
    pub fn from_strs(values: &[&str]) -> Self {
        let width = values.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        let n = values.len();
        Self::from_parts(
            ArrayData::Str(values.iter().map(|s| (*s).to_owned()).collect()),
            DType::Str(width.max(1)),
            Shape::One(n),
        )
    }

    /// 1D object array holding `values` as given.
    #[must_use]
    pub fn from_objects(values: Vec<Scalar>) -> Self {
        let n = values.len();
        Self::from_parts(ArrayData::Object(values), DType::Object, Shape::One(n))
    }

    /// `0..n` as int64.
    #[must_use]
    pub fn arange(n: usize) -> Self {
        Self::from_i64s((0..n as i64).collect())
    }

    pub fn empty(dtype: DType) -> Result<Self, ArrayError> {
        Ok(Self::from_parts(
            ArrayData::with_capacity(dtype, 0)?,
            dtype,
            Shape::One(0),
        ))
    }

    /// Array of `shape` holding `fill` cast to `dtype`.
    pub fn full(shape: Shape, dtype: DType, fill: &Scalar) -> Result<Self, ArrayError> {
        let (one, dtype) = build_data(std::slice::from_ref(fill), dtype)?;
        let positions = vec![0; shape.size()];
        Ok(Self::from_parts(one.gather(&positions), dtype, shape))
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Length of the first axis.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape.rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.size() == 0
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[must_use]
    pub fn is_writeable(&self) -> bool {
        self.writeable
    }

    #[must_use]
    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Whether both arrays are views of the same storage.
    #[must_use]
    pub fn shares_memory(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Element by flat (column-major) position.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Scalar> {
        (i < self.size()).then(|| self.data.scalar(i, self.dtype))
    }

    #[must_use]
    pub fn get2(&self, row: usize, col: usize) -> Option<Scalar> {
        if row >= self.shape.rows() || col >= self.shape.cols() {
            return None;
        }
        Some(self.data.scalar(col * self.shape.rows() + row, self.dtype))
    }

    /// Elements in flat (column-major) order.
    pub fn iter(&self) -> impl Iterator<Item = Scalar> + '_ {
        (0..self.size()).map(move |i| self.data.scalar(i, self.dtype))
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Scalar> {
        self.iter().collect()
    }

    /// Row-major list of rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Scalar>> {
        (0..self.shape.rows())
            .map(|r| {
                (0..self.shape.cols())
                    .map(|c| self.data.scalar(c * self.shape.rows() + r, self.dtype))
                    .collect()
            })
            .collect()
    }

    /// Same dtype, shape and elements, with NaN matching NaN.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.shape == other.shape
            && (self.shares_memory(other) || self.iter().eq(other.iter()))
    }

    // ── Mutability ─────────────────────────────────────────────────────

    /// Write one element by flat position. Fails on read-only arrays.
    pub fn set(&mut self, i: usize, value: &Scalar) -> Result<(), ArrayError> {
        if !self.writeable {
            return Err(ArrayError::Immutable);
        }
        if i >= self.size() {
            return Err(ArrayError::PositionOutOfBounds {
                position: i as i64,
                len: self.size(),
            });
        }
        let cast = cast_scalar(value, self.dtype)?;
        let replaced = Arc::make_mut(&mut self.data).replace(i, cast);
        debug_assert!(replaced);
        Ok(())
    }

    /// A writeable copy with its own storage.
    #[must_use]
    pub fn to_mutable(&self) -> Self {
        Self {
            dtype: self.dtype,
            shape: self.shape,
            data: Arc::new(self.data.as_ref().clone()),
            writeable: true,
        }
    }

    /// Clear the write flag without copying.
    #[must_use]
    pub fn freeze(mut self) -> Self {
        self.writeable = false;
        self
    }

    /// A read-only copy with its own storage.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self::from_parts(self.data.as_ref().clone(), self.dtype, self.shape)
    }

    // ── Casting and reshaping ──────────────────────────────────────────

    /// Same storage under a shape of equal size.
    pub(crate) fn reshaped(mut self, shape: Shape) -> Self {
        debug_assert_eq!(self.size(), shape.size());
        self.shape = shape;
        self
    }

    /// Cast to `dtype`; a no-op cast shares storage.
    pub fn astype(&self, dtype: DType) -> Result<Self, ArrayError> {
        if dtype == self.dtype {
            return Ok(self.clone());
        }
        let values = self.to_vec();
        let (data, dtype) = build_data(&values, dtype)?;
        Ok(Self::from_parts(data, dtype, self.shape))
    }

    /// Re-view a 1D array as `n x 1` without copying.
    #[must_use]
    pub fn column_2d_filter(&self) -> Self {
        let mut out = self.clone();
        if let Shape::One(n) = self.shape {
            out.shape = Shape::Two(n, 1);
        }
        out
    }

    /// Re-view an `n x 1` array as 1D without copying.
    #[must_use]
    pub fn column_1d_filter(&self) -> Self {
        let mut out = self.clone();
        if let Shape::Two(n, 1) = self.shape {
            out.shape = Shape::One(n);
        }
        out
    }

    /// A `1 x n` array as 1D over the same storage.
    #[must_use]
    pub fn row_1d_filter(&self) -> Self {
        match self.shape {
            Shape::Two(1, n) => {
                let mut out = self.clone();
                out.shape = Shape::One(n);
                out
            }
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        match self.shape {
            Shape::One(_) => self.clone(),
            Shape::Two(rows, cols) => {
                let positions: Vec<usize> = (0..rows)
                    .flat_map(|r| (0..cols).map(move |c| c * rows + r))
                    .collect();
                Self::from_parts(self.data.gather(&positions), self.dtype, Shape::Two(cols, rows))
            }
        }
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn check_positions(positions: &[usize], len: usize) -> Result<(), ArrayError> {
        match positions.iter().find(|&&p| p >= len) {
            Some(&p) => Err(ArrayError::PositionOutOfBounds {
                position: p as i64,
                len,
            }),
            None => Ok(()),
        }
    }

    fn row_flat_positions(&self, rows: &[usize]) -> Vec<usize> {
        let n = self.shape.rows();
        (0..self.shape.cols())
            .flat_map(|c| rows.iter().map(move |&r| c * n + r))
            .collect()
    }

    fn column_flat_positions(&self, cols: &[usize]) -> Vec<usize> {
        let n = self.shape.rows();
        cols.iter().flat_map(|&c| (c * n)..((c + 1) * n)).collect()
    }

    fn with_rows(&self, rows: usize) -> Shape {
        match self.shape {
            Shape::One(_) => Shape::One(rows),
            Shape::Two(_, cols) => Shape::Two(rows, cols),
        }
    }

    /// Rows (or elements, for 1D) at `positions`, copied.
    pub fn take_rows(&self, positions: &[usize]) -> Result<Self, ArrayError> {
        Self::check_positions(positions, self.shape.rows())?;
        let flat = self.row_flat_positions(positions);
        Ok(Self::from_parts(
            self.data.gather(&flat),
            self.dtype,
            self.with_rows(positions.len()),
        ))
    }

    /// Columns at `positions` of a 2D array, copied. A 1D array is one column.
    pub fn take_columns(&self, positions: &[usize]) -> Result<Self, ArrayError> {
        Self::check_positions(positions, self.shape.cols())?;
        let flat = self.column_flat_positions(positions);
        Ok(Self::from_parts(
            self.data.gather(&flat),
            self.dtype,
            Shape::Two(self.shape.rows(), positions.len()),
        ))
    }

    /// Reindex rows; `None` positions receive `fill`, widening the dtype to
    /// hold it when any is present.
    pub fn take_rows_with_fill(
        &self,
        positions: &[Option<usize>],
        fill: &Scalar,
    ) -> Result<Self, ArrayError> {
        let present: Vec<usize> = positions.iter().flatten().copied().collect();
        Self::check_positions(&present, self.shape.rows())?;
        let n = self.shape.rows();
        let flat: Vec<Option<usize>> = (0..self.shape.cols())
            .flat_map(|c| positions.iter().map(move |p| p.map(|r| c * n + r)))
            .collect();
        self.gather_with_fill(&flat, fill, self.with_rows(positions.len()))
    }

    /// Reindex columns; `None` positions become columns of `fill`.
    pub fn take_columns_with_fill(
        &self,
        positions: &[Option<usize>],
        fill: &Scalar,
    ) -> Result<Self, ArrayError> {
        let present: Vec<usize> = positions.iter().flatten().copied().collect();
        Self::check_positions(&present, self.shape.cols())?;
        let n = self.shape.rows();
        let flat: Vec<Option<usize>> = positions
            .iter()
            .flat_map(|p| (0..n).map(move |r| p.map(|c| c * n + r)))
            .collect();
        self.gather_with_fill(&flat, fill, Shape::Two(n, positions.len()))
    }

    fn gather_with_fill(
        &self,
        flat: &[Option<usize>],
        fill: &Scalar,
        shape: Shape,
    ) -> Result<Self, ArrayError> {
        if flat.iter().all(Option::is_some) {
            let positions: Vec<usize> = flat.iter().flatten().copied().collect();
            return Ok(Self::from_parts(self.data.gather(&positions), self.dtype, shape));
        }
        let source = self.astype(crate::util::fill_dtype(self.dtype, fill))?;
        let (fill_data, _) = build_data(std::slice::from_ref(fill), source.dtype)?;
        let data = source
            .data
            .gather_fill(flat, &fill_data)
            .ok_or(ArrayError::DtypeMismatch {
                expected: source.dtype,
                found: fill.natural_dtype(),
            })?;
        Ok(Self::from_parts(data, source.dtype, shape))
    }

    /// Rows selected by an iloc key; a single position still yields an array.
    pub fn select_rows(&self, key: &ILocKey) -> Result<Self, ArrayError> {
        if key.is_all(self.shape.rows()) {
            return Ok(self.clone());
        }
        let positions = key.positions(self.shape.rows())?;
        self.take_rows(&positions)
    }

    pub fn select_columns(&self, key: &ILocKey) -> Result<Self, ArrayError> {
        if key.is_all(self.shape.cols()) {
            return Ok(self.clone());
        }
        let positions = key.positions(self.shape.cols())?;
        self.take_columns(&positions)
    }

    /// One column as a fresh read-only 1D array.
    pub fn column(&self, col: usize) -> Result<Self, ArrayError> {
        Ok(self.take_columns(&[col])?.column_1d_filter())
    }

    /// One row as a fresh read-only 1D array.
    pub fn row(&self, row: usize) -> Result<Self, ArrayError> {
        Self::check_positions(&[row], self.shape.rows())?;
        let n = self.shape.rows();
        let flat: Vec<usize> = (0..self.shape.cols()).map(|c| c * n + row).collect();
        Ok(Self::from_parts(
            self.data.gather(&flat),
            self.dtype,
            Shape::One(self.shape.cols()),
        ))
    }
}
