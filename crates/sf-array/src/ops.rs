use std::cmp::Ordering;
use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use sf_types::{
    DType, NAT, Scalar, TimeUnit, cast_scalar, convert_datetime, convert_timedelta,
    promote_numeric,
};

use crate::ArrayError;
use crate::array::{Array, Shape};

// ── Operators ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Pos,
    Abs,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "family", content = "op", rename_all = "snake_case")]
pub enum BinaryOp {
    Arithmetic(ArithmeticOp),
    Comparison(ComparisonOp),
    Logical(LogicalOp),
}

impl ArithmeticOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "**",
        }
    }
}

impl ComparisonOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
        }
    }
}

impl LogicalOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
        }
    }
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "unary -",
            Self::Pos => "unary +",
            Self::Abs => "abs()",
            Self::Invert => "unary ~",
        }
    }
}

impl BinaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Arithmetic(op) => op.symbol(),
            Self::Comparison(op) => op.symbol(),
            Self::Logical(op) => op.symbol(),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<ArithmeticOp> for BinaryOp {
    fn from(op: ArithmeticOp) -> Self {
        Self::Arithmetic(op)
    }
}

impl From<ComparisonOp> for BinaryOp {
    fn from(op: ComparisonOp) -> Self {
        Self::Comparison(op)
    }
}

impl From<LogicalOp> for BinaryOp {
    fn from(op: LogicalOp) -> Self {
        Self::Logical(op)
    }
}

fn unsupported(op: &'static str, left: impl fmt::Display, right: impl fmt::Display) -> ArrayError {
    ArrayError::UnsupportedOperation {
        op,
        left: left.to_string(),
        right: right.to_string(),
    }
}

fn type_name(value: &Scalar) -> &'static str {
    match value {
        Scalar::None => "NoneType",
        Scalar::Bool(_) => "bool",
        Scalar::Int(_) | Scalar::UInt(_) => "int",
        Scalar::Float(_) => "float",
        Scalar::Complex(_) => "complex",
        Scalar::Str(_) => "str",
        Scalar::Bytes(_) => "bytes",
        Scalar::DateTime(..) => "datetime64",
        Scalar::TimeDelta(..) => "timedelta64",
        Scalar::Tuple(_) => "tuple",
    }
}

fn element_unsupported(op: &'static str, a: &Scalar, b: &Scalar) -> ArrayError {
    unsupported(op, type_name(a), type_name(b))
}

// ── Element kernels ────────────────────────────────────────────────────

fn int_arith(a: i64, b: i64, op: ArithmeticOp) -> Result<Scalar, ArrayError> {
    Ok(Scalar::Int(match op {
        ArithmeticOp::Add => a.wrapping_add(b),
        ArithmeticOp::Sub => a.wrapping_sub(b),
        ArithmeticOp::Mul => a.wrapping_mul(b),
        ArithmeticOp::Div => return Ok(Scalar::Float(a as f64 / b as f64)),
        ArithmeticOp::FloorDiv if b == 0 => 0,
        ArithmeticOp::FloorDiv => {
            let q = a.wrapping_div(b);
            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        ArithmeticOp::Mod if b == 0 => 0,
        ArithmeticOp::Mod => {
            let r = a.wrapping_rem(b);
            if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }
        }
        ArithmeticOp::Pow => {
            if b < 0 {
                return Err(ArrayError::NegativeIntegerPower);
            }
            a.wrapping_pow(u32::try_from(b).unwrap_or(u32::MAX))
        }
    }))
}

fn uint_arith(a: u64, b: u64, op: ArithmeticOp) -> Scalar {
    Scalar::UInt(match op {
        ArithmeticOp::Add => a.wrapping_add(b),
        ArithmeticOp::Sub => a.wrapping_sub(b),
        ArithmeticOp::Mul => a.wrapping_mul(b),
        ArithmeticOp::Div => return Scalar::Float(a as f64 / b as f64),
        ArithmeticOp::FloorDiv => a.checked_div(b).unwrap_or(0),
        ArithmeticOp::Mod => a.checked_rem(b).unwrap_or(0),
        ArithmeticOp::Pow => a.wrapping_pow(u32::try_from(b).unwrap_or(u32::MAX)),
    })
}

fn float_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r < 0.0) != (b < 0.0)) { r + b } else { r }
}

fn float_arith(a: f64, b: f64, op: ArithmeticOp) -> Scalar {
    Scalar::Float(match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => a / b,
        ArithmeticOp::FloorDiv if b == 0.0 => a / b,
        ArithmeticOp::FloorDiv => ((a - float_mod(a, b)) / b).round(),
        ArithmeticOp::Mod => float_mod(a, b),
        ArithmeticOp::Pow => a.powf(b),
    })
}

fn complex_arith(a: Complex64, b: Complex64, op: ArithmeticOp) -> Option<Scalar> {
    Some(Scalar::Complex(match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => a / b,
        ArithmeticOp::Pow => a.powc(b),
        ArithmeticOp::FloorDiv | ArithmeticOp::Mod => return None,
    }))
}

fn as_complex(value: &Scalar) -> Option<Complex64> {
    match value {
        Scalar::Complex(c) => Some(*c),
        other => other.as_f64().map(|re| Complex64::new(re, 0.0)),
    }
}

fn as_int(value: &Scalar) -> Option<i64> {
    match value {
        Scalar::Bool(v) => Some(i64::from(*v)),
        Scalar::Int(v) => Some(*v),
        Scalar::UInt(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

fn temporal_arith(a: &Scalar, b: &Scalar, op: ArithmeticOp) -> Result<Scalar, ArrayError> {
    use ArithmeticOp::{Add, Div, FloorDiv, Mod, Mul, Sub};

    let fail = || element_unsupported(op.symbol(), a, b);
    let dt = |v: i64, from: TimeUnit, to: TimeUnit| convert_datetime(v, from, to).ok_or_else(fail);
    let td = |v: i64, from: TimeUnit, to: TimeUnit| convert_timedelta(v, from, to).ok_or_else(fail);

    match (a, b, op) {
        (Scalar::DateTime(x, ux), Scalar::DateTime(y, uy), Sub) => {
            let unit = ux.finer(*uy);
            let (x, y) = (dt(*x, *ux, unit)?, dt(*y, *uy, unit)?);
            Ok(Scalar::TimeDelta(nat_or(x, y, x.wrapping_sub(y)), unit))
        }
        (Scalar::DateTime(x, ux), Scalar::TimeDelta(y, uy), Add | Sub)
        | (Scalar::TimeDelta(y, uy), Scalar::DateTime(x, ux), Add) => {
            let unit = ux.finer(*uy);
            let (x, y) = (dt(*x, *ux, unit)?, td(*y, *uy, unit)?);
            let value = if op == Add { x.wrapping_add(y) } else { x.wrapping_sub(y) };
            Ok(Scalar::DateTime(nat_or(x, y, value), unit))
        }
        (Scalar::TimeDelta(x, ux), Scalar::TimeDelta(y, uy), _) => {
            let unit = ux.finer(*uy);
            let (x, y) = (td(*x, *ux, unit)?, td(*y, *uy, unit)?);
            let missing = x == NAT || y == NAT;
            match op {
                Add => Ok(Scalar::TimeDelta(nat_or(x, y, x.wrapping_add(y)), unit)),
                Sub => Ok(Scalar::TimeDelta(nat_or(x, y, x.wrapping_sub(y)), unit)),
                Mod if missing || y == 0 => Ok(Scalar::TimeDelta(NAT, unit)),
                Mod => match int_arith(x, y, Mod)? {
                    Scalar::Int(r) => Ok(Scalar::TimeDelta(r, unit)),
                    _ => Err(fail()),
                },
                Div if missing => Ok(Scalar::Float(f64::NAN)),
                Div => Ok(Scalar::Float(x as f64 / y as f64)),
                FloorDiv if missing => Ok(Scalar::Int(0)),
                FloorDiv => int_arith(x, y, FloorDiv),
                _ => Err(fail()),
            }
        }
        (Scalar::TimeDelta(x, unit), n, Mul | Div | FloorDiv) | (n, Scalar::TimeDelta(x, unit), Mul)
            if n.as_f64().is_some() =>
        {
            if *x == NAT || n.is_nan() {
                return Ok(Scalar::TimeDelta(NAT, *unit));
            }
            let value = match (as_int(n), op) {
                (Some(k), Mul) => x.wrapping_mul(k),
                (Some(0), _) => NAT,
                (Some(k), Div) => x.wrapping_div(k),
                (Some(k), _) => x.div_euclid(k),
                (None, Mul) => (*x as f64 * n.as_f64().unwrap_or(f64::NAN)) as i64,
                (None, _) => (*x as f64 / n.as_f64().unwrap_or(f64::NAN)) as i64,
            };
            Ok(Scalar::TimeDelta(value, *unit))
        }
        _ => Err(fail()),
    }
}

fn nat_or(x: i64, y: i64, value: i64) -> i64 {
    if x == NAT || y == NAT { NAT } else { value }
}

/// Arithmetic on two elements; mixed kinds promote to the wider kind.
fn scalar_arith(a: &Scalar, b: &Scalar, op: ArithmeticOp) -> Result<Scalar, ArrayError> {
    let fail = || element_unsupported(op.symbol(), a, b);
    match (a, b) {
        (Scalar::None, _) | (_, Scalar::None) => Err(fail()),
        (Scalar::UInt(x), Scalar::UInt(y)) => Ok(uint_arith(*x, *y, op)),
        (Scalar::DateTime(..) | Scalar::TimeDelta(..), _)
        | (_, Scalar::DateTime(..) | Scalar::TimeDelta(..)) => temporal_arith(a, b, op),
        (Scalar::Str(x), Scalar::Str(y)) if op == ArithmeticOp::Add => Ok(Scalar::Str(format!("{x}{y}"))),
        (Scalar::Str(s), n) | (n, Scalar::Str(s)) if op == ArithmeticOp::Mul => {
            let count = as_int(n).ok_or_else(fail)?;
            Ok(Scalar::Str(s.repeat(usize::try_from(count).unwrap_or(0))))
        }
        (Scalar::Bytes(x), Scalar::Bytes(y)) if op == ArithmeticOp::Add => {
            Ok(Scalar::Bytes([x.as_slice(), y.as_slice()].concat()))
        }
        (Scalar::Tuple(x), Scalar::Tuple(y)) if op == ArithmeticOp::Add => {
            Ok(Scalar::Tuple(x.iter().chain(y).cloned().collect()))
        }
        (Scalar::Complex(_), _) | (_, Scalar::Complex(_)) => {
            let (x, y) = (as_complex(a).ok_or_else(fail)?, as_complex(b).ok_or_else(fail)?);
            complex_arith(x, y, op).ok_or_else(fail)
        }
        _ => match (as_int(a), as_int(b)) {
            (Some(x), Some(y)) => int_arith(x, y, op),
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Ok(float_arith(x, y, op)),
                _ => Err(fail()),
            },
        },
    }
}

fn scalar_compare(a: &Scalar, b: &Scalar, op: ComparisonOp) -> Result<bool, ArrayError> {
    match op {
        ComparisonOp::Eq => Ok(a.value_eq(b)),
        ComparisonOp::Ne => Ok(!a.value_eq(b)),
        _ if a.is_nan() || b.is_nan() || a.is_nat() || b.is_nat() => Ok(false),
        _ => a
            .try_cmp(b)
            .map(|ord| op.holds(ord))
            .ok_or_else(|| element_unsupported(op.symbol(), a, b)),
    }
}

fn scalar_logical(a: &Scalar, b: &Scalar, op: LogicalOp) -> Result<Scalar, ArrayError> {
    let apply_bool = |x: bool, y: bool| match op {
        LogicalOp::And => x & y,
        LogicalOp::Or => x | y,
        LogicalOp::Xor => x ^ y,
    };
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => Ok(Scalar::Bool(apply_bool(*x, *y))),
        (Scalar::UInt(x), Scalar::UInt(y)) => Ok(Scalar::UInt(match op {
            LogicalOp::And => x & y,
            LogicalOp::Or => x | y,
            LogicalOp::Xor => x ^ y,
        })),
        _ => match (as_int(a), as_int(b)) {
            (Some(x), Some(y)) => Ok(Scalar::Int(match op {
                LogicalOp::And => x & y,
                LogicalOp::Or => x | y,
                LogicalOp::Xor => x ^ y,
            })),
            _ => Err(element_unsupported(op.symbol(), a, b)),
        },
    }
}

// ── Dtype planning ─────────────────────────────────────────────────────

/// Dtype both operands are cast to before the kernel runs, and the dtype of
/// the result.
struct Plan {
    compute: Option<DType>,
    out: DType,
}

fn is_real_like(dtype: DType) -> bool {
    dtype == DType::Bool || dtype.is_integer() || dtype.is_float()
}

fn arithmetic_plan(op: ArithmeticOp, l: DType, r: DType) -> Result<Plan, ArrayError> {
    use ArithmeticOp::{Add, Div, FloorDiv, Mod, Mul, Sub};
    use DType::{Bool, Bytes, DateTime64, Float64, Int64, Object, Str, TimeDelta64};

    let fail = || unsupported(op.symbol(), l, r);
    if l.is_object() || r.is_object() {
        return Ok(Plan { compute: None, out: Object });
    }
    let numeric = |d: DType| d == Bool || d.is_numeric();
    if numeric(l) && numeric(r) {
        let base = match (l, r) {
            (Bool, Bool) => Int64,
            (Bool, other) | (other, Bool) => other,
            _ => promote_numeric(l, r).ok_or_else(fail)?,
        };
        if base.is_complex() && matches!(op, FloorDiv | Mod) {
            return Err(fail());
        }
        let out = if op == Div && base.is_integer() { Float64 } else { base };
        return Ok(Plan { compute: Some(base), out });
    }
    let out = match (l, r, op) {
        (Str(a), Str(b), Add) => Str(a + b),
        (Bytes(a), Bytes(b), Add) => Bytes(a + b),
        (Str(_), n, Mul) | (n, Str(_), Mul) if n == Bool || n.is_integer() => Str(0),
        (DateTime64(a), DateTime64(b), Sub) => TimeDelta64(a.finer(b)),
        (DateTime64(a), TimeDelta64(b), Add | Sub) | (TimeDelta64(b), DateTime64(a), Add) => {
            DateTime64(a.finer(b))
        }
        (TimeDelta64(a), TimeDelta64(b), Add | Sub | Mod) => TimeDelta64(a.finer(b)),
        (TimeDelta64(_), TimeDelta64(_), Div) => Float64,
        (TimeDelta64(_), TimeDelta64(_), FloorDiv) => Int64,
        (TimeDelta64(u), n, Mul | Div | FloorDiv) | (n, TimeDelta64(u), Mul) if is_real_like(n) => {
            TimeDelta64(u)
        }
        _ => return Err(fail()),
    };
    Ok(Plan { compute: None, out })
}

fn logical_plan(op: LogicalOp, l: DType, r: DType) -> Result<Plan, ArrayError> {
    use DType::{Bool, Object};

    let fail = || unsupported(op.symbol(), l, r);
    if l.is_object() || r.is_object() {
        return Ok(Plan { compute: None, out: Object });
    }
    let base = match (l, r) {
        (Bool, Bool) => Bool,
        (Bool, other) | (other, Bool) if other.is_integer() => other,
        _ if l.is_integer() && r.is_integer() => promote_numeric(l, r).ok_or_else(fail)?,
        _ => return Err(fail()),
    };
    Ok(Plan { compute: Some(base), out: base })
}

// ── Array operators ────────────────────────────────────────────────────

/// Flat source position in `operand` for output position `i` of `shape`,
/// broadcasting a 1D operand across the rows of a 2D one.
fn broadcast_position(operand: Shape, shape: Shape, i: usize) -> usize {
    match (operand, shape) {
        (Shape::One(_), Shape::Two(rows, _)) if rows > 0 => i / rows,
        _ => i,
    }
}

fn result_shape(left: Shape, right: Shape) -> Result<Shape, ArrayError> {
    match (left, right) {
        _ if left == right => Ok(left),
        (Shape::Two(_, cols), Shape::One(n)) if cols == n => Ok(left),
        (Shape::One(n), Shape::Two(_, cols)) if cols == n => Ok(right),
        _ => Err(ArrayError::ShapeMismatch { left, right }),
    }
}

fn apply<F>(left: &Array, right: &Array, shape: Shape, mut f: F) -> Result<Vec<Scalar>, ArrayError>
where
    F: FnMut(&Scalar, &Scalar) -> Result<Scalar, ArrayError>,
{
    let lv = left.to_vec();
    let rv = right.to_vec();
    (0..shape.size())
        .map(|i| {
            let a = &lv[broadcast_position(left.shape(), shape, i)];
            let b = &rv[broadcast_position(right.shape(), shape, i)];
            f(a, b)
        })
        .collect()
}

/// Elementwise `left op right`. Shapes must match, except that a 1D operand
/// broadcasts across the rows of a 2D operand of equal width. The result is
/// read-only.
pub fn binary_op(left: &Array, right: &Array, op: BinaryOp) -> Result<Array, ArrayError> {
    let shape = result_shape(left.shape(), right.shape())?;
    match op {
        BinaryOp::Arithmetic(op) => {
            let plan = arithmetic_plan(op, left.dtype(), right.dtype())?;
            let (l, r) = match plan.compute {
                Some(dtype) => (left.astype(dtype)?, right.astype(dtype)?),
                None => (left.clone(), right.clone()),
            };
            let values = apply(&l, &r, shape, |a, b| scalar_arith(a, b, op))?;
            Array::from_shape_scalars(shape, &values, plan.out)
        }
        BinaryOp::Comparison(op) => {
            let values = apply(left, right, shape, |a, b| scalar_compare(a, b, op).map(Scalar::Bool))?;
            Array::from_shape_scalars(shape, &values, DType::Bool)
        }
        BinaryOp::Logical(op) => {
            let plan = logical_plan(op, left.dtype(), right.dtype())?;
            let (l, r) = match plan.compute {
                Some(dtype) => (left.astype(dtype)?, right.astype(dtype)?),
                None => (left.clone(), right.clone()),
            };
            let values = apply(&l, &r, shape, |a, b| scalar_logical(a, b, op))?;
            let out = if plan.out.is_object() && values.iter().all(|v| matches!(v, Scalar::Bool(_))) {
                DType::Bool
            } else {
                plan.out
            };
            Array::from_shape_scalars(shape, &values, out)
        }
    }
}

/// Dtype a scalar operand takes next to an array: untyped numbers adopt the
/// array's numeric dtype when it can represent their kind.
fn scalar_operand_dtype(array: DType, value: &Scalar) -> DType {
    match value {
        Scalar::Bool(_) if array == DType::Bool || array.is_numeric() => array,
        Scalar::Int(_) | Scalar::UInt(_) if array.is_numeric() => array,
        Scalar::Float(_) if array.is_float() || array.is_complex() => array,
        Scalar::Complex(_) if array.is_complex() => array,
        other => other.natural_dtype(),
    }
}

/// Elementwise `array op value`, or `value op array` when `reflected`.
pub fn binary_op_scalar(
    array: &Array,
    value: &Scalar,
    op: BinaryOp,
    reflected: bool,
) -> Result<Array, ArrayError> {
    let dtype = scalar_operand_dtype(array.dtype(), value);
    let operand = Array::full(array.shape(), dtype, value)?;
    if reflected {
        binary_op(&operand, array, op)
    } else {
        binary_op(array, &operand, op)
    }
}

/// Elementwise unary operator.
pub fn unary_op(array: &Array, op: UnaryOp) -> Result<Array, ArrayError> {
    let dtype = array.dtype();
    let fail = || unsupported(op.symbol(), dtype, "");
    let out = match op {
        UnaryOp::Abs if dtype.is_complex() => DType::Float64,
        UnaryOp::Invert if dtype == DType::Bool || dtype.is_integer() || dtype.is_object() => dtype,
        UnaryOp::Invert => return Err(fail()),
        _ if dtype == DType::Bool || dtype.is_string() || matches!(dtype, DType::DateTime64(_)) => {
            return Err(fail());
        }
        _ => dtype,
    };
    let values = array
        .iter()
        .map(|v| match (&v, op) {
            (_, UnaryOp::Pos) => Ok(v.clone()),
            (Scalar::Bool(x), UnaryOp::Invert) => Ok(Scalar::Bool(!x)),
            (Scalar::Int(x), UnaryOp::Invert) => Ok(Scalar::Int(!x)),
            (Scalar::UInt(x), UnaryOp::Invert) => Ok(Scalar::UInt(!x)),
            (Scalar::Int(x), UnaryOp::Neg) => Ok(Scalar::Int(x.wrapping_neg())),
            (Scalar::Int(x), UnaryOp::Abs) => Ok(Scalar::Int(x.wrapping_abs())),
            (Scalar::UInt(x), UnaryOp::Neg) => Ok(Scalar::UInt(x.wrapping_neg())),
            (Scalar::UInt(_), UnaryOp::Abs) => Ok(v.clone()),
            (Scalar::Float(x), UnaryOp::Neg) => Ok(Scalar::Float(-x)),
            (Scalar::Float(x), UnaryOp::Abs) => Ok(Scalar::Float(x.abs())),
            (Scalar::Complex(c), UnaryOp::Neg) => Ok(Scalar::Complex(-c)),
            (Scalar::Complex(c), UnaryOp::Abs) => Ok(Scalar::Float(c.norm())),
            (Scalar::TimeDelta(x, u), UnaryOp::Neg) => {
                Ok(Scalar::TimeDelta(if *x == NAT { NAT } else { -x }, *u))
            }
            (Scalar::TimeDelta(x, u), UnaryOp::Abs) => {
                Ok(Scalar::TimeDelta(if *x == NAT { NAT } else { x.abs() }, *u))
            }
            (Scalar::Bool(x), UnaryOp::Neg | UnaryOp::Abs) if dtype.is_object() => {
                let x = i64::from(*x);
                Ok(Scalar::Int(if op == UnaryOp::Neg { -x } else { x }))
            }
            _ => Err(unsupported(op.symbol(), type_name(&v), "")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Array::from_shape_scalars(array.shape(), &values, out)
}

// ── Matrix products ────────────────────────────────────────────────────

/// Result of [`matmul`]: a scalar for two vectors, an array otherwise.
#[derive(Debug, Clone)]
pub enum Product {
    Scalar(Scalar),
    Array(Array),
}

fn product_dtype(left: &Array, right: &Array) -> Result<DType, ArrayError> {
    let plan = arithmetic_plan(ArithmeticOp::Mul, left.dtype(), right.dtype())?;
    match plan.compute {
        Some(dtype) => Ok(dtype),
        None => Err(unsupported("@", left.dtype(), right.dtype())),
    }
}

fn dot(pairs: impl Iterator<Item = (Scalar, Scalar)>, dtype: DType) -> Result<Scalar, ArrayError> {
    let mut acc = cast_scalar(&Scalar::Int(0), dtype)?;
    for (a, b) in pairs {
        let term = scalar_arith(&a, &b, ArithmeticOp::Mul)?;
        acc = scalar_arith(&acc, &term, ArithmeticOp::Add)?;
    }
    Ok(cast_scalar(&acc, dtype)?)
}

/// Inner product of two equal-length numeric vectors.
pub fn dot_1d(left: &Array, right: &Array) -> Result<Scalar, ArrayError> {
    if left.ndim() != 1 || right.ndim() != 1 || left.len() != right.len() {
        return Err(ArrayError::NotAlignable {
            left: left.shape(),
            right: right.shape(),
        });
    }
    let dtype = product_dtype(left, right)?;
    let (l, r) = (left.astype(dtype)?, right.astype(dtype)?);
    dot(l.iter().zip(r.iter()), dtype)
}

/// Matrix product over numeric operands of rank 1 or 2. A 1D left operand
/// is a row, a 1D right operand a column. Mismatched inner dimensions are
/// `NotAlignable`.
pub fn matmul(left: &Array, right: &Array) -> Result<Product, ArrayError> {
    let not_alignable = || ArrayError::NotAlignable {
        left: left.shape(),
        right: right.shape(),
    };
    if left.ndim() == 1 && right.ndim() == 1 {
        return dot_1d(left, right).map(Product::Scalar);
    }
    let left_2d = if left.ndim() == 1 {
        left.column_2d_filter().transpose()
    } else {
        left.clone()
    };
    if left_2d.shape().cols() != right.len() {
        return Err(not_alignable());
    }

    let dtype = product_dtype(left, right)?;
    let l = left_2d.astype(dtype)?;
    let r = right.column_2d_filter().astype(dtype)?;
    let (n, m) = (l.shape().rows(), r.shape().cols());
    let mut values = Vec::with_capacity(n * m);
    for col in 0..m {
        let column = r.column(col)?;
        for row in 0..n {
            let row_values = l.row(row)?;
            values.push(dot(row_values.iter().zip(column.iter()), dtype)?);
        }
    }
    let shape = match (left.ndim(), right.ndim()) {
        (1, _) => Shape::One(m),
        (_, 1) => Shape::One(n),
        _ => Shape::Two(n, m),
    };
    Array::from_shape_scalars(shape, &values, dtype).map(Product::Array)
}
