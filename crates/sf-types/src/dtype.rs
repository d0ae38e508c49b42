use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolution of a `datetime64` / `timedelta64` value.
///
/// Variants are declared coarse to fine, so `max` picks the finer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

pub(crate) const NANOS_PER_DAY: i128 = 86_400_000_000_000;

impl TimeUnit {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Year => "Y",
            Self::Month => "M",
            Self::Week => "W",
            Self::Day => "D",
            Self::Hour => "h",
            Self::Minute => "m",
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
        }
    }

    /// Years and months have no fixed length in nanoseconds.
    #[must_use]
    pub const fn is_nonlinear(self) -> bool {
        matches!(self, Self::Year | Self::Month)
    }

    /// Nanoseconds per tick, `None` for the calendar units.
    #[must_use]
    pub const fn nanos(self) -> Option<i128> {
        match self {
            Self::Year | Self::Month => None,
            Self::Week => Some(7 * NANOS_PER_DAY),
            Self::Day => Some(NANOS_PER_DAY),
            Self::Hour => Some(3_600_000_000_000),
            Self::Minute => Some(60_000_000_000),
            Self::Second => Some(1_000_000_000),
            Self::Millisecond => Some(1_000_000),
            Self::Microsecond => Some(1_000),
            Self::Nanosecond => Some(1),
        }
    }

    #[must_use]
    pub fn finer(self, other: Self) -> Self {
        self.max(other)
    }

    pub(crate) const fn plural_name(self) -> &'static str {
        match self {
            Self::Year => "years",
            Self::Month => "months",
            Self::Week => "weeks",
            Self::Day => "days",
            Self::Hour => "hours",
            Self::Minute => "minutes",
            Self::Second => "seconds",
            Self::Millisecond => "milliseconds",
            Self::Microsecond => "microseconds",
            Self::Nanosecond => "nanoseconds",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One-letter dtype family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DTypeKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Complex,
    Unicode,
    Bytes,
    DateTime,
    TimeDelta,
    Object,
    Void,
}

impl DTypeKind {
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Signed => 'i',
            Self::Unsigned => 'u',
            Self::Float => 'f',
            Self::Complex => 'c',
            Self::Unicode => 'U',
            Self::Bytes => 'S',
            Self::DateTime => 'M',
            Self::TimeDelta => 'm',
            Self::Object => 'O',
            Self::Void => 'V',
        }
    }
}

/// Element type of an array.
///
/// String widths count characters (`Str`) or bytes (`Bytes`). A width of zero
/// on a cast target means "size to fit the values".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Str(usize),
    Bytes(usize),
    DateTime64(TimeUnit),
    TimeDelta64(TimeUnit),
    Object,
    Void(usize),
}

impl DType {
    #[must_use]
    pub const fn kind(self) -> DTypeKind {
        match self {
            Self::Bool => DTypeKind::Bool,
            Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => DTypeKind::Signed,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64 => DTypeKind::Unsigned,
            Self::Float32 | Self::Float64 => DTypeKind::Float,
            Self::Complex64 | Self::Complex128 => DTypeKind::Complex,
            Self::Str(_) => DTypeKind::Unicode,
            Self::Bytes(_) => DTypeKind::Bytes,
            Self::DateTime64(_) => DTypeKind::DateTime,
            Self::TimeDelta64(_) => DTypeKind::TimeDelta,
            Self::Object => DTypeKind::Object,
            Self::Void(_) => DTypeKind::Void,
        }
    }

    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self.kind(), DTypeKind::Signed | DTypeKind::Unsigned)
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Integer, float or complex. Bool is its own family.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(self, Self::Str(_) | Self::Bytes(_))
    }

    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime64(_) | Self::TimeDelta64(_))
    }

    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(self, Self::Object)
    }

    /// Whether the family has a native missing-value sentinel (NaN or NaT).
    #[must_use]
    pub const fn has_native_na(self) -> bool {
        self.is_float() || self.is_complex() || self.is_temporal() || self.is_object()
    }

    /// Bit width of numeric dtypes; complex widths count both components.
    #[must_use]
    pub const fn bits(self) -> Option<u32> {
        match self {
            Self::Int8 | Self::UInt8 => Some(8),
            Self::Int16 | Self::UInt16 => Some(16),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(32),
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => Some(64),
            Self::Complex128 => Some(128),
            _ => None,
        }
    }

    /// String width, for string kinds only.
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        match self {
            Self::Str(w) | Self::Bytes(w) => Some(w),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Int8 => f.write_str("int8"),
            Self::Int16 => f.write_str("int16"),
            Self::Int32 => f.write_str("int32"),
            Self::Int64 => f.write_str("int64"),
            Self::UInt8 => f.write_str("uint8"),
            Self::UInt16 => f.write_str("uint16"),
            Self::UInt32 => f.write_str("uint32"),
            Self::UInt64 => f.write_str("uint64"),
            Self::Float32 => f.write_str("float32"),
            Self::Float64 => f.write_str("float64"),
            Self::Complex64 => f.write_str("complex64"),
            Self::Complex128 => f.write_str("complex128"),
            Self::Str(w) => write!(f, "<U{w}"),
            Self::Bytes(w) => write!(f, "|S{w}"),
            Self::DateTime64(unit) => write!(f, "datetime64[{unit}]"),
            Self::TimeDelta64(unit) => write!(f, "timedelta64[{unit}]"),
            Self::Object => f.write_str("object"),
            Self::Void(w) => write!(f, "|V{w}"),
        }
    }
}

// ── Resolution ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Signed(u32),
    Unsigned(u32),
    Float(u32),
    Complex(u32),
}

impl Numeric {
    fn of(dtype: DType) -> Option<Self> {
        let bits = dtype.bits()?;
        Some(match dtype.kind() {
            DTypeKind::Signed => Self::Signed(bits),
            DTypeKind::Unsigned => Self::Unsigned(bits),
            DTypeKind::Float => Self::Float(bits),
            DTypeKind::Complex => Self::Complex(bits),
            _ => return None,
        })
    }

    fn into_dtype(self) -> DType {
        match self {
            Self::Signed(8) => DType::Int8,
            Self::Signed(16) => DType::Int16,
            Self::Signed(32) => DType::Int32,
            Self::Signed(_) => DType::Int64,
            Self::Unsigned(8) => DType::UInt8,
            Self::Unsigned(16) => DType::UInt16,
            Self::Unsigned(32) => DType::UInt32,
            Self::Unsigned(_) => DType::UInt64,
            Self::Float(32) => DType::Float32,
            Self::Float(_) => DType::Float64,
            Self::Complex(64) => DType::Complex64,
            Self::Complex(_) => DType::Complex128,
        }
    }

    /// Smallest float width that holds every value of this type.
    fn float_bits(self) -> u32 {
        match self {
            Self::Signed(b) | Self::Unsigned(b) => {
                if b <= 16 {
                    32
                } else {
                    64
                }
            }
            Self::Float(b) => b,
            Self::Complex(b) => b / 2,
        }
    }
}

/// Common numeric dtype over the integer, float and complex families.
///
/// Returns `None` when either side is not numeric; bool is excluded.
#[must_use]
pub fn promote_numeric(left: DType, right: DType) -> Option<DType> {
    use Numeric::{Complex, Float, Signed, Unsigned};

    let l = Numeric::of(left)?;
    let r = Numeric::of(right)?;
    let out = match (l, r) {
        (Signed(a), Signed(b)) => Signed(a.max(b)),
        (Unsigned(a), Unsigned(b)) => Unsigned(a.max(b)),
        (Signed(s), Unsigned(u)) | (Unsigned(u), Signed(s)) => {
            if s > u {
                Signed(s)
            } else if u < 64 {
                Signed(2 * u)
            } else {
                Float(64)
            }
        }
        (Complex(_), _) | (_, Complex(_)) => Complex(2 * l.float_bits().max(r.float_bits())),
        _ => Float(l.float_bits().max(r.float_bits())),
    };
    Some(out.into_dtype())
}

/// Smallest common dtype able to hold values of both inputs without lossy
/// truncation. Total: incompatible families resolve to `Object`.
#[must_use]
pub fn resolve_dtype(left: DType, right: DType) -> DType {
    use DType::{Bytes, DateTime64, Object, Str, TimeDelta64};

    if left == right {
        return left;
    }
    if left.is_object() || right.is_object() {
        return Object;
    }
    match (left, right) {
        (Str(a), Str(b)) | (Str(a), Bytes(b)) | (Bytes(a), Str(b)) => Str(a.max(b)),
        (Bytes(a), Bytes(b)) => Bytes(a.max(b)),
        (DateTime64(a), DateTime64(b)) => DateTime64(a.finer(b)),
        (TimeDelta64(a), TimeDelta64(b)) => {
            if a.is_nonlinear() == b.is_nonlinear() {
                TimeDelta64(a.finer(b))
            } else {
                Object
            }
        }
        _ => promote_numeric(left, right).unwrap_or(Object),
    }
}

/// Pairwise fold of [`resolve_dtype`]; stops early once `Object` is reached.
pub fn resolve_dtype_iter<I>(dtypes: I) -> Result<DType, crate::TypeError>
where
    I: IntoIterator<Item = DType>,
{
    let mut iter = dtypes.into_iter();
    let mut resolved = iter.next().ok_or(crate::TypeError::EmptyDtypes)?;
    for dtype in iter {
        resolved = resolve_dtype(resolved, dtype);
        if resolved.is_object() {
            break;
        }
    }
    Ok(resolved)
}
