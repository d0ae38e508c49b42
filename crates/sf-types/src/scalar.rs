use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::dtype::{DType, NANOS_PER_DAY, TimeUnit};

/// Not-a-time sentinel shared by `datetime64` and `timedelta64` values.
pub const NAT: i64 = i64::MIN;

/// A single element or label.
///
/// Equality and hashing are total so any scalar can serve as a label: NaN
/// equals NaN and `-0.0` equals `0.0`. Use [`Scalar::value_eq`] for
/// elementwise comparison semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(Complex64),
    Str(String),
    Bytes(Vec<u8>),
    DateTime(i64, TimeUnit),
    TimeDelta(i64, TimeUnit),
    Tuple(Vec<Scalar>),
}

/// Labels are scalars; the alias names intent at API boundaries.
pub type Label = Scalar;

impl Scalar {
    #[must_use]
    pub fn nat(unit: TimeUnit) -> Self {
        Self::DateTime(NAT, unit)
    }

    #[must_use]
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    #[must_use]
    pub fn tuple<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Datetime at day resolution.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        let days = date.signed_duration_since(epoch_date()).num_days();
        Self::DateTime(days, TimeUnit::Day)
    }

    /// Datetime at microsecond resolution.
    #[must_use]
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self::DateTime(datetime.and_utc().timestamp_micros(), TimeUnit::Microsecond)
    }

    /// The dtype this value takes on its own.
    #[must_use]
    pub fn natural_dtype(&self) -> DType {
        match self {
            Self::None | Self::Tuple(_) => DType::Object,
            Self::Bool(_) => DType::Bool,
            Self::Int(_) => DType::Int64,
            Self::UInt(_) => DType::UInt64,
            Self::Float(_) => DType::Float64,
            Self::Complex(_) => DType::Complex128,
            Self::Str(s) => DType::Str(s.chars().count()),
            Self::Bytes(b) => DType::Bytes(b.len()),
            Self::DateTime(_, unit) => DType::DateTime64(*unit),
            Self::TimeDelta(_, unit) => DType::TimeDelta64(*unit),
        }
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        match self {
            Self::Float(v) => v.is_nan(),
            Self::Complex(c) => c.re.is_nan() || c.im.is_nan(),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_nat(&self) -> bool {
        matches!(self, Self::DateTime(NAT, _) | Self::TimeDelta(NAT, _))
    }

    /// `None`, NaN or NaT.
    #[must_use]
    pub fn is_na(&self) -> bool {
        matches!(self, Self::None) || self.is_nan() || self.is_nat()
    }

    /// Bool, integer and float values as `f64`; bool counts as 0/1.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    fn is_real(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Int(_) | Self::UInt(_) | Self::Float(_))
    }

    /// Ordering where one is defined; `None` marks an unorderable pair.
    ///
    /// Real numbers compare across widths with NaN sorting last. Temporal
    /// values compare at the finer unit with NaT last. Tuples compare
    /// lexicographically.
    #[must_use]
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::UInt(a), Self::UInt(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Self::UInt(a), Self::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) => Some(a.cmp(b)),
            (Self::Complex(a), Self::Complex(b)) => {
                Some(cmp_f64(a.re, b.re).then_with(|| cmp_f64(a.im, b.im)))
            }
            (Self::DateTime(a, ua), Self::DateTime(b, ub)) => {
                let unit = ua.finer(*ub);
                let a = convert_datetime(*a, *ua, unit)?;
                let b = convert_datetime(*b, *ub, unit)?;
                Some(cmp_nat_last(a, b))
            }
            (Self::TimeDelta(a, ua), Self::TimeDelta(b, ub)) => {
                let unit = ua.finer(*ub);
                let a = convert_timedelta(*a, *ua, unit)?;
                let b = convert_timedelta(*b, *ub, unit)?;
                Some(cmp_nat_last(a, b))
            }
            (Self::Tuple(a), Self::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => {}
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ if self.is_real() && other.is_real() => {
                Some(cmp_f64(self.as_f64()?, other.as_f64()?))
            }
            _ => None,
        }
    }

    /// Elementwise equality: numeric across widths, NaN and NaT unequal to
    /// everything.
    #[must_use]
    pub fn value_eq(&self, other: &Self) -> bool {
        if self.is_nan() || other.is_nan() || self.is_nat() || other.is_nat() {
            return false;
        }
        match (self, other) {
            (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.value_eq(y))
            }
            (Self::Complex(a), Self::Complex(b)) => a == b,
            (Self::Complex(c), real) | (real, Self::Complex(c)) if real.is_real() => {
                c.im == 0.0 && real.as_f64() == Some(c.re)
            }
            _ if self.is_real() && other.is_real() => self.try_cmp(other) == Some(Ordering::Equal),
            (Self::DateTime(..), Self::DateTime(..)) | (Self::TimeDelta(..), Self::TimeDelta(..)) => {
                self.try_cmp(other) == Some(Ordering::Equal)
            }
            _ => self == other,
        }
    }

    /// A representative under which equal values are `==` and hash alike.
    ///
    /// Reals collapse across kinds (`true`, `1`, `1.0` share the key `Int(1)`)
    /// and complex values with a zero imaginary part join them. Temporal
    /// values move to the coarsest unit that holds them exactly, so one
    /// instant or duration has one key whatever its unit. Tuples map
    /// element-wise.
    #[must_use]
    pub fn equality_key(&self) -> Scalar {
        match self {
            Self::Bool(v) => Self::Int(i64::from(*v)),
            Self::UInt(v) => i64::try_from(*v).map_or(Self::UInt(*v), Self::Int),
            Self::Float(v) => real_key(*v),
            Self::Complex(c) if c.im == 0.0 && !c.re.is_nan() => real_key(c.re),
            Self::DateTime(v, unit) => {
                let (v, unit) = coarsest_exact(*v, *unit, convert_datetime);
                Self::DateTime(v, unit)
            }
            Self::TimeDelta(v, unit) => {
                let (v, unit) = coarsest_exact(*v, *unit, convert_timedelta);
                Self::TimeDelta(v, unit)
            }
            Self::Tuple(values) => Self::Tuple(values.iter().map(Self::equality_key).collect()),
            other => other.clone(),
        }
    }

    /// Quoted form for messages: strings quoted, everything else as displayed.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("'{s}'"),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(v, unit) if *v != NAT => {
                let nanos = convert_datetime(*v, *unit, TimeUnit::Nanosecond)?;
                Some(DateTime::from_timestamp_nanos(nanos).naive_utc())
            }
            _ => None,
        }
    }
}

const KEY_UNITS: [TimeUnit; 9] = [
    TimeUnit::Year,
    TimeUnit::Month,
    TimeUnit::Day,
    TimeUnit::Hour,
    TimeUnit::Minute,
    TimeUnit::Second,
    TimeUnit::Millisecond,
    TimeUnit::Microsecond,
    TimeUnit::Nanosecond,
];

fn real_key(v: f64) -> Scalar {
    if v.fract() == 0.0 {
        if v >= -(2f64.powi(63)) && v < 2f64.powi(63) {
            return Scalar::Int(v as i64);
        }
        if v >= 0.0 && v < 2f64.powi(64) {
            return Scalar::UInt(v as u64);
        }
    }
    Scalar::Float(v)
}

/// Coarsest unit whose round trip leaves `value` unchanged; NaT keeps the
/// coarsest unit.
fn coarsest_exact(
    value: i64,
    unit: TimeUnit,
    convert: fn(i64, TimeUnit, TimeUnit) -> Option<i64>,
) -> (i64, TimeUnit) {
    if value == NAT {
        return (NAT, TimeUnit::Year);
    }
    KEY_UNITS
        .iter()
        .find_map(|&to| {
            let v = convert(value, unit, to)?;
            (convert(v, to, unit) == Some(value)).then_some((v, to))
        })
        .unwrap_or((value, unit))
}

/// Total order on floats with NaN last.
#[must_use]
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn cmp_nat_last(a: i64, b: i64) -> Ordering {
    match (a == NAT, b == NAT) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}

fn float_key(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0
    } else {
        v.to_bits()
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_key(*a) == float_key(*b),
            (Self::Complex(a), Self::Complex(b)) => {
                float_key(a.re) == float_key(b.re) && float_key(a.im) == float_key(b.im)
            }
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::DateTime(a, ua), Self::DateTime(b, ub))
            | (Self::TimeDelta(a, ua), Self::TimeDelta(b, ub)) => a == b && ua == ub,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::None => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::UInt(v) => v.hash(state),
            Self::Float(v) => float_key(*v).hash(state),
            Self::Complex(c) => {
                float_key(c.re).hash(state);
                float_key(c.im).hash(state);
            }
            Self::Str(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::DateTime(v, unit) | Self::TimeDelta(v, unit) => {
                v.hash(state);
                unit.hash(state);
            }
            Self::Tuple(values) => values.hash(state),
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_nan() {
        "nan".to_owned()
    } else if v.is_infinite() {
        (if v > 0.0 { "inf" } else { "-inf" }).to_owned()
    } else if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Complex(c) => {
                let sign = if c.im.is_sign_negative() { '-' } else { '+' };
                write!(f, "({}{sign}{}j)", format_float(c.re), format_float(c.im.abs()))
            }
            Self::Str(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "b'{}'", String::from_utf8_lossy(b)),
            Self::DateTime(NAT, _) | Self::TimeDelta(NAT, _) => f.write_str("NaT"),
            Self::DateTime(v, unit) => f.write_str(&format_datetime(*v, *unit)),
            Self::TimeDelta(v, unit) => write!(f, "{v} {}", unit.plural_name()),
            Self::Tuple(values) => {
                f.write_str("(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&value.repr())?;
                }
                if values.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn format_datetime(value: i64, unit: TimeUnit) -> String {
    let Some(dt) = Scalar::DateTime(value, unit).to_naive_datetime() else {
        return format!("{value} {}", unit.code());
    };
    match unit {
        TimeUnit::Year => format!("{}", dt.year()),
        TimeUnit::Month => format!("{}-{:02}", dt.year(), dt.month()),
        TimeUnit::Week | TimeUnit::Day => dt.format("%Y-%m-%d").to_string(),
        TimeUnit::Hour => dt.format("%Y-%m-%dT%H").to_string(),
        TimeUnit::Minute => dt.format("%Y-%m-%dT%H:%M").to_string(),
        TimeUnit::Second => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        TimeUnit::Millisecond => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
        TimeUnit::Microsecond => dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        TimeUnit::Nanosecond => format!(
            "{}.{:09}",
            dt.format("%Y-%m-%dT%H:%M:%S"),
            dt.nanosecond()
        ),
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Complex64> for Scalar {
    fn from(value: Complex64) -> Self {
        Self::Complex(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<NaiveDate> for Scalar {
    fn from(value: NaiveDate) -> Self {
        Self::from_date(value)
    }
}

impl From<NaiveDateTime> for Scalar {
    fn from(value: NaiveDateTime) -> Self {
        Self::from_datetime(value)
    }
}

impl From<Vec<Scalar>> for Scalar {
    fn from(value: Vec<Scalar>) -> Self {
        Self::Tuple(value)
    }
}

// ── Time unit conversion ───────────────────────────────────────────────

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn rescale(value: i64, from_nanos: i128, to_nanos: i128) -> Option<i64> {
    let scaled = (i128::from(value) * from_nanos).div_euclid(to_nanos);
    i64::try_from(scaled).ok().filter(|v| *v != NAT)
}

fn months_to_days(months: i64) -> Option<i64> {
    let year = i32::try_from(1970 + months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(date.signed_duration_since(epoch_date()).num_days())
}

fn days_to_months(days: i64) -> Option<i64> {
    let date = epoch_date().checked_add_signed(chrono::Duration::try_days(days)?)?;
    Some((i64::from(date.year()) - 1970) * 12 + i64::from(date.month0()))
}

/// Convert a datetime tick count between units, flooring toward the past
/// when moving to a coarser unit. NaT is preserved.
#[must_use]
pub fn convert_datetime(value: i64, from: TimeUnit, to: TimeUnit) -> Option<i64> {
    if value == NAT || from == to {
        return Some(value);
    }
    if let (Some(f), Some(t)) = (from.nanos(), to.nanos()) {
        return rescale(value, f, t);
    }
    let months = match from {
        TimeUnit::Year => value.checked_mul(12)?,
        TimeUnit::Month => value,
        _ => {
            let days = rescale(value, from.nanos()?, NANOS_PER_DAY)?;
            days_to_months(days)?
        }
    };
    match to {
        TimeUnit::Year => Some(months.div_euclid(12)),
        TimeUnit::Month => Some(months),
        _ => rescale(months_to_days(months)?, NANOS_PER_DAY, to.nanos()?),
    }
}

/// Convert a duration between units. Calendar units only convert among
/// themselves.
#[must_use]
pub fn convert_timedelta(value: i64, from: TimeUnit, to: TimeUnit) -> Option<i64> {
    if value == NAT || from == to {
        return Some(value);
    }
    match (from, to) {
        (TimeUnit::Year, TimeUnit::Month) => value.checked_mul(12),
        (TimeUnit::Month, TimeUnit::Year) => Some(value.div_euclid(12)),
        _ => rescale(value, from.nanos()?, to.nanos()?),
    }
}

/// Parse an ISO-8601 date or datetime, reporting the unit its precision
/// implies.
#[must_use]
pub fn parse_datetime(text: &str) -> Option<(i64, TimeUnit)> {
    let text = text.trim();
    if text == "NaT" {
        return Some((NAT, TimeUnit::Day));
    }
    if let Ok(year) = text.parse::<i64>() {
        if text.len() == 4 {
            return Some((year - 1970, TimeUnit::Year));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d") {
        if text.len() == 7 {
            return Some((
                (i64::from(date.year()) - 1970) * 12 + i64::from(date.month0()),
                TimeUnit::Month,
            ));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Scalar::DateTime(days, unit) = Scalar::from_date(date) {
            return Some((days, unit));
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M") {
        return Some((dt.and_utc().timestamp() / 60, TimeUnit::Minute));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some((dt.and_utc().timestamp(), TimeUnit::Second));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt
            .and_utc()
            .timestamp_nanos_opt()
            .map(|ns| (ns, TimeUnit::Nanosecond));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use chrono::NaiveDate;

    use super::{NAT, Scalar, convert_datetime, convert_timedelta, parse_datetime};
    use crate::dtype::{DType, TimeUnit};

    #[test]
    fn nan_labels_are_equal_but_not_value_equal() {
        let a = Scalar::Float(f64::NAN);
        let b = Scalar::Float(f64::NAN);
        assert_eq!(a, b);
        assert!(!a.value_eq(&b));
        assert_eq!(Scalar::Float(-0.0), Scalar::Float(0.0));
    }

    #[test]
    fn value_eq_compares_numbers_across_widths() {
        assert!(Scalar::Int(1).value_eq(&Scalar::Float(1.0)));
        assert!(Scalar::UInt(3).value_eq(&Scalar::Int(3)));
        assert!(Scalar::Bool(true).value_eq(&Scalar::Int(1)));
        assert_ne!(Scalar::Int(1), Scalar::Float(1.0));
    }

    #[test]
    fn try_cmp_orders_within_families_only() {
        assert_eq!(
            Scalar::Int(2).try_cmp(&Scalar::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Scalar::Float(f64::NAN).try_cmp(&Scalar::Float(1.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(Scalar::Int(1).try_cmp(&Scalar::str("a")), None);
        assert_eq!(Scalar::None.try_cmp(&Scalar::None), None);
        assert_eq!(
            Scalar::tuple([1, 2]).try_cmp(&Scalar::tuple([1, 3])),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn equality_keys_join_equal_values_across_kinds_and_units() {
        assert_eq!(Scalar::Float(1.0).equality_key(), Scalar::Int(1).equality_key());
        assert_eq!(Scalar::Bool(true).equality_key(), Scalar::UInt(1).equality_key());
        assert_eq!(Scalar::Float(-0.0).equality_key(), Scalar::Int(0));
        assert_eq!(Scalar::Float(1.5).equality_key(), Scalar::Float(1.5));
        assert!(Scalar::Float(f64::NAN).equality_key().is_nan());
        assert_eq!(
            Scalar::DateTime(86_400, TimeUnit::Second).equality_key(),
            Scalar::DateTime(1, TimeUnit::Day).equality_key()
        );
        assert_eq!(
            Scalar::DateTime(12, TimeUnit::Month).equality_key(),
            Scalar::DateTime(1, TimeUnit::Year)
        );
        assert_ne!(
            Scalar::DateTime(25, TimeUnit::Hour).equality_key(),
            Scalar::DateTime(1, TimeUnit::Day).equality_key()
        );
        assert_eq!(
            Scalar::TimeDelta(48, TimeUnit::Hour).equality_key(),
            Scalar::TimeDelta(2, TimeUnit::Day)
        );
        assert_ne!(
            Scalar::TimeDelta(1, TimeUnit::Year).equality_key(),
            Scalar::TimeDelta(365, TimeUnit::Day).equality_key()
        );
        assert_eq!(
            Scalar::tuple([Scalar::Float(2.0), Scalar::str("a")]).equality_key(),
            Scalar::tuple([Scalar::Int(2), Scalar::str("a")])
        );
    }

    #[test]
    fn missing_values_are_detected() {
        assert!(Scalar::None.is_na());
        assert!(Scalar::Float(f64::NAN).is_na());
        assert!(Scalar::nat(TimeUnit::Day).is_na());
        assert!(!Scalar::Int(0).is_na());
        assert!(!Scalar::str("").is_na());
    }

    #[test]
    fn natural_dtype_reports_string_width() {
        assert_eq!(Scalar::str("aaa").natural_dtype(), DType::Str(3));
        assert_eq!(Scalar::tuple([1, 2]).natural_dtype(), DType::Object);
    }

    #[test]
    fn datetime_units_convert_through_the_calendar() {
        // 2019-02 in months since epoch
        let months = (2019 - 1970) * 12 + 1;
        let days = convert_datetime(months, TimeUnit::Month, TimeUnit::Day).expect("converts");
        let date = NaiveDate::from_ymd_opt(2019, 2, 1).expect("valid date");
        assert_eq!(Scalar::DateTime(days, TimeUnit::Day), Scalar::from_date(date));
        assert_eq!(
            convert_datetime(days, TimeUnit::Day, TimeUnit::Month),
            Some(months)
        );
        assert_eq!(convert_datetime(NAT, TimeUnit::Day, TimeUnit::Second), Some(NAT));
        assert_eq!(convert_timedelta(1, TimeUnit::Year, TimeUnit::Day), None);
        assert_eq!(convert_timedelta(2, TimeUnit::Day, TimeUnit::Hour), Some(48));
    }

    #[test]
    fn display_and_repr_forms() {
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
        assert_eq!(Scalar::Float(0.25).to_string(), "0.25");
        assert_eq!(Scalar::Float(f64::NAN).to_string(), "nan");
        assert_eq!(Scalar::Bool(true).to_string(), "True");
        assert_eq!(Scalar::tuple(["a"]).to_string(), "('a',)");
        assert_eq!(
            Scalar::tuple([Scalar::str("x"), Scalar::Int(1)]).to_string(),
            "('x', 1)"
        );
        let (value, unit) = parse_datetime("2019-01-05").expect("parses");
        assert_eq!(Scalar::DateTime(value, unit).to_string(), "2019-01-05");
        assert_eq!(Scalar::TimeDelta(3, TimeUnit::Day).to_string(), "3 days");
    }

    #[test]
    fn parse_datetime_infers_unit_from_precision() {
        assert_eq!(parse_datetime("2019"), Some((49, TimeUnit::Year)));
        assert_eq!(parse_datetime("2019-02"), Some((49 * 12 + 1, TimeUnit::Month)));
        assert_eq!(parse_datetime("1970-01-02"), Some((1, TimeUnit::Day)));
        assert_eq!(
            parse_datetime("1970-01-01T00:01:00"),
            Some((60, TimeUnit::Second))
        );
        assert_eq!(parse_datetime("garbage"), None);
    }

    #[test]
    fn scalars_round_trip_through_serde() {
        let value = Scalar::tuple([Scalar::str("a"), Scalar::Int(3)]);
        let json = serde_json::to_string(&value).expect("serializes");
        let back: Scalar = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, value);
    }
}
