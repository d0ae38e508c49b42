use num_complex::Complex64;

use crate::TypeError;
use crate::dtype::{DType, TimeUnit};
use crate::scalar::{NAT, Scalar, convert_datetime, convert_timedelta, parse_datetime};

/// Null sentinel for a dtype family.
///
/// Families without a native null get a zero-like stand-in: `0`, `False` or
/// the empty string.
pub fn dtype_to_na(dtype: DType) -> Result<Scalar, TypeError> {
    Ok(match dtype {
        DType::Bool => Scalar::Bool(false),
        DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => Scalar::Int(0),
        DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64 => Scalar::UInt(0),
        DType::Float32 | DType::Float64 | DType::Complex64 | DType::Complex128 => {
            Scalar::Float(f64::NAN)
        }
        DType::Str(_) => Scalar::Str(String::new()),
        DType::Bytes(_) => Scalar::Bytes(Vec::new()),
        DType::DateTime64(unit) => Scalar::DateTime(NAT, unit),
        DType::TimeDelta64(unit) => Scalar::TimeDelta(NAT, unit),
        DType::Object => Scalar::None,
        DType::Void(_) => return Err(TypeError::UnsupportedDtype { dtype }),
    })
}

fn value_cast(value: &Scalar, to: DType) -> TypeError {
    TypeError::ValueCast {
        value: value.repr(),
        to,
    }
}

fn to_integer(value: &Scalar, to: DType) -> Result<i128, TypeError> {
    match value {
        Scalar::Bool(v) => Ok(i128::from(*v)),
        Scalar::Int(v) => Ok(i128::from(*v)),
        Scalar::UInt(v) => Ok(i128::from(*v)),
        Scalar::Float(v) if v.is_finite() => Ok(v.trunc() as i128),
        Scalar::Complex(c) if c.re.is_finite() => Ok(c.re.trunc() as i128),
        Scalar::DateTime(v, _) | Scalar::TimeDelta(v, _) => Ok(i128::from(*v)),
        Scalar::Str(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| value_cast(value, to)),
        _ => Err(value_cast(value, to)),
    }
}

fn to_float(value: &Scalar, to: DType) -> Result<f64, TypeError> {
    match value {
        Scalar::None => Ok(f64::NAN),
        Scalar::Complex(c) => Ok(c.re),
        Scalar::DateTime(NAT, _) | Scalar::TimeDelta(NAT, _) => Ok(f64::NAN),
        Scalar::DateTime(v, _) | Scalar::TimeDelta(v, _) => Ok(*v as f64),
        Scalar::Str(s) => s.trim().parse::<f64>().map_err(|_| value_cast(value, to)),
        other => other.as_f64().ok_or_else(|| value_cast(value, to)),
    }
}

fn to_bool(value: &Scalar, to: DType) -> Result<bool, TypeError> {
    match value {
        Scalar::None => Ok(false),
        Scalar::Bool(v) => Ok(*v),
        Scalar::Int(v) => Ok(*v != 0),
        Scalar::UInt(v) => Ok(*v != 0),
        Scalar::Float(v) => Ok(*v != 0.0),
        Scalar::Complex(c) => Ok(c.re != 0.0 || c.im != 0.0),
        Scalar::DateTime(v, _) | Scalar::TimeDelta(v, _) => Ok(*v != 0),
        Scalar::Tuple(values) => Ok(!values.is_empty()),
        Scalar::Str(_) | Scalar::Bytes(_) => Err(value_cast(value, to)),
    }
}

fn to_text(value: &Scalar) -> String {
    match value {
        Scalar::Str(s) => s.clone(),
        Scalar::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        other => other.to_string(),
    }
}

fn truncate_chars(text: String, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        text
    } else {
        text.chars().take(width).collect()
    }
}

fn to_datetime(value: &Scalar, unit: TimeUnit, to: DType) -> Result<i64, TypeError> {
    match value {
        Scalar::None => Ok(NAT),
        Scalar::Float(v) if v.is_nan() => Ok(NAT),
        Scalar::DateTime(v, from) => {
            convert_datetime(*v, *from, unit).ok_or_else(|| value_cast(value, to))
        }
        Scalar::Int(v) => Ok(*v),
        Scalar::UInt(v) => i64::try_from(*v).map_err(|_| value_cast(value, to)),
        Scalar::Str(s) => {
            let (v, from) = parse_datetime(s).ok_or_else(|| value_cast(value, to))?;
            convert_datetime(v, from, unit).ok_or_else(|| value_cast(value, to))
        }
        _ => Err(TypeError::InvalidCast {
            from: value.natural_dtype(),
            to,
        }),
    }
}

fn to_timedelta(value: &Scalar, unit: TimeUnit, to: DType) -> Result<i64, TypeError> {
    match value {
        Scalar::None => Ok(NAT),
        Scalar::Float(v) if v.is_nan() => Ok(NAT),
        Scalar::TimeDelta(v, from) => {
            convert_timedelta(*v, *from, unit).ok_or_else(|| TypeError::InvalidCast {
                from: value.natural_dtype(),
                to,
            })
        }
        Scalar::Int(v) => Ok(*v),
        Scalar::UInt(v) => i64::try_from(*v).map_err(|_| value_cast(value, to)),
        _ => Err(TypeError::InvalidCast {
            from: value.natural_dtype(),
            to,
        }),
    }
}

/// Convert a value to the canonical element representation of `dtype`.
///
/// Integers wrap to the target width. `None`
/// becomes NaN for floats and NaT for temporal dtypes; ISO strings parse to
/// datetimes.
pub fn cast_scalar(value: &Scalar, dtype: DType) -> Result<Scalar, TypeError> {
    Ok(match dtype {
        DType::Object => value.clone(),
        DType::Bool => Scalar::Bool(to_bool(value, dtype)?),
        DType::Int8 => Scalar::Int(i64::from(to_integer(value, dtype)? as i8)),
        DType::Int16 => Scalar::Int(i64::from(to_integer(value, dtype)? as i16)),
        DType::Int32 => Scalar::Int(i64::from(to_integer(value, dtype)? as i32)),
        DType::Int64 => Scalar::Int(to_integer(value, dtype)? as i64),
        DType::UInt8 => Scalar::UInt(u64::from(to_integer(value, dtype)? as u8)),
        DType::UInt16 => Scalar::UInt(u64::from(to_integer(value, dtype)? as u16)),
        DType::UInt32 => Scalar::UInt(u64::from(to_integer(value, dtype)? as u32)),
        DType::UInt64 => Scalar::UInt(to_integer(value, dtype)? as u64),
        DType::Float32 => Scalar::Float(f64::from(to_float(value, dtype)? as f32)),
        DType::Float64 => Scalar::Float(to_float(value, dtype)?),
        DType::Complex64 | DType::Complex128 => match value {
            Scalar::Complex(c) if dtype == DType::Complex64 => {
                Scalar::Complex(Complex64::new(
                    f64::from(c.re as f32),
                    f64::from(c.im as f32),
                ))
            }
            Scalar::Complex(c) => Scalar::Complex(*c),
            other => Scalar::Complex(Complex64::new(to_float(other, dtype)?, 0.0)),
        },
        DType::Str(width) => Scalar::Str(truncate_chars(to_text(value), width)),
        DType::Bytes(width) => {
            let mut bytes = match value {
                Scalar::Bytes(b) => b.clone(),
                other => to_text(other).into_bytes(),
            };
            if width > 0 {
                bytes.truncate(width);
            }
            Scalar::Bytes(bytes)
        }
        DType::DateTime64(unit) => Scalar::DateTime(to_datetime(value, unit, dtype)?, unit),
        DType::TimeDelta64(unit) => Scalar::TimeDelta(to_timedelta(value, unit, dtype)?, unit),
        DType::Void(_) => return Err(TypeError::UnsupportedDtype { dtype }),
    })
}

/// Cast only when the value survives unchanged, as judged by
/// [`Scalar::value_eq`]; used to look up labels across dtypes.
///
/// An ISO string survives a datetime cast when the instant it names is kept
/// exactly at the target unit.
#[must_use]
pub fn cast_lossless(value: &Scalar, dtype: DType) -> Option<Scalar> {
    let cast = cast_scalar(value, dtype).ok()?;
    let same = match (value, &cast) {
        (Scalar::Str(a), Scalar::Str(b)) => a == b,
        (Scalar::Bytes(a), Scalar::Bytes(b)) => a == b,
        (Scalar::Str(text), Scalar::DateTime(..)) => parse_datetime(text)
            .is_some_and(|(v, unit)| Scalar::DateTime(v, unit).value_eq(&cast)),
        _ => cast.value_eq(value),
    };
    same.then_some(cast)
}

#[cfg(test)]
mod tests {
    use super::{cast_lossless, cast_scalar, dtype_to_na};
    use crate::dtype::{DType, TimeUnit};
    use crate::scalar::{NAT, Scalar};

    #[test]
    fn null_sentinels_per_family() {
        assert_eq!(dtype_to_na(DType::Int64).expect("int"), Scalar::Int(0));
        assert_eq!(dtype_to_na(DType::Bool).expect("bool"), Scalar::Bool(false));
        assert!(dtype_to_na(DType::Float32).expect("float").is_nan());
        assert!(dtype_to_na(DType::Complex128).expect("complex").is_nan());
        assert_eq!(dtype_to_na(DType::Object).expect("object"), Scalar::None);
        assert_eq!(dtype_to_na(DType::Str(4)).expect("str"), Scalar::str(""));
        assert_eq!(
            dtype_to_na(DType::TimeDelta64(TimeUnit::Second)).expect("td"),
            Scalar::TimeDelta(NAT, TimeUnit::Second)
        );
        assert!(dtype_to_na(DType::Void(8)).is_err());
    }

    #[test]
    fn integer_casts_wrap_to_width() {
        assert_eq!(
            cast_scalar(&Scalar::Int(300), DType::UInt8).expect("wraps"),
            Scalar::UInt(44)
        );
        assert_eq!(
            cast_scalar(&Scalar::Float(2.9), DType::Int64).expect("truncates"),
            Scalar::Int(2)
        );
        assert!(cast_scalar(&Scalar::Float(f64::NAN), DType::Int64).is_err());
        assert!(cast_scalar(&Scalar::None, DType::Int64).is_err());
    }

    #[test]
    fn none_becomes_nan_or_nat() {
        assert!(cast_scalar(&Scalar::None, DType::Float64).expect("nan").is_nan());
        assert!(
            cast_scalar(&Scalar::None, DType::DateTime64(TimeUnit::Day))
                .expect("nat")
                .is_nat()
        );
    }

    #[test]
    fn strings_parse_and_truncate() {
        assert_eq!(
            cast_scalar(&Scalar::str("2.5"), DType::Float64).expect("parses"),
            Scalar::Float(2.5)
        );
        assert_eq!(
            cast_scalar(&Scalar::str("abcdef"), DType::Str(3)).expect("truncates"),
            Scalar::str("abc")
        );
        assert_eq!(
            cast_scalar(&Scalar::Int(12), DType::Str(0)).expect("formats"),
            Scalar::str("12")
        );
        assert_eq!(
            cast_scalar(&Scalar::str("1970-01-03"), DType::DateTime64(TimeUnit::Day))
                .expect("parses"),
            Scalar::DateTime(2, TimeUnit::Day)
        );
    }

    #[test]
    fn lossless_cast_rejects_changed_values() {
        assert_eq!(
            cast_lossless(&Scalar::Int(1), DType::Float64),
            Some(Scalar::Float(1.0))
        );
        assert_eq!(cast_lossless(&Scalar::Float(1.5), DType::Int64), None);
        assert_eq!(cast_lossless(&Scalar::str("abc"), DType::Str(2)), None);
    }

    #[test]
    fn iso_strings_cast_losslessly_to_matching_datetimes() {
        let day = DType::DateTime64(TimeUnit::Day);
        assert_eq!(
            cast_lossless(&Scalar::str("1970-01-02"), day),
            Some(Scalar::DateTime(1, TimeUnit::Day))
        );
        assert_eq!(cast_lossless(&Scalar::str("1970-01-02T12:00"), day), None);
        assert_eq!(
            cast_lossless(&Scalar::str("1970-01-02"), DType::DateTime64(TimeUnit::Second)),
            Some(Scalar::DateTime(86_400, TimeUnit::Second))
        );
        assert_eq!(cast_lossless(&Scalar::str("not a date"), day), None);
    }
}
