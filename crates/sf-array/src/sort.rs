use std::cmp::Ordering;

use sf_types::{Scalar, TimeUnit};

/// Comparison family of a value; two values order only within a family.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Family {
    Real,
    Str,
    Bytes,
    Complex,
    DateTime,
    TimeDelta { calendar: bool },
    Tuple(Vec<Family>),
}

fn family(value: &Scalar) -> Option<Family> {
    Some(match value {
        Scalar::None => return None,
        Scalar::Bool(_) | Scalar::Int(_) | Scalar::UInt(_) | Scalar::Float(_) => Family::Real,
        Scalar::Str(_) => Family::Str,
        Scalar::Bytes(_) => Family::Bytes,
        Scalar::Complex(_) => Family::Complex,
        Scalar::DateTime(..) => Family::DateTime,
        Scalar::TimeDelta(_, unit) => Family::TimeDelta {
            calendar: TimeUnit::is_nonlinear(*unit),
        },
        Scalar::Tuple(values) => Family::Tuple(values.iter().map(family).collect::<Option<_>>()?),
    })
}

/// Whether every pair of `values` has a defined, consistent ordering.
#[must_use]
pub fn is_sortable<'a, I>(values: I) -> bool
where
    I: IntoIterator<Item = &'a Scalar>,
{
    let mut iter = values.into_iter();
    let Some(first) = iter.next() else {
        return true;
    };
    let Some(expected) = family(first) else {
        return false;
    };
    iter.all(|v| family(v).as_ref() == Some(&expected))
}

fn cmp_sortable(a: &Scalar, b: &Scalar) -> Ordering {
    a.try_cmp(b).unwrap_or(Ordering::Equal)
}

/// Stable ascending argsort, or `None` when the values are not mutually
/// orderable.
#[must_use]
pub fn argsort(values: &[Scalar]) -> Option<Vec<usize>> {
    if !is_sortable(values) {
        return None;
    }
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| cmp_sortable(&values[a], &values[b]));
    Some(order)
}

/// Sort in place when orderable; returns whether sorting happened.
pub fn try_sort(values: &mut [Scalar]) -> bool {
    if !is_sortable(values.iter()) {
        return false;
    }
    values.sort_by(cmp_sortable);
    true
}

#[cfg(test)]
mod tests {
    use sf_types::Scalar;

    use super::{argsort, is_sortable, try_sort};

    #[test]
    fn mixed_families_are_not_sortable() {
        assert!(is_sortable(&[Scalar::Int(1), Scalar::Float(0.5), Scalar::Bool(true)]));
        assert!(!is_sortable(&[Scalar::Int(1), Scalar::str("a")]));
        assert!(!is_sortable(&[Scalar::None]));
        assert!(!is_sortable(&[
            Scalar::tuple([Scalar::Int(1), Scalar::str("a")]),
            Scalar::tuple([Scalar::Int(1), Scalar::Int(2)]),
        ]));
    }

    #[test]
    fn argsort_is_stable() {
        let values = vec![Scalar::Int(3), Scalar::Int(1), Scalar::Int(3), Scalar::Int(0)];
        assert_eq!(argsort(&values), Some(vec![3, 1, 0, 2]));
    }

    #[test]
    fn try_sort_leaves_unorderable_values_alone() {
        let mut values = vec![Scalar::str("b"), Scalar::Int(1)];
        assert!(!try_sort(&mut values));
        assert_eq!(values, vec![Scalar::str("b"), Scalar::Int(1)]);
    }
}
