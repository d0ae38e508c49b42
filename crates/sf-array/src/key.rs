use serde::{Deserialize, Serialize};

use crate::ArrayError;

/// Slice over positions: negative bounds count from the end,
/// a negative step walks backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Slice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Slice {
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    #[must_use]
    pub const fn full() -> Self {
        Self::new(None, None, None)
    }

    #[must_use]
    pub const fn range(start: i64, stop: i64) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// Normalized `(start, stop, step)` for a sequence of `len`; bounds are
    /// clamped to the sequence.
    pub fn indices(&self, len: usize) -> Result<(i64, i64, i64), ArrayError> {
        let step = self.step.unwrap_or(1);
        if step == 0 {
            return Err(ArrayError::SliceStepZero);
        }
        let len = len as i64;
        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: i64| {
            if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            }
        };
        let start = self
            .start
            .map_or(if step < 0 { upper } else { lower }, clamp);
        let stop = self.stop.map_or(if step < 0 { lower } else { upper }, clamp);
        Ok((start, stop, step))
    }

    /// Selected positions, in slice order.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, ArrayError> {
        let (start, stop, step) = self.indices(len)?;
        let mut out = Vec::new();
        let mut i = start;
        while (step > 0 && i < stop) || (step < 0 && i > stop) {
            out.push(i as usize);
            i += step;
        }
        Ok(out)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.start.is_none() && self.stop.is_none() && self.step.is_none_or(|s| s == 1)
    }
}

/// Ascending slice selecting the same positions as `slice`.
///
/// Forward slices are returned unchanged; a backward slice becomes the
/// forward walk over its positions with the absolute step.
pub fn slice_to_ascending_slice(slice: &Slice, len: usize) -> Result<Slice, ArrayError> {
    if slice.step.is_none_or(|s| s > 0) {
        return Ok(*slice);
    }
    let positions = slice.positions(len)?;
    let (Some(&first), Some(&last)) = (positions.last(), positions.first()) else {
        return Ok(Slice::new(Some(0), Some(0), None));
    };
    let step = slice.step.map_or(1, i64::abs);
    Ok(Slice::new(
        Some(first as i64),
        Some(last as i64 + 1),
        (step != 1).then_some(step),
    ))
}

/// Integer-position selector, shared by every `iloc` path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ILocKey {
    Position(i64),
    Slice(Slice),
    Positions(Vec<i64>),
    Mask(Vec<bool>),
}

pub(crate) fn normalize_position(position: i64, len: usize) -> Result<usize, ArrayError> {
    let resolved = if position < 0 {
        position + len as i64
    } else {
        position
    };
    if resolved < 0 || resolved >= len as i64 {
        return Err(ArrayError::PositionOutOfBounds { position, len });
    }
    Ok(resolved as usize)
}

impl ILocKey {
    #[must_use]
    pub const fn all() -> Self {
        Self::Slice(Slice::full())
    }

    /// A single position reduces dimensionality when applied.
    #[must_use]
    pub const fn is_element(&self) -> bool {
        matches!(self, Self::Position(_))
    }

    #[must_use]
    pub fn is_all(&self, len: usize) -> bool {
        match self {
            Self::Slice(slice) => {
                slice.is_full()
                    || slice
                        .indices(len)
                        .is_ok_and(|(start, stop, step)| start == 0 && stop >= len as i64 && step == 1)
            }
            _ => false,
        }
    }

    /// Resolve to in-bounds positions in selection order.
    pub fn positions(&self, len: usize) -> Result<Vec<usize>, ArrayError> {
        match self {
            Self::Position(p) => Ok(vec![normalize_position(*p, len)?]),
            Self::Slice(slice) => slice.positions(len),
            Self::Positions(ps) => ps.iter().map(|&p| normalize_position(p, len)).collect(),
            Self::Mask(mask) => {
                if mask.len() != len {
                    return Err(ArrayError::MaskLengthMismatch {
                        mask_len: mask.len(),
                        len,
                    });
                }
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect())
            }
        }
    }
}

impl From<usize> for ILocKey {
    fn from(position: usize) -> Self {
        Self::Position(position as i64)
    }
}

impl From<Slice> for ILocKey {
    fn from(slice: Slice) -> Self {
        Self::Slice(slice)
    }
}

impl From<Vec<usize>> for ILocKey {
    fn from(positions: Vec<usize>) -> Self {
        Self::Positions(positions.into_iter().map(|p| p as i64).collect())
    }
}

impl From<Vec<bool>> for ILocKey {
    fn from(mask: Vec<bool>) -> Self {
        Self::Mask(mask)
    }
}
