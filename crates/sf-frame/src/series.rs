use sf_array::{
    ArithmeticOp, Array, ArrayError, Axis, BinaryOp, ILocKey, Shape, Slice, UnaryOp, argsort,
    array_shift, array_to_duplicated, binary_op, binary_op_scalar, concat_resolved, dot_1d,
    fill_dtype, full_for_fill, isin, isna_array, iterable_to_array, roll_1d, ufunc_unique,
    unary_op,
};
use sf_blocks::na_fill_for;
use sf_index::{AxisIndex, HLoc, HSelector, LocKey, Relabel};
use sf_types::{DType, Label, Scalar};

use crate::engine::{align_inner_dimension, align_outer, conform_array};
use crate::{FrameError, Selection};

pub(crate) fn na_flags(array: &Array) -> Vec<bool> {
    isna_array(array)
        .iter()
        .map(|flag| matches!(flag, Scalar::Bool(true)))
        .collect()
}

pub(crate) fn positions_key<I>(positions: I) -> ILocKey
where
    I: IntoIterator<Item = usize>,
{
    ILocKey::Positions(positions.into_iter().map(|p| p as i64).collect())
}

/// A labeled, immutable 1D array.
#[derive(Debug, Clone)]
pub struct Series {
    values: Array,
    index: AxisIndex,
    name: Option<Label>,
}

impl Series {
    /// Pair `values` with `index`; lengths must agree. Writeable input is
    /// copied so the series never aliases mutable storage.
    pub fn new(values: Array, index: AxisIndex) -> Result<Self, FrameError> {
        if values.ndim() != 1 {
            return Err(ArrayError::ExpectedRank {
                expected: 1,
                found: values.ndim(),
            }
            .into());
        }
        if values.len() != index.len() {
            return Err(FrameError::LengthMismatch {
                index_len: index.len(),
                values_len: values.len(),
            });
        }
        let values = if values.is_writeable() {
            values.copy()
        } else {
            values
        };
        Ok(Self {
            values,
            index,
            name: None,
        })
    }

    /// Values over the auto index `0..len`.
    pub fn from_values(values: Array) -> Result<Self, FrameError> {
        let index = AxisIndex::auto(values.len());
        Self::new(values, index)
    }

    pub fn from_element(element: &Scalar, index: AxisIndex) -> Result<Self, FrameError> {
        let values = full_for_fill(None, Shape::One(index.len()), element)?;
        Self::new(values, index)
    }

    pub fn from_items<I>(items: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = (Label, Scalar)>,
    {
        let (labels, values): (Vec<Label>, Vec<Scalar>) = items.into_iter().unzip();
        let index = AxisIndex::new(labels)?;
        Self::new(iterable_to_array(values, None)?, index)
    }

    /// Concatenate end to end; the combined index must stay unique.
    pub fn from_concat<'a, I>(series: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let series: Vec<&Series> = series.into_iter().collect();
        let values: Vec<Array> = series.iter().map(|s| s.values.clone()).collect();
        let values = concat_resolved(&values, Axis::Rows)?;
        let index = AxisIndex::concat(series.iter().map(|s| &s.index))?;
        Self::new(values, index)
    }

    /// Concatenate, adding each key as an outer hierarchy level.
    pub fn from_concat_items<I>(items: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = (Label, Series)>,
    {
        let parts = items
            .into_iter()
            .map(|(key, series)| -> Result<Series, FrameError> {
                let index = series.index.relabel_add_level(key)?;
                Ok(Series { index, ..series })
            })
            .collect::<Result<Vec<_>, FrameError>>()?;
        Self::from_concat(&parts)
    }

    #[must_use]
    pub fn with_name(mut self, name: Label) -> Self {
        self.name = Some(name);
        self
    }

    fn with_parts(&self, values: Array, index: AxisIndex) -> Self {
        Self {
            values,
            index,
            name: self.name.clone(),
        }
    }

    fn with_values(&self, values: Array) -> Self {
        self.with_parts(values, self.index.clone())
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    /// The read-only values.
    #[must_use]
    pub fn values(&self) -> &Array {
        &self.values
    }

    #[must_use]
    pub fn index(&self) -> &AxisIndex {
        &self.index
    }

    #[must_use]
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    #[must_use]
    pub fn rename(&self, name: Option<Label>) -> Self {
        Self {
            name,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.name == other.name && self.index.equals(&other.index) && self.values.equals(&other.values)
    }

    pub fn iter_items(&self) -> impl Iterator<Item = (Label, Scalar)> + '_ {
        self.index.iter().cloned().zip(self.values.iter())
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn element_at(&self, position: usize) -> Result<Scalar, FrameError> {
        self.values.get(position).ok_or_else(|| {
            ArrayError::PositionOutOfBounds {
                position: position as i64,
                len: self.len(),
            }
            .into()
        })
    }

    fn take(&self, key: &ILocKey) -> Result<Self, FrameError> {
        if key.is_all(self.len()) {
            return Ok(self.clone());
        }
        Ok(self.with_parts(self.values.select_rows(key)?, self.index.iloc(key)?))
    }

    /// A single position gives an element, anything else a series.
    pub fn iloc(&self, key: &ILocKey) -> Result<Selection, FrameError> {
        if key.is_element() {
            let position = key.positions(self.len())?[0];
            return self.element_at(position).map(Selection::Element);
        }
        self.take(key).map(Selection::Series)
    }

    pub fn loc(&self, key: &LocKey) -> Result<Selection, FrameError> {
        self.iloc(&self.index.loc_to_iloc(key)?)
    }

    /// Per-depth selection; a label at every depth gives an element.
    pub fn hloc(&self, key: &HLoc) -> Result<Selection, FrameError> {
        if let AxisIndex::Hierarchy(hierarchy) = &self.index {
            let terminal = key.0.len() == hierarchy.depth()
                && key.0.iter().all(|s| matches!(s, HSelector::Label(_)));
            if terminal {
                let position = hierarchy.loc_to_iloc_terminal(key)?;
                return self.element_at(position).map(Selection::Element);
            }
        }
        self.take(&self.index.hloc_to_iloc(key)?).map(Selection::Series)
    }

    #[must_use]
    pub fn get(&self, label: &Label) -> Option<Scalar> {
        self.index.position(label).and_then(|p| self.values.get(p))
    }

    // ── Reindexing and relabeling ──────────────────────────────────────

    /// Conform to `index`; labels not present take `fill`, by default NaN
    /// (NaT for temporal values).
    pub fn reindex(&self, index: AxisIndex, fill: Option<&Scalar>) -> Result<Self, FrameError> {
        if self.index.equals(&index) {
            return Ok(self.with_parts(self.values.clone(), index));
        }
        let positions = self.index.get_indexer(&index);
        let fill = fill.cloned().unwrap_or_else(|| na_fill_for(self.dtype()));
        let values = self.values.take_rows_with_fill(&positions, &fill)?;
        Ok(self.with_parts(values, index))
    }

    pub fn relabel(&self, relabel: &Relabel) -> Result<Self, FrameError> {
        Ok(self.with_parts(self.values.clone(), self.index.relabel(relabel)?))
    }

    pub fn relabel_add_level(&self, level: Label) -> Result<Self, FrameError> {
        Ok(self.with_parts(self.values.clone(), self.index.relabel_add_level(level)?))
    }

    pub fn relabel_drop_level(&self, count: i64) -> Result<Self, FrameError> {
        Ok(self.with_parts(self.values.clone(), self.index.relabel_drop_level(count)?))
    }

    /// Reorder index depths; values follow their labels.
    pub fn rehierarch(&self, order: &[usize]) -> Result<Self, FrameError> {
        let (index, permutation) = self.index.rehierarch(order)?;
        Ok(self.with_parts(self.values.take_rows(&permutation)?, index))
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// Elementwise operator on the union of both indices. Labels missing on
    /// one side contribute NaN.
    pub fn binary_op(&self, other: &Series, op: BinaryOp) -> Result<Self, FrameError> {
        let plan = align_outer(&self.index, &other.index)?;
        let left = conform_array(&self.values, &plan.left)?;
        let right = conform_array(&other.values, &plan.right)?;
        let values = binary_op(&left, &right, op)?;
        let name = (self.name == other.name).then(|| self.name.clone()).flatten();
        Ok(Self {
            values,
            index: plan.union_index,
            name,
        })
    }

    pub fn binary_op_scalar(&self, value: &Scalar, op: BinaryOp, reflected: bool) -> Result<Self, FrameError> {
        Ok(self.with_values(binary_op_scalar(&self.values, value, op, reflected)?))
    }

    pub fn unary_op(&self, op: UnaryOp) -> Result<Self, FrameError> {
        Ok(self.with_values(unary_op(&self.values, op)?))
    }

    pub fn add(&self, other: &Series) -> Result<Self, FrameError> {
        self.binary_op(other, ArithmeticOp::Add.into())
    }

    pub fn sub(&self, other: &Series) -> Result<Self, FrameError> {
        self.binary_op(other, ArithmeticOp::Sub.into())
    }

    pub fn mul(&self, other: &Series) -> Result<Self, FrameError> {
        self.binary_op(other, ArithmeticOp::Mul.into())
    }

    pub fn div(&self, other: &Series) -> Result<Self, FrameError> {
        self.binary_op(other, ArithmeticOp::Div.into())
    }

    /// Dot product over aligned labels; both sides must hold the same labels.
    pub fn matmul(&self, other: &Series) -> Result<Scalar, FrameError> {
        let plan = align_inner_dimension(
            &self.index,
            &other.index,
            self.values.shape(),
            other.values.shape(),
        )?;
        let left = conform_array(&self.values, &plan.left)?;
        let right = conform_array(&other.values, &plan.right)?;
        Ok(dot_1d(&left, &right)?)
    }

    // ── Missing values ─────────────────────────────────────────────────

    #[must_use]
    pub fn isna(&self) -> Self {
        self.with_values(isna_array(&self.values))
    }

    #[must_use]
    pub fn notna(&self) -> Self {
        let flags = na_flags(&self.values).into_iter().map(|na| !na).collect();
        self.with_values(Array::from_bools(flags))
    }

    pub fn dropna(&self) -> Result<Self, FrameError> {
        let keep = na_flags(&self.values)
            .into_iter()
            .enumerate()
            .filter_map(|(i, na)| (!na).then_some(i));
        self.take(&positions_key(keep))
    }

    fn fill_where(&self, mask: &[bool], value: &Scalar) -> Result<Self, FrameError> {
        if !mask.iter().any(|&m| m) {
            return Ok(self.clone());
        }
        let dtype = fill_dtype(self.dtype(), value);
        let values: Vec<Scalar> = self
            .values
            .iter()
            .zip(mask)
            .map(|(v, &m)| if m { value.clone() } else { v })
            .collect();
        Ok(self.with_values(Array::from_scalars(&values, dtype)?))
    }

    /// Replace missing values with `value`, widening the dtype to hold it.
    pub fn fillna(&self, value: &Scalar) -> Result<Self, FrameError> {
        self.fill_where(&na_flags(&self.values), value)
    }

    fn fill_directional(&self, forward: bool, limit: Option<usize>) -> Result<Self, FrameError> {
        let na = na_flags(&self.values);
        let values = self.values.to_vec();
        let mut out = values.clone();
        let order: Box<dyn Iterator<Item = usize>> = if forward {
            Box::new(0..values.len())
        } else {
            Box::new((0..values.len()).rev())
        };
        let mut last = None;
        let mut run = 0;
        for i in order {
            if !na[i] {
                last = Some(i);
                run = 0;
                continue;
            }
            run += 1;
            if let Some(source) = last {
                if limit.is_none_or(|limit| run <= limit) {
                    out[i] = values[source].clone();
                }
            }
        }
        Ok(self.with_values(Array::from_scalars(&out, self.dtype())?))
    }

    /// Carry the last valid value forward over at most `limit` missing values
    /// per gap.
    pub fn fillna_forward(&self, limit: Option<usize>) -> Result<Self, FrameError> {
        self.fill_directional(true, limit)
    }

    pub fn fillna_backward(&self, limit: Option<usize>) -> Result<Self, FrameError> {
        self.fill_directional(false, limit)
    }

    /// Fill the missing values before the first valid one.
    pub fn fillna_leading(&self, value: &Scalar) -> Result<Self, FrameError> {
        let mut mask = na_flags(&self.values);
        if let Some(first) = mask.iter().position(|&na| !na) {
            mask[first..].iter_mut().for_each(|m| *m = false);
        }
        self.fill_where(&mask, value)
    }

    /// Fill the missing values after the last valid one.
    pub fn fillna_trailing(&self, value: &Scalar) -> Result<Self, FrameError> {
        let mut mask = na_flags(&self.values);
        if let Some(last) = mask.iter().rposition(|&na| !na) {
            mask[..=last].iter_mut().for_each(|m| *m = false);
        }
        self.fill_where(&mask, value)
    }

    // ── Transformation ─────────────────────────────────────────────────

    pub fn astype(&self, dtype: DType) -> Result<Self, FrameError> {
        Ok(self.with_values(self.values.astype(dtype)?))
    }

    /// Circular shift of the values, and of the index when `include_index`.
    pub fn roll(&self, shift: i64, include_index: bool) -> Result<Self, FrameError> {
        let values = roll_1d(&self.values, shift);
        let index = if include_index {
            self.index.roll(shift)?
        } else {
            self.index.clone()
        };
        Ok(self.with_parts(values, index))
    }

    /// Shift values against the index; vacated positions take `fill`, by
    /// default NaN (NaT for temporal values).
    pub fn shift(&self, shift: i64, fill: Option<&Scalar>) -> Result<Self, FrameError> {
        let fill = fill.cloned().unwrap_or_else(|| na_fill_for(self.dtype()));
        Ok(self.with_values(array_shift(&self.values, shift, Axis::Rows, false, &fill)?))
    }

    pub fn head(&self, count: usize) -> Result<Self, FrameError> {
        self.take(&ILocKey::Slice(Slice::new(None, Some(count as i64), None)))
    }

    pub fn tail(&self, count: usize) -> Result<Self, FrameError> {
        let start = self.len().saturating_sub(count);
        self.take(&ILocKey::Slice(Slice::new(Some(start as i64), None, None)))
    }

    #[must_use]
    pub fn duplicated(&self, exclude_first: bool, exclude_last: bool) -> Self {
        self.with_values(array_to_duplicated(
            &self.values,
            Axis::Rows,
            exclude_first,
            exclude_last,
        ))
    }

    pub fn drop_duplicated(&self, exclude_first: bool, exclude_last: bool) -> Result<Self, FrameError> {
        let flags = self.duplicated(exclude_first, exclude_last);
        let keep = flags
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, flag)| (!matches!(flag, Scalar::Bool(true))).then_some(i));
        self.take(&positions_key(keep))
    }

    /// Distinct values: sorted when orderable, else in order of appearance.
    pub fn unique(&self) -> Result<Array, FrameError> {
        Ok(ufunc_unique(&self.values)?)
    }

    #[must_use]
    pub fn isin(&self, other: &[Scalar]) -> Self {
        self.with_values(isin(&self.values, other))
    }

    pub fn sort_index(&self, ascending: bool) -> Result<Self, FrameError> {
        let order = self.index.argsort(ascending)?;
        self.take(&positions_key(order))
    }

    pub fn sort_values(&self, ascending: bool) -> Result<Self, FrameError> {
        let mut order = argsort(&self.values.to_vec()).ok_or(ArrayError::Unorderable)?;
        if !ascending {
            order.reverse();
        }
        self.take(&positions_key(order))
    }
}

#[cfg(test)]
mod tests {
    use sf_array::{Array, ComparisonOp, ILocKey};
    use sf_index::{AxisIndex, HLoc, HSelector, IndexHierarchy, LocKey};
    use sf_types::{DType, Scalar};

    use super::Series;
    use crate::{FrameError, Selection};

    fn s(v: &str) -> Scalar {
        Scalar::str(v)
    }

    fn floats(values: &[f64], labels: &[&str]) -> Series {
        let index = AxisIndex::new(labels.iter().map(|l| s(l))).expect("unique");
        Series::new(Array::from_f64s(values.to_vec()), index).expect("series")
    }

    #[test]
    fn construction_checks_length_and_freezes() {
        let index = AxisIndex::auto(2);
        let err = Series::new(Array::from_i64s(vec![1, 2, 3]), index).expect_err("length");
        assert_eq!(
            err,
            FrameError::LengthMismatch {
                index_len: 2,
                values_len: 3
            }
        );
        let mutable = Array::from_i64s(vec![1, 2]).to_mutable();
        let series = Series::from_values(mutable).expect("series");
        assert!(!series.values().is_writeable());
    }

    #[test]
    fn selection_dimensionality() {
        let series = floats(&[1.0, 2.0, 3.0], &["a", "b", "c"]);
        assert_eq!(
            series.loc(&LocKey::from("b")).expect("label").into_element(),
            Some(Scalar::Float(2.0))
        );
        let sub = series
            .iloc(&ILocKey::Positions(vec![2, 0]))
            .expect("positions")
            .into_series()
            .expect("series");
        assert_eq!(sub.index().labels(), vec![s("c"), s("a")]);
        assert_eq!(series.get(&s("z")), None);
    }

    #[test]
    fn hloc_selects_prefixes_and_elements() {
        let index = IndexHierarchy::from_product([vec![s("x"), s("y")], vec![Scalar::Int(1), Scalar::Int(2)]])
            .expect("product");
        let series = Series::new(Array::from_i64s(vec![10, 20, 30, 40]), index.into()).expect("series");
        let outer = series
            .hloc(&HLoc(vec![HSelector::Label(s("y"))]))
            .expect("outer")
            .into_series()
            .expect("series");
        assert_eq!(outer.values().to_vec(), vec![Scalar::Int(30), Scalar::Int(40)]);
        let element = series
            .hloc(&HLoc::tuple([s("x"), Scalar::Int(2)]))
            .expect("terminal");
        assert!(matches!(element, Selection::Element(Scalar::Int(20))));
    }

    #[test]
    fn directional_fills_respect_limits() {
        let nan = f64::NAN;
        let series = floats(&[nan, 1.0, nan, nan, 4.0, nan], &["a", "b", "c", "d", "e", "f"]);
        let forward = series.fillna_forward(Some(1)).expect("forward");
        let got: Vec<Scalar> = forward.values().to_vec();
        assert!(got[0].is_nan());
        assert_eq!(got[2], Scalar::Float(1.0));
        assert!(got[3].is_nan());
        assert_eq!(got[5], Scalar::Float(4.0));

        let backward = series.fillna_backward(None).expect("backward");
        assert_eq!(backward.values().get(0), Some(Scalar::Float(1.0)));
        assert_eq!(backward.values().get(3), Some(Scalar::Float(4.0)));
        assert!(backward.values().get(5).is_some_and(|v| v.is_nan()));

        let leading = series.fillna_leading(&Scalar::Float(0.0)).expect("leading");
        assert_eq!(leading.values().get(0), Some(Scalar::Float(0.0)));
        assert!(leading.values().get(2).is_some_and(|v| v.is_nan()));
        let trailing = series.fillna_trailing(&Scalar::Float(0.0)).expect("trailing");
        assert_eq!(trailing.values().get(5), Some(Scalar::Float(0.0)));
        assert!(trailing.values().get(0).is_some_and(|v| v.is_nan()));
        assert_eq!(series.dropna().expect("dropna").len(), 2);
    }

    #[test]
    fn shift_roll_and_duplicates() {
        let series = Series::from_values(Array::from_i64s(vec![1, 2, 1])).expect("series");
        let shifted = series.shift(1, None).expect("shift");
        assert_eq!(shifted.dtype(), DType::Float64);
        assert!(shifted.values().get(0).is_some_and(|v| v.is_nan()));
        let rolled = series.roll(1, true).expect("roll");
        assert_eq!(rolled.index().label_at(0), Some(&Scalar::Int(2)));
        assert_eq!(
            series.duplicated(true, false).values().to_vec(),
            vec![Scalar::Bool(false), Scalar::Bool(false), Scalar::Bool(true)]
        );
        assert_eq!(series.drop_duplicated(true, false).expect("drop").len(), 2);
        assert_eq!(
            series.unique().expect("unique").to_vec(),
            vec![Scalar::Int(1), Scalar::Int(2)]
        );
    }

    #[test]
    fn sorting_and_membership() {
        let series = floats(&[3.0, 1.0, 2.0], &["b", "c", "a"]);
        let by_value = series.sort_values(true).expect("values");
        assert_eq!(by_value.index().labels(), vec![s("c"), s("a"), s("b")]);
        let by_index = series.sort_index(false).expect("index");
        assert_eq!(by_index.index().labels(), vec![s("c"), s("b"), s("a")]);
        let member = series.isin(&[Scalar::Int(1), Scalar::Float(3.0)]);
        assert_eq!(
            member.values().to_vec(),
            vec![Scalar::Bool(true), Scalar::Bool(true), Scalar::Bool(false)]
        );
        let gt = series
            .binary_op_scalar(&Scalar::Int(1), ComparisonOp::Gt.into(), false)
            .expect("compare");
        assert_eq!(gt.dtype(), DType::Bool);
    }

    #[test]
    fn concat_items_add_an_outer_level() {
        let a = floats(&[1.0], &["p"]);
        let b = floats(&[2.0], &["p"]);
        let combined = Series::from_concat_items([(s("a"), a.clone()), (s("b"), b)]).expect("concat");
        assert_eq!(combined.index().depth(), 2);
        assert_eq!(combined.get(&Scalar::tuple([s("b"), s("p")])), Some(Scalar::Float(2.0)));
        assert!(matches!(
            Series::from_concat([&a, &a]),
            Err(FrameError::Index(_))
        ));
    }
}
