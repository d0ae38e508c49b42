use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sf_array::{
    Array, ILocKey, Slice, argsort, intersect1d, isin, iterable_to_array, roll_1d, union1d,
};
use sf_types::{DType, Label, Scalar, cast_lossless, resolve_dtype};
use tracing::debug;

use crate::IndexError;
use crate::hierarchy::IndexHierarchy;

// ── Mutability capability ──────────────────────────────────────────────

/// Compile-time mutability capability of an index.
pub trait IndexMode: Clone + Copy + fmt::Debug + Default + Send + Sync + 'static {
    /// Whether indices of this mode can never change after construction.
    const STATIC: bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Static;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrowOnly;

impl IndexMode for Static {
    const STATIC: bool = true;
}

impl IndexMode for GrowOnly {
    const STATIC: bool = false;
}

// ── Keys ───────────────────────────────────────────────────────────────

/// Label slice; both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelSlice {
    pub start: Option<Label>,
    pub stop: Option<Label>,
    pub step: Option<i64>,
}

impl LabelSlice {
    #[must_use]
    pub fn new(start: Option<Label>, stop: Option<Label>) -> Self {
        Self {
            start,
            stop,
            step: None,
        }
    }

    #[must_use]
    pub fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }
}

/// Label-based selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum LocKey {
    Label(Label),
    Labels(Vec<Label>),
    Slice(LabelSlice),
    Mask(Vec<bool>),
    ILoc(ILocKey),
}

impl From<Label> for LocKey {
    fn from(label: Label) -> Self {
        Self::Label(label)
    }
}

impl From<&str> for LocKey {
    fn from(label: &str) -> Self {
        Self::Label(Scalar::str(label))
    }
}

impl From<Vec<Label>> for LocKey {
    fn from(labels: Vec<Label>) -> Self {
        Self::Labels(labels)
    }
}

impl From<LabelSlice> for LocKey {
    fn from(slice: LabelSlice) -> Self {
        Self::Slice(slice)
    }
}

/// How `relabel` derives new labels.
#[derive(Clone)]
pub enum Relabel {
    /// Mapped labels are replaced; unmapped labels are kept.
    Map(HashMap<Label, Label>),
    Func(Arc<dyn Fn(&Label) -> Label + Send + Sync>),
    /// Full replacement; the length must match.
    Labels(Vec<Label>),
}

impl fmt::Debug for Relabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
            Self::Labels(labels) => f.debug_tuple("Labels").field(labels).finish(),
        }
    }
}

impl Relabel {
    pub(crate) fn apply<'a, I>(&self, labels: I, len: usize) -> Result<Vec<Label>, IndexError>
    where
        I: IntoIterator<Item = &'a Label>,
    {
        match self {
            Self::Map(map) => Ok(labels
                .into_iter()
                .map(|label| map.get(label).unwrap_or(label).clone())
                .collect()),
            Self::Func(func) => Ok(labels.into_iter().map(|label| func(label)).collect()),
            Self::Labels(new) => {
                if new.len() != len {
                    return Err(IndexError::LengthMismatch {
                        expected: len,
                        found: new.len(),
                    });
                }
                Ok(new.clone())
            }
        }
    }
}

// ── Index ──────────────────────────────────────────────────────────────

/// Ordered, unique labels with O(1) lookup in both directions.
///
/// Labels are stored cast to the index dtype. `Index<Static>` never changes;
/// `IndexGO` (`Index<GrowOnly>`) can append.
#[derive(Debug, Clone)]
pub struct Index<M: IndexMode = Static> {
    labels: Arc<IndexSet<Label>>,
    dtype: DType,
    name: Option<Label>,
    values: OnceLock<Array>,
    mode: PhantomData<M>,
}

pub type IndexGO = Index<GrowOnly>;

impl<M: IndexMode> PartialEq for Index<M> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

fn unique_labels(values: Vec<Label>) -> Result<IndexSet<Label>, IndexError> {
    let mut labels = IndexSet::with_capacity(values.len());
    for label in values {
        if labels.contains(&label) {
            return Err(IndexError::DuplicateLabel {
                label: label.repr(),
            });
        }
        labels.insert(label);
    }
    Ok(labels)
}

impl<M: IndexMode> Index<M> {
    fn from_parts(labels: IndexSet<Label>, dtype: DType, name: Option<Label>) -> Self {
        Self {
            labels: Arc::new(labels),
            dtype,
            name,
            values: OnceLock::new(),
            mode: PhantomData,
        }
    }

    /// Index over `labels` with an inferred dtype. Fails on duplicates.
    pub fn new<I>(labels: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Label>,
    {
        Self::from_array(&iterable_to_array(labels, None)?)
    }

    pub fn with_dtype<I>(labels: I, dtype: DType) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Label>,
    {
        Self::from_array(&iterable_to_array(labels, Some(dtype))?)
    }

    /// Index over the elements of a 1D array; a read-only array is shared as
    /// the cached values.
    pub fn from_array(array: &Array) -> Result<Self, IndexError> {
        if array.ndim() != 1 {
            return Err(sf_array::ArrayError::ExpectedRank {
                expected: 1,
                found: array.ndim(),
            }
            .into());
        }
        let labels = unique_labels(array.to_vec())?;
        let index = Self::from_parts(labels, array.dtype(), None);
        let cached = if array.is_writeable() {
            array.copy()
        } else {
            array.clone()
        };
        let _ = index.values.set(cached);
        Ok(index)
    }

    /// Integer labels `start, start + step, ...` up to `stop` (exclusive).
    pub fn from_range(start: i64, stop: i64, step: i64) -> Result<Self, IndexError> {
        if step == 0 {
            return Err(sf_array::ArrayError::SliceStepZero.into());
        }
        let mut values = Vec::new();
        let mut value = start;
        while (step > 0 && value < stop) || (step < 0 && value > stop) {
            values.push(value);
            value += step;
        }
        Self::from_array(&Array::from_i64s(values))
    }

    /// `0..len`.
    pub fn auto(len: usize) -> Self {
        let labels: IndexSet<Label> = (0..len as i64).map(Scalar::Int).collect();
        Self::from_parts(labels, DType::Int64, None)
    }

    /// Copy of `other` in this mode. Storage is shared only when both modes
    /// are static.
    #[must_use]
    pub fn from_index<N: IndexMode>(other: &Index<N>) -> Self {
        let labels = if M::STATIC && N::STATIC {
            Arc::clone(&other.labels)
        } else {
            Arc::new(other.labels.as_ref().clone())
        };
        let values = OnceLock::new();
        if let Some(cached) = other.values.get() {
            let _ = values.set(cached.clone());
        }
        Self {
            labels,
            dtype: other.dtype,
            name: other.name.clone(),
            values,
            mode: PhantomData,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    #[must_use]
    pub fn rename(&self, name: Option<Label>) -> Self {
        let mut out = self.clone();
        out.name = name;
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Whether both indices share label storage.
    #[must_use]
    pub fn shares_labels<N: IndexMode>(&self, other: &Index<N>) -> bool {
        Arc::ptr_eq(&self.labels, &other.labels)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> + '_ {
        self.labels.iter()
    }

    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        self.labels.iter().cloned().collect()
    }

    /// Labels as a read-only array, built once.
    pub fn values(&self) -> &Array {
        self.values.get_or_init(|| {
            let labels = self.labels();
            Array::from_scalars(&labels, self.dtype).unwrap_or_else(|_| Array::from_objects(labels))
        })
    }

    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<&Label> {
        self.labels.get_index(position)
    }

    /// Position of `label`, retrying with a lossless cast to the index dtype.
    #[must_use]
    pub fn position(&self, label: &Label) -> Option<usize> {
        self.labels.get_index_of(label).or_else(|| {
            let cast = cast_lossless(label, self.dtype)?;
            self.labels.get_index_of(&cast)
        })
    }

    #[must_use]
    pub fn contains(&self, label: &Label) -> bool {
        self.position(label).is_some()
    }

    fn require(&self, label: &Label) -> Result<usize, IndexError> {
        self.position(label).ok_or_else(|| IndexError::KeyNotFound {
            key: label.repr(),
        })
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Translate a label selector to positions. A single label yields a
    /// position key; label slices include both ends.
    pub fn loc_to_iloc(&self, key: &LocKey) -> Result<ILocKey, IndexError> {
        match key {
            LocKey::Label(label) => Ok(ILocKey::Position(self.require(label)? as i64)),
            LocKey::Labels(labels) => labels
                .iter()
                .map(|label| self.require(label).map(|p| p as i64))
                .collect::<Result<Vec<_>, _>>()
                .map(ILocKey::Positions),
            LocKey::Slice(slice) => self.slice_to_iloc(slice),
            LocKey::Mask(mask) => {
                if mask.len() != self.len() {
                    return Err(sf_array::ArrayError::MaskLengthMismatch {
                        mask_len: mask.len(),
                        len: self.len(),
                    }
                    .into());
                }
                Ok(ILocKey::Mask(mask.clone()))
            }
            LocKey::ILoc(key) => Ok(key.clone()),
        }
    }

    fn slice_to_iloc(&self, slice: &LabelSlice) -> Result<ILocKey, IndexError> {
        let step = slice.step.unwrap_or(1);
        let start = slice.start.as_ref().map(|l| self.require(l)).transpose()?;
        let stop = slice.stop.as_ref().map(|l| self.require(l)).transpose()?;
        if step > 0 {
            let stop = stop.map(|p| p as i64 + 1);
            return Ok(ILocKey::Slice(Slice::new(
                start.map(|p| p as i64),
                stop,
                slice.step,
            )));
        }
        // Walking backward, an inclusive stop at position 0 has no exclusive
        // position bound, so resolve to explicit positions.
        let positions = Slice::new(
            start.map(|p| p as i64),
            None,
            Some(step),
        )
        .positions(self.len())?;
        Ok(ILocKey::Positions(
            positions
                .into_iter()
                .take_while(|&p| stop.is_none_or(|s| p >= s))
                .map(|p| p as i64)
                .collect(),
        ))
    }

    /// Positions of a label selector, in selection order.
    pub fn loc_to_positions(&self, key: &LocKey) -> Result<Vec<usize>, IndexError> {
        Ok(self.loc_to_iloc(key)?.positions(self.len())?)
    }

    fn take(&self, positions: &[usize]) -> Self {
        let labels: IndexSet<Label> = positions
            .iter()
            .filter_map(|&p| self.labels.get_index(p).cloned())
            .collect();
        Self::from_parts(labels, self.dtype, self.name.clone())
    }

    /// Sub-index of the selected positions.
    pub fn iloc(&self, key: &ILocKey) -> Result<Self, IndexError> {
        if key.is_all(self.len()) {
            return Ok(self.clone());
        }
        let positions = key.positions(self.len())?;
        let mut seen = vec![false; self.len()];
        for &p in &positions {
            if std::mem::replace(&mut seen[p], true) {
                return Err(IndexError::DuplicateLabel {
                    label: self.labels[p].repr(),
                });
            }
        }
        Ok(self.take(&positions))
    }

    pub fn loc(&self, key: &LocKey) -> Result<Self, IndexError> {
        self.iloc(&self.loc_to_iloc(key)?)
    }

    /// For each label of `target`, its position here.
    #[must_use]
    pub fn get_indexer<N: IndexMode>(&self, target: &Index<N>) -> Vec<Option<usize>> {
        target.iter().map(|label| self.position(label)).collect()
    }

    // ── Comparison and set algebra ─────────────────────────────────────

    /// Same labels in the same order.
    #[must_use]
    pub fn equals<N: IndexMode>(&self, other: &Index<N>) -> bool {
        self.len() == other.len()
            && (Arc::ptr_eq(&self.labels, &other.labels) || self.iter().eq(other.iter()))
    }

    fn shared_name<N: IndexMode>(&self, other: &Index<N>) -> Option<Label> {
        (self.name == other.name).then(|| self.name.clone()).flatten()
    }

    /// Union of labels. Identical operands keep their order; otherwise the
    /// result is sorted when orderable, else left labels then unseen right
    /// labels.
    pub fn union<N: IndexMode>(&self, other: &Index<N>) -> Result<Self, IndexError> {
        if self.equals(other) {
            debug!(len = self.len(), "index union of identical operands");
            return Ok(self.clone());
        }
        let values = union1d(self.values(), other.values(), true)?;
        let mut out = Self::from_array(&values)?;
        out.name = self.shared_name(other);
        Ok(out)
    }

    /// Labels in both; sorted when orderable, else in left order.
    pub fn intersection<N: IndexMode>(&self, other: &Index<N>) -> Result<Self, IndexError> {
        if self.equals(other) {
            return Ok(self.clone());
        }
        let values = intersect1d(self.values(), other.values(), true)?;
        let mut out = Self::from_array(&values)?;
        out.name = self.shared_name(other);
        Ok(out)
    }

    /// Per-label membership in `other`.
    #[must_use]
    pub fn isin(&self, other: &[Label]) -> Array {
        isin(self.values(), other)
    }

    // ── Reordering ─────────────────────────────────────────────────────

    pub fn argsort(&self, ascending: bool) -> Result<Vec<usize>, IndexError> {
        let labels = self.labels();
        let mut order = argsort(&labels).ok_or(IndexError::Unorderable)?;
        if !ascending {
            order.reverse();
        }
        Ok(order)
    }

    pub fn sort(&self, ascending: bool) -> Result<Self, IndexError> {
        Ok(self.take(&self.argsort(ascending)?))
    }

    #[must_use]
    pub fn roll(&self, shift: i64) -> Self {
        let rolled = roll_1d(&Array::arange(self.len()), shift);
        let positions: Vec<usize> = rolled
            .iter()
            .filter_map(|p| match p {
                Scalar::Int(p) => usize::try_from(p).ok(),
                _ => None,
            })
            .collect();
        self.take(&positions)
    }

    #[must_use]
    pub fn head(&self, count: usize) -> Self {
        let positions: Vec<usize> = (0..count.min(self.len())).collect();
        self.take(&positions)
    }

    #[must_use]
    pub fn tail(&self, count: usize) -> Self {
        let len = self.len();
        let positions: Vec<usize> = (len.saturating_sub(count)..len).collect();
        self.take(&positions)
    }

    // ── Relabeling ─────────────────────────────────────────────────────

    /// New index with relabeled labels; the dtype is inferred again.
    pub fn relabel(&self, relabel: &Relabel) -> Result<Self, IndexError> {
        let labels = relabel.apply(self.iter(), self.len())?;
        let mut out = Self::new(labels)?;
        out.name = self.name.clone();
        Ok(out)
    }

    /// Depth-2 hierarchy with `level` as the single outer label.
    pub fn relabel_add_level(&self, level: Label) -> Result<IndexHierarchy<M>, IndexError> {
        let rows: Vec<Vec<Label>> = self
            .iter()
            .map(|label| vec![level.clone(), label.clone()])
            .collect();
        let hierarchy = IndexHierarchy::from_rows(rows, 2)?;
        Ok(hierarchy.rename(self.name.clone()))
    }

    #[must_use]
    pub fn to_static(&self) -> Index<Static> {
        Index::from_index(self)
    }

    #[must_use]
    pub fn to_grow_only(&self) -> IndexGO {
        Index::from_index(self)
    }
}

impl Index<GrowOnly> {
    /// Append a label at the next position. A label outside the current dtype
    /// widens it.
    pub fn append(&mut self, label: Label) -> Result<(), IndexError> {
        if self.contains(&label) {
            return Err(IndexError::DuplicateLabel {
                label: label.repr(),
            });
        }
        let dtype = if self.is_empty() {
            iterable_to_array([label.clone()], None)?.dtype()
        } else {
            resolve_dtype(self.dtype, label.natural_dtype())
        };
        if dtype == self.dtype {
            let cast = sf_types::cast_scalar(&label, dtype)?;
            Arc::make_mut(&mut self.labels).insert(cast);
        } else {
            debug!(from = %self.dtype, to = %dtype, "grow-only index widens dtype");
            let mut labels = self.labels();
            labels.push(label);
            let array = iterable_to_array(labels, Some(dtype))?;
            self.labels = Arc::new(unique_labels(array.to_vec())?);
            self.dtype = array.dtype();
        }
        self.values = OnceLock::new();
        Ok(())
    }

    pub fn extend<I>(&mut self, labels: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = Label>,
    {
        labels.into_iter().try_for_each(|label| self.append(label))
    }
}

impl<M: IndexMode> fmt::Display for Index<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.iter().map(Label::repr).collect();
        write!(f, "Index([{}], dtype={})", labels.join(", "), self.dtype)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use sf_array::{ILocKey, Slice};
    use sf_types::{DType, Label, Scalar, TimeUnit};

    use super::{Index, IndexGO, LabelSlice, LocKey, Relabel};
    use crate::IndexError;

    fn strs(values: &[&str]) -> Vec<Label> {
        values.iter().map(|s| Scalar::str(*s)).collect()
    }

    fn abc() -> Index {
        Index::new(strs(&["a", "b", "c", "d"])).expect("unique")
    }

    #[test]
    fn construction_rejects_duplicates() {
        let err = Index::<super::Static>::new(strs(&["a", "b", "a"])).expect_err("duplicate");
        assert_eq!(
            err,
            IndexError::DuplicateLabel {
                label: "'a'".to_owned()
            }
        );
    }

    #[test]
    fn dtype_is_inferred_and_lookup_casts() {
        let ix: Index = Index::new([Scalar::Int(1), Scalar::Float(2.5)]).expect("floats");
        assert_eq!(ix.dtype(), DType::Float64);
        assert_eq!(ix.position(&Scalar::Int(1)), Some(0));
        assert_eq!(ix.position(&Scalar::Float(2.5)), Some(1));
        assert!(!ix.contains(&Scalar::str("1")));
        assert!(!ix.values().is_writeable());
    }

    #[test]
    fn loc_round_trips_through_positions() {
        let ix = abc();
        for label in ix.labels() {
            let key = ix.loc_to_iloc(&LocKey::Label(label.clone())).expect("present");
            let ILocKey::Position(p) = key else {
                panic!("single label gives a position");
            };
            assert_eq!(ix.label_at(p as usize), Some(&label));
        }
        assert_eq!(
            ix.loc_to_iloc(&LocKey::from("z")),
            Err(IndexError::KeyNotFound {
                key: "'z'".to_owned()
            })
        );
        assert_eq!(
            ix.loc_to_positions(&LocKey::Labels(Vec::new())).expect("empty"),
            Vec::<usize>::new()
        );
    }

    #[test]
    fn label_slices_are_inclusive_in_both_directions() {
        let ix = abc();
        let forward = LabelSlice::new(Some(Scalar::str("b")), Some(Scalar::str("c")));
        assert_eq!(ix.loc_to_positions(&forward.into()).expect("slice"), vec![1, 2]);
        let backward = LabelSlice::new(Some(Scalar::str("c")), Some(Scalar::str("a"))).with_step(-1);
        assert_eq!(
            ix.loc_to_positions(&backward.into()).expect("slice"),
            vec![2, 1, 0]
        );
        let open = LabelSlice::new(None, Some(Scalar::str("b")));
        assert_eq!(ix.loc(&open.into()).expect("slice").labels(), strs(&["a", "b"]));
    }

    #[test]
    fn iso_strings_find_labels_on_a_date_index() {
        let day = DType::DateTime64(TimeUnit::Day);
        let ix: Index = Index::with_dtype(
            [0, 1, 2].map(|d| Scalar::DateTime(d, TimeUnit::Day)),
            day,
        )
        .expect("dates");
        assert_eq!(ix.position(&Scalar::str("1970-01-02")), Some(1));
        assert!(!ix.contains(&Scalar::str("1970-01-05")));
        let slice = LabelSlice::new(Some(Scalar::str("1970-01-02")), Some(Scalar::str("1970-01-03")));
        assert_eq!(ix.loc_to_positions(&slice.into()).expect("slice"), vec![1, 2]);
    }

    #[test]
    fn union_keeps_order_for_identical_operands() {
        let left = Index::<super::Static>::new(strs(&["c", "a", "b"])).expect("unique");
        let right = Index::<super::Static>::new(strs(&["c", "a", "b"])).expect("unique");
        assert_eq!(left.union(&right).expect("union").labels(), strs(&["c", "a", "b"]));

        let a: Index = Index::new(strs(&["a", "b", "c"])).expect("unique");
        let b: Index = Index::new(strs(&["b", "c", "d"])).expect("unique");
        assert_eq!(a.union(&b).expect("union").labels(), strs(&["a", "b", "c", "d"]));
        assert_eq!(a.intersection(&b).expect("intersection").labels(), strs(&["b", "c"]));
    }

    #[test]
    fn unorderable_union_uses_insertion_order() {
        let a: Index = Index::new([Scalar::str("x"), Scalar::Int(3)]).expect("mixed");
        let b: Index = Index::new([Scalar::Int(1), Scalar::str("x")]).expect("mixed");
        assert_eq!(
            a.union(&b).expect("union").labels(),
            vec![Scalar::str("x"), Scalar::Int(3), Scalar::Int(1)]
        );
    }

    #[test]
    fn static_indices_share_storage_only_with_static() {
        let ix = abc();
        let shared: Index = Index::from_index(&ix);
        assert!(shared.shares_labels(&ix));
        let grow: IndexGO = Index::from_index(&ix);
        assert!(!grow.shares_labels(&ix));
    }

    #[test]
    fn grow_only_appends_and_widens() {
        let mut ix: IndexGO = Index::new([Scalar::Int(1), Scalar::Int(2)]).expect("ints");
        ix.append(Scalar::Int(3)).expect("new label");
        assert_eq!(ix.dtype(), DType::Int64);
        assert_eq!(ix.position(&Scalar::Int(3)), Some(2));
        ix.append(Scalar::str("a")).expect("widen");
        assert_eq!(ix.dtype(), DType::Object);
        assert_eq!(ix.len(), 4);
        assert!(matches!(
            ix.append(Scalar::Int(1)),
            Err(IndexError::DuplicateLabel { .. })
        ));
        assert_eq!(ix.values().len(), 4);

        let mut empty: IndexGO = Index::new(Vec::new()).expect("empty");
        empty.extend(strs(&["a", "bb"])).expect("extend");
        assert_eq!(empty.dtype(), DType::Str(2));
        assert_eq!(empty.to_static().labels(), strs(&["a", "bb"]));
    }

    #[test]
    fn reordering_operations() {
        let ix: Index = Index::new(strs(&["b", "d", "a", "c"])).expect("unique");
        assert_eq!(ix.argsort(true).expect("sortable"), vec![2, 0, 3, 1]);
        assert_eq!(ix.sort(false).expect("sortable").labels(), strs(&["d", "c", "b", "a"]));
        assert_eq!(ix.roll(1).labels(), strs(&["c", "b", "d", "a"]));
        assert_eq!(ix.head(2).labels(), strs(&["b", "d"]));
        assert_eq!(ix.tail(1).labels(), strs(&["c"]));
        assert_eq!(
            ix.iloc(&ILocKey::Slice(Slice::new(None, None, Some(-2)))).expect("iloc").labels(),
            strs(&["c", "d"])
        );
    }

    #[test]
    fn relabel_by_map_function_and_replacement() {
        let ix = abc();
        let map: HashMap<Label, Label> = [(Scalar::str("a"), Scalar::str("A"))].into_iter().collect();
        assert_eq!(
            ix.relabel(&Relabel::Map(map)).expect("map").labels(),
            strs(&["A", "b", "c", "d"])
        );
        let upper = Relabel::Func(Arc::new(|label: &Label| {
            Scalar::str(label.as_str().unwrap_or_default().to_uppercase())
        }));
        assert_eq!(ix.relabel(&upper).expect("func").labels(), strs(&["A", "B", "C", "D"]));
        assert!(matches!(
            ix.relabel(&Relabel::Labels(strs(&["x"]))),
            Err(IndexError::LengthMismatch { expected: 4, found: 1 })
        ));
    }

    #[test]
    fn ranges_and_auto() {
        let r: Index = Index::from_range(0, 10, 3).expect("range");
        assert_eq!(
            r.labels(),
            vec![Scalar::Int(0), Scalar::Int(3), Scalar::Int(6), Scalar::Int(9)]
        );
        let down: Index = Index::from_range(3, 0, -1).expect("range");
        assert_eq!(down.labels(), vec![Scalar::Int(3), Scalar::Int(2), Scalar::Int(1)]);
        assert_eq!(Index::<super::Static>::auto(3).position(&Scalar::Int(2)), Some(2));
    }
}
