use std::fmt;

use sf_array::{Array, ILocKey};
use sf_types::{DType, Label};

use crate::IndexError;
use crate::hierarchy::{HLoc, IndexHierarchy};
use crate::index::{Index, LocKey, Relabel};

/// The label layer of one container axis: flat or hierarchical.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisIndex {
    Flat(Index),
    Hierarchy(IndexHierarchy),
}

impl From<Index> for AxisIndex {
    fn from(index: Index) -> Self {
        Self::Flat(index)
    }
}

impl From<IndexHierarchy> for AxisIndex {
    fn from(hierarchy: IndexHierarchy) -> Self {
        Self::Hierarchy(hierarchy)
    }
}

impl AxisIndex {
    /// `0..len`.
    #[must_use]
    pub fn auto(len: usize) -> Self {
        Self::Flat(Index::auto(len))
    }

    pub fn new<I>(labels: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Label>,
    {
        Index::new(labels).map(Self::Flat)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(index) => index.len(),
            Self::Hierarchy(hierarchy) => hierarchy.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Flat(_) => 1,
            Self::Hierarchy(hierarchy) => hierarchy.depth(),
        }
    }

    /// Dtype of flat labels; hierarchies report object.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Flat(index) => index.dtype(),
            Self::Hierarchy(_) => DType::Object,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&Label> {
        match self {
            Self::Flat(index) => index.name(),
            Self::Hierarchy(hierarchy) => hierarchy.name(),
        }
    }

    #[must_use]
    pub fn rename(&self, name: Option<Label>) -> Self {
        match self {
            Self::Flat(index) => Self::Flat(index.rename(name)),
            Self::Hierarchy(hierarchy) => Self::Hierarchy(hierarchy.rename(name)),
        }
    }

    /// Label at `position`; hierarchies give tuples.
    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<&Label> {
        match self {
            Self::Flat(index) => index.label_at(position),
            Self::Hierarchy(hierarchy) => hierarchy.label_at(position),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Label> + '_> {
        match self {
            Self::Flat(index) => Box::new(index.iter()),
            Self::Hierarchy(hierarchy) => Box::new(hierarchy.iter()),
        }
    }

    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        self.iter().cloned().collect()
    }

    #[must_use]
    pub fn position(&self, label: &Label) -> Option<usize> {
        match self {
            Self::Flat(index) => index.position(label),
            Self::Hierarchy(hierarchy) => hierarchy.position(label),
        }
    }

    /// Labels as a 1D array; hierarchies give an object array of tuples.
    #[must_use]
    pub fn values(&self) -> Array {
        match self {
            Self::Flat(index) => index.values().clone(),
            Self::Hierarchy(hierarchy) => Array::from_objects(hierarchy.iter().cloned().collect()),
        }
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Translate a label key. On a hierarchy, labels are whole tuples.
    pub fn loc_to_iloc(&self, key: &LocKey) -> Result<ILocKey, IndexError> {
        match self {
            Self::Flat(index) => index.loc_to_iloc(key),
            Self::Hierarchy(hierarchy) => match key {
                LocKey::Label(label) => hierarchy
                    .position(label)
                    .map(|p| ILocKey::Position(p as i64))
                    .ok_or_else(|| IndexError::KeyNotFound { key: label.repr() }),
                LocKey::Labels(labels) => labels
                    .iter()
                    .map(|label| {
                        hierarchy
                            .position(label)
                            .map(|p| p as i64)
                            .ok_or_else(|| IndexError::KeyNotFound { key: label.repr() })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(ILocKey::Positions),
                other => hierarchy.flat()?.loc_to_iloc(other),
            },
        }
    }

    /// Per-depth selection. A flat index accepts a single selector.
    pub fn hloc_to_iloc(&self, key: &HLoc) -> Result<ILocKey, IndexError> {
        match self {
            Self::Hierarchy(hierarchy) => {
                let positions = hierarchy.loc_to_iloc(key)?;
                Ok(ILocKey::Positions(positions.into_iter().map(|p| p as i64).collect()))
            }
            Self::Flat(index) => {
                if key.0.len() > 1 {
                    return Err(IndexError::DepthMismatch {
                        expected: 1,
                        found: key.0.len(),
                    });
                }
                let single: IndexHierarchy = IndexHierarchy::from_rows(
                    index.iter().map(|label| vec![label.clone()]).collect(),
                    1,
                )?;
                let positions = single.loc_to_iloc(key)?;
                Ok(ILocKey::Positions(positions.into_iter().map(|p| p as i64).collect()))
            }
        }
    }

    pub fn iloc(&self, key: &ILocKey) -> Result<Self, IndexError> {
        match self {
            Self::Flat(index) => index.iloc(key).map(Self::Flat),
            Self::Hierarchy(hierarchy) => hierarchy.iloc(key).map(Self::Hierarchy),
        }
    }

    pub fn loc(&self, key: &LocKey) -> Result<Self, IndexError> {
        self.iloc(&self.loc_to_iloc(key)?)
    }

    /// For each label of `target`, its position here.
    #[must_use]
    pub fn get_indexer(&self, target: &Self) -> Vec<Option<usize>> {
        target.iter().map(|label| self.position(label)).collect()
    }

    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Flat(a), Self::Flat(b)) => a.equals(b),
            (Self::Hierarchy(a), Self::Hierarchy(b)) => a.equals(b),
            _ => false,
        }
    }

    fn to_flat(&self) -> Result<Index, IndexError> {
        match self {
            Self::Flat(index) => Ok(index.clone()),
            Self::Hierarchy(hierarchy) => hierarchy.flat(),
        }
    }

    fn combine(&self, other: &Self, union: bool) -> Result<Self, IndexError> {
        match (self, other) {
            (Self::Flat(a), Self::Flat(b)) => {
                let out = if union { a.union(b) } else { a.intersection(b) };
                out.map(Self::Flat)
            }
            (Self::Hierarchy(a), Self::Hierarchy(b)) if a.depth() == b.depth() => {
                let out = if union { a.union(b) } else { a.intersection(b) };
                out.map(Self::Hierarchy)
            }
            _ => {
                let (a, b) = (self.to_flat()?, other.to_flat()?);
                let out = if union { a.union(&b) } else { a.intersection(&b) };
                out.map(Self::Flat)
            }
        }
    }

    /// Union of labels; mixed kinds combine as flat tuples.
    pub fn union(&self, other: &Self) -> Result<Self, IndexError> {
        self.combine(other, true)
    }

    pub fn intersection(&self, other: &Self) -> Result<Self, IndexError> {
        self.combine(other, false)
    }

    // ── Relabeling and reordering ──────────────────────────────────────

    pub fn relabel(&self, relabel: &Relabel) -> Result<Self, IndexError> {
        match self {
            Self::Flat(index) => index.relabel(relabel).map(Self::Flat),
            Self::Hierarchy(hierarchy) => hierarchy.relabel(relabel).map(Self::Hierarchy),
        }
    }

    pub fn relabel_add_level(&self, level: Label) -> Result<Self, IndexError> {
        match self {
            Self::Flat(index) => index.relabel_add_level(level).map(Self::Hierarchy),
            Self::Hierarchy(hierarchy) => hierarchy.relabel_add_level(level).map(Self::Hierarchy),
        }
    }

    /// See [`IndexHierarchy::relabel_drop_level`]; a flat index cannot drop.
    pub fn relabel_drop_level(&self, count: i64) -> Result<Self, IndexError> {
        match self {
            Self::Flat(_) if count == 0 => Ok(self.clone()),
            Self::Flat(_) => Err(IndexError::InvalidLevelDrop { count, depth: 1 }),
            Self::Hierarchy(hierarchy) => hierarchy.relabel_drop_level(count),
        }
    }

    /// Reorder hierarchy depths; returns the new index and, per new
    /// position, the old one.
    pub fn rehierarch(&self, order: &[usize]) -> Result<(Self, Vec<usize>), IndexError> {
        match self {
            Self::Flat(_) if order == [0] => Ok((self.clone(), (0..self.len()).collect())),
            Self::Flat(_) => Err(IndexError::InvalidLevelOrder {
                order: order.to_vec(),
                depth: 1,
            }),
            Self::Hierarchy(hierarchy) => {
                let (out, permutation) = hierarchy.rehierarch(order)?;
                Ok((Self::Hierarchy(out), permutation))
            }
        }
    }

    /// Flat index; hierarchy labels become tuples.
    pub fn flat(&self) -> Result<Self, IndexError> {
        self.to_flat().map(Self::Flat)
    }

    fn take_positions(&self, positions: &[usize]) -> Result<Self, IndexError> {
        self.iloc(&ILocKey::Positions(positions.iter().map(|&p| p as i64).collect()))
    }

    /// Sort positions by label; hierarchies order tuples lexicographically.
    pub fn argsort(&self, ascending: bool) -> Result<Vec<usize>, IndexError> {
        match self {
            Self::Flat(index) => index.argsort(ascending),
            Self::Hierarchy(_) => {
                let labels = self.labels();
                let mut order = sf_array::argsort(&labels).ok_or(IndexError::Unorderable)?;
                if !ascending {
                    order.reverse();
                }
                Ok(order)
            }
        }
    }

    pub fn sort(&self, ascending: bool) -> Result<Self, IndexError> {
        self.take_positions(&self.argsort(ascending)?)
    }

    pub fn roll(&self, shift: i64) -> Result<Self, IndexError> {
        let len = self.len();
        if len == 0 {
            return Ok(self.clone());
        }
        let shift = shift.rem_euclid(len as i64) as usize;
        let positions: Vec<usize> = (0..len).map(|i| (i + len - shift) % len).collect();
        self.take_positions(&positions)
    }

    pub fn head(&self, count: usize) -> Result<Self, IndexError> {
        let positions: Vec<usize> = (0..count.min(self.len())).collect();
        self.take_positions(&positions)
    }

    pub fn tail(&self, count: usize) -> Result<Self, IndexError> {
        let len = self.len();
        let positions: Vec<usize> = (len.saturating_sub(count)..len).collect();
        self.take_positions(&positions)
    }

    /// Concatenate axis indices end to end; labels must stay unique.
    pub fn concat<'a, I>(indices: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a AxisIndex>,
    {
        let indices: Vec<&AxisIndex> = indices.into_iter().collect();
        if !indices.is_empty() && indices.iter().all(|ix| matches!(ix, Self::Hierarchy(_))) {
            let hierarchies = indices.iter().filter_map(|ix| match ix {
                Self::Hierarchy(h) => Some(h),
                Self::Flat(_) => None,
            });
            return IndexHierarchy::from_concat(hierarchies).map(Self::Hierarchy);
        }
        let labels: Vec<Label> = indices.iter().flat_map(|ix| ix.iter().cloned()).collect();
        Self::new(labels)
    }
}

impl fmt::Display for AxisIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat(index) => fmt::Display::fmt(index, f),
            Self::Hierarchy(hierarchy) => fmt::Display::fmt(hierarchy, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use sf_array::ILocKey;
    use sf_types::{DType, Scalar};

    use super::AxisIndex;
    use crate::{HLoc, HSelector, IndexError, IndexHierarchy, LocKey};

    fn s(v: &str) -> Scalar {
        Scalar::str(v)
    }

    fn hierarchy() -> AxisIndex {
        IndexHierarchy::from_product([vec![s("a"), s("b")], vec![Scalar::Int(1), Scalar::Int(2)]])
            .expect("product")
            .into()
    }

    #[test]
    fn hierarchy_keys_are_tuples() {
        let ix = hierarchy();
        let key = LocKey::Label(Scalar::tuple([s("b"), Scalar::Int(1)]));
        assert_eq!(ix.loc_to_iloc(&key).expect("present"), ILocKey::Position(2));
        let hkey = HLoc(vec![HSelector::Label(s("a"))]);
        assert_eq!(
            ix.hloc_to_iloc(&hkey).expect("outer"),
            ILocKey::Positions(vec![0, 1])
        );
        assert_eq!(ix.depth(), 2);
        assert_eq!(ix.dtype(), DType::Object);
    }

    #[test]
    fn mixed_union_goes_through_flat_tuples() {
        let flat = AxisIndex::new([Scalar::tuple([s("c"), Scalar::Int(9)])]).expect("flat");
        let union = hierarchy().union(&flat).expect("union");
        assert_eq!(union.depth(), 1);
        assert_eq!(union.len(), 5);
    }

    #[test]
    fn roll_head_tail_and_sort() {
        let ix = AxisIndex::new([s("c"), s("a"), s("b")]).expect("flat");
        assert_eq!(ix.roll(-1).expect("roll").labels(), vec![s("a"), s("b"), s("c")]);
        assert_eq!(ix.head(1).expect("head").labels(), vec![s("c")]);
        assert_eq!(ix.tail(2).expect("tail").labels(), vec![s("a"), s("b")]);
        assert_eq!(ix.sort(true).expect("sort").labels(), vec![s("a"), s("b"), s("c")]);
        let (same, permutation) = ix.rehierarch(&[0]).expect("identity");
        assert!(same.equals(&ix));
        assert_eq!(permutation, vec![0, 1, 2]);
        assert_eq!(
            ix.relabel_drop_level(1),
            Err(IndexError::InvalidLevelDrop { count: 1, depth: 1 })
        );
    }

    #[test]
    fn concat_rejects_overlap() {
        let a = AxisIndex::new([s("a"), s("b")]).expect("flat");
        let b = AxisIndex::new([s("c")]).expect("flat");
        assert_eq!(
            AxisIndex::concat([&a, &b]).expect("disjoint").labels(),
            vec![s("a"), s("b"), s("c")]
        );
        assert!(matches!(
            AxisIndex::concat([&a, &a]),
            Err(IndexError::DuplicateLabel { .. })
        ));
        let added = a.relabel_add_level(s("x")).expect("add");
        assert_eq!(added.label_at(1), Some(&Scalar::tuple([s("x"), s("b")])));
    }
}
