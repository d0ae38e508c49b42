use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sf_array::{Array, ILocKey, intersect2d, iterable_to_array, union2d};
use sf_types::{Label, Scalar};
use tracing::debug;

use crate::IndexError;
use crate::axis::AxisIndex;
use crate::index::{GrowOnly, Index, IndexMode, LabelSlice, LocKey, Relabel, Static};

/// Selector for one depth of a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HSelector {
    All,
    Label(Label),
    Labels(Vec<Label>),
    /// Inclusive slice over the level's label order.
    Slice(LabelSlice),
}

/// Per-depth selectors, outermost first. Missing trailing depths select all.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HLoc(pub Vec<HSelector>);

impl HLoc {
    /// Selector matching one full label tuple.
    #[must_use]
    pub fn tuple<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        Self(labels.into_iter().map(HSelector::Label).collect())
    }
}

impl From<Vec<HSelector>> for HLoc {
    fn from(selectors: Vec<HSelector>) -> Self {
        Self(selectors)
    }
}

/// Multi-level index: per-depth levels of distinct labels, the per-row
/// encoding into those levels, and the unique label tuples.
#[derive(Debug, Clone)]
pub struct IndexHierarchy<M: IndexMode = Static> {
    levels: Vec<Index>,
    /// `[depth][row]` positions into `levels[depth]`.
    codes: Vec<Vec<usize>>,
    tuples: Arc<IndexSet<Label>>,
    name: Option<Label>,
    mode: PhantomData<M>,
}

pub type IndexHierarchyGO = IndexHierarchy<GrowOnly>;

impl<M: IndexMode> PartialEq for IndexHierarchy<M> {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

fn tuple_of(levels: &[Index], codes: &[Vec<usize>], row: usize) -> Label {
    Scalar::Tuple(
        levels
            .iter()
            .zip(codes)
            .map(|(level, codes)| level.label_at(codes[row]).cloned().unwrap_or(Scalar::None))
            .collect(),
    )
}

fn tuple_parts(label: &Label) -> Vec<Label> {
    match label {
        Scalar::Tuple(parts) => parts.clone(),
        other => vec![other.clone()],
    }
}

impl<M: IndexMode> IndexHierarchy<M> {
    /// Assemble from levels and an encoding known to give unique tuples.
    fn from_codes(levels: Vec<Index>, codes: Vec<Vec<usize>>, name: Option<Label>) -> Self {
        let len = codes.first().map_or(0, Vec::len);
        let tuples: IndexSet<Label> = (0..len).map(|row| tuple_of(&levels, &codes, row)).collect();
        Self {
            levels,
            codes,
            tuples: Arc::new(tuples),
            name,
            mode: PhantomData,
        }
    }

    /// Hierarchy over rows of labels, each of length `depth`. Levels hold
    /// labels in first-appearance order, after casting each depth's labels to
    /// the dtype they resolve to together.
    pub(crate) fn from_rows(rows: Vec<Vec<Label>>, depth: usize) -> Result<Self, IndexError> {
        if depth == 0 {
            return Err(IndexError::EmptyHierarchy);
        }
        let mut columns: Vec<Vec<Label>> = vec![Vec::with_capacity(rows.len()); depth];
        for row in &rows {
            if row.len() != depth {
                return Err(IndexError::DepthMismatch {
                    expected: depth,
                    found: row.len(),
                });
            }
            for (column, label) in columns.iter_mut().zip(row) {
                column.push(label.clone());
            }
        }
        let mut levels = Vec::with_capacity(depth);
        let mut codes = Vec::with_capacity(depth);
        for column in columns {
            let values = iterable_to_array(column, None)?;
            let mut distinct: IndexSet<Label> = IndexSet::new();
            codes.push(
                values
                    .iter()
                    .map(|label| distinct.insert_full(label).0)
                    .collect::<Vec<usize>>(),
            );
            levels.push(Index::with_dtype(distinct, values.dtype())?);
        }

        let mut tuples = IndexSet::with_capacity(rows.len());
        for row in 0..rows.len() {
            let tuple = tuple_of(&levels, &codes, row);
            if tuples.contains(&tuple) {
                return Err(IndexError::DuplicateLabel {
                    label: tuple.repr(),
                });
            }
            tuples.insert(tuple);
        }
        Ok(Self {
            levels,
            codes,
            tuples: Arc::new(tuples),
            name: None,
            mode: PhantomData,
        })
    }

    /// Hierarchy over explicit label tuples; every tuple must have the arity
    /// of the first and tuples must be unique.
    pub fn from_labels<I>(labels: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Vec<Label>>,
    {
        let rows: Vec<Vec<Label>> = labels.into_iter().collect();
        let depth = rows.first().map(Vec::len).ok_or(IndexError::EmptyHierarchy)?;
        Self::from_rows(rows, depth)
    }

    /// Cartesian product of per-level labels, outer level varying slowest.
    pub fn from_product<I, L>(levels: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = Label>,
    {
        let levels = levels
            .into_iter()
            .map(Index::new)
            .collect::<Result<Vec<Index>, _>>()?;
        if levels.is_empty() {
            return Err(IndexError::EmptyHierarchy);
        }
        let len: usize = levels.iter().map(Index::len).product();
        let mut codes = Vec::with_capacity(levels.len());
        let mut repeat = len;
        for level in &levels {
            let size = level.len();
            repeat = if size == 0 { 0 } else { repeat / size };
            codes.push((0..len).map(|row| (row / repeat.max(1)) % size.max(1)).collect());
        }
        Ok(Self::from_codes(levels, codes, None))
    }

    /// Stack hierarchies of equal depth; tuples must stay unique.
    pub fn from_concat<'a, I, N>(hierarchies: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = &'a IndexHierarchy<N>>,
        N: IndexMode,
    {
        let mut depth = None;
        let mut rows = Vec::new();
        for hierarchy in hierarchies {
            let expected = *depth.get_or_insert(hierarchy.depth());
            if hierarchy.depth() != expected {
                return Err(IndexError::DepthMismatch {
                    expected,
                    found: hierarchy.depth(),
                });
            }
            rows.extend(hierarchy.rows());
        }
        Self::from_rows(rows, depth.ok_or(IndexError::EmptyHierarchy)?)
    }

    #[must_use]
    pub fn from_hierarchy<N: IndexMode>(other: &IndexHierarchy<N>) -> Self {
        let tuples = if M::STATIC && N::STATIC {
            Arc::clone(&other.tuples)
        } else {
            Arc::new(other.tuples.as_ref().clone())
        };
        Self {
            levels: other.levels.clone(),
            codes: other.codes.clone(),
            tuples,
            name: other.name.clone(),
            mode: PhantomData,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

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
    pub fn levels(&self) -> &[Index] {
        &self.levels
    }

    #[must_use]
    pub fn codes(&self) -> &[Vec<usize>] {
        &self.codes
    }

    /// Label tuple at `position`.
    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<&Label> {
        self.tuples.get_index(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> + '_ {
        self.tuples.iter()
    }

    /// Label tuples as per-row vectors.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<Label>> {
        self.tuples.iter().map(tuple_parts).collect()
    }

    /// The labels at one depth, one per row, typed by that depth's level.
    pub fn values_at_depth(&self, depth: usize) -> Result<Array, IndexError> {
        let (Some(level), Some(codes)) = (self.levels.get(depth), self.codes.get(depth)) else {
            return Err(IndexError::DepthMismatch {
                expected: self.depth(),
                found: depth,
            });
        };
        let labels: Vec<Label> = codes
            .iter()
            .filter_map(|&code| level.label_at(code).cloned())
            .collect();
        Ok(Array::from_scalars(&labels, level.dtype())
            .unwrap_or_else(|_| Array::from_objects(labels)))
    }

    /// Position of a label tuple. Components are matched through each
    /// level, so `(1,)` finds `(1.0,)`.
    #[must_use]
    pub fn position(&self, label: &Label) -> Option<usize> {
        if let Some(position) = self.tuples.get_index_of(label) {
            return Some(position);
        }
        let parts = tuple_parts(label);
        if parts.len() != self.depth() {
            return None;
        }
        let normalized = Scalar::Tuple(
            self.levels
                .iter()
                .zip(&parts)
                .map(|(level, part)| level.position(part).and_then(|p| level.label_at(p).cloned()))
                .collect::<Option<Vec<_>>>()?,
        );
        self.tuples.get_index_of(&normalized)
    }

    #[must_use]
    pub fn contains(&self, label: &Label) -> bool {
        self.position(label).is_some()
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn allowed_codes(&self, depth: usize, selector: &HSelector) -> Result<Option<Vec<bool>>, IndexError> {
        let level = &self.levels[depth];
        let key = match selector {
            HSelector::All => return Ok(None),
            HSelector::Label(label) => LocKey::Label(label.clone()),
            HSelector::Labels(labels) => LocKey::Labels(labels.clone()),
            HSelector::Slice(slice) => LocKey::Slice(slice.clone()),
        };
        let mut allowed = vec![false; level.len()];
        for code in level.loc_to_positions(&key)? {
            allowed[code] = true;
        }
        Ok(Some(allowed))
    }

    /// Positions selected by per-depth selectors, in row order.
    pub fn loc_to_iloc(&self, key: &HLoc) -> Result<Vec<usize>, IndexError> {
        if key.0.len() > self.depth() {
            return Err(IndexError::DepthMismatch {
                expected: self.depth(),
                found: key.0.len(),
            });
        }
        if key.0.len() == self.depth() && key.0.iter().all(|s| matches!(s, HSelector::Label(_))) {
            return self.loc_to_iloc_terminal(key).map(|p| vec![p]);
        }
        let filters = key
            .0
            .iter()
            .enumerate()
            .map(|(depth, selector)| self.allowed_codes(depth, selector))
            .collect::<Result<Vec<_>, _>>()?;
        let positions: Vec<usize> = (0..self.len())
            .filter(|&row| {
                filters.iter().enumerate().all(|(depth, allowed)| {
                    allowed
                        .as_ref()
                        .is_none_or(|allowed| allowed[self.codes[depth][row]])
                })
            })
            .collect();
        if positions.is_empty() && key.0.iter().all(|s| matches!(s, HSelector::Label(_))) {
            return Err(IndexError::KeyNotFound {
                key: format!("{key:?}"),
            });
        }
        Ok(positions)
    }

    /// The single position of a full label tuple.
    pub fn loc_to_iloc_terminal(&self, key: &HLoc) -> Result<usize, IndexError> {
        let mut parts = Vec::with_capacity(self.depth());
        for depth in 0..self.depth() {
            match key.0.get(depth) {
                Some(HSelector::Label(label)) => parts.push(label.clone()),
                _ => return Err(IndexError::NonTerminalSelector { depth }),
            }
        }
        if key.0.len() > self.depth() {
            return Err(IndexError::DepthMismatch {
                expected: self.depth(),
                found: key.0.len(),
            });
        }
        let tuple = Scalar::Tuple(parts);
        self.position(&tuple).ok_or_else(|| IndexError::KeyNotFound { key: tuple.repr() })
    }

    fn take(&self, positions: &[usize]) -> Result<Self, IndexError> {
        let rows: Vec<Vec<Label>> = positions
            .iter()
            .filter_map(|&p| self.tuples.get_index(p).map(tuple_parts))
            .collect();
        if rows.is_empty() {
            let levels = self
                .levels
                .iter()
                .map(|level| level.iloc(&ILocKey::Positions(Vec::new())))
                .collect::<Result<Vec<_>, _>>()?;
            let codes = vec![Vec::new(); self.depth()];
            return Ok(Self::from_codes(levels, codes, self.name.clone()));
        }
        let mut out = Self::from_rows(rows, self.depth())?;
        out.name = self.name.clone();
        Ok(out)
    }

    pub fn iloc(&self, key: &ILocKey) -> Result<Self, IndexError> {
        if key.is_all(self.len()) {
            return Ok(self.clone());
        }
        self.take(&key.positions(self.len())?)
    }

    pub fn loc(&self, key: &HLoc) -> Result<Self, IndexError> {
        self.take(&self.loc_to_iloc(key)?)
    }

    #[must_use]
    pub fn get_indexer<N: IndexMode>(&self, target: &IndexHierarchy<N>) -> Vec<Option<usize>> {
        target.iter().map(|label| self.position(label)).collect()
    }

    // ── Comparison and set algebra ─────────────────────────────────────

    #[must_use]
    pub fn equals<N: IndexMode>(&self, other: &IndexHierarchy<N>) -> bool {
        self.depth() == other.depth()
            && self.len() == other.len()
            && (Arc::ptr_eq(&self.tuples, &other.tuples) || self.iter().eq(other.iter()))
    }

    fn tuple_array(&self) -> Array {
        Array::from_objects(self.iter().cloned().collect())
    }

    fn from_tuple_array(array: &Array, depth: usize) -> Result<Self, IndexError> {
        let rows: Vec<Vec<Label>> = array.iter().map(|t| tuple_parts(&t)).collect();
        if rows.is_empty() {
            return Ok(Self::from_codes(
                vec![Index::new(Vec::new())?; depth],
                vec![Vec::new(); depth],
                None,
            ));
        }
        Self::from_rows(rows, depth)
    }

    fn combine<N: IndexMode>(&self, other: &IndexHierarchy<N>, union: bool) -> Result<Self, IndexError> {
        if other.depth() != self.depth() {
            return Err(IndexError::DepthMismatch {
                expected: self.depth(),
                found: other.depth(),
            });
        }
        if self.equals(other) {
            debug!(len = self.len(), "hierarchy set operation of identical operands");
            return Ok(self.clone());
        }
        let (left, right) = (self.tuple_array(), other.tuple_array());
        let values = if union {
            union2d(&left, &right, true)?
        } else {
            intersect2d(&left, &right, true)?
        };
        let mut out = Self::from_tuple_array(&values, self.depth())?;
        out.name = (self.name == other.name).then(|| self.name.clone()).flatten();
        Ok(out)
    }

    pub fn union<N: IndexMode>(&self, other: &IndexHierarchy<N>) -> Result<Self, IndexError> {
        self.combine(other, true)
    }

    pub fn intersection<N: IndexMode>(&self, other: &IndexHierarchy<N>) -> Result<Self, IndexError> {
        self.combine(other, false)
    }

    // ── Restructuring ──────────────────────────────────────────────────

    /// Reorder depths by `order`, sorting rows by the new level order.
    /// Returns the new hierarchy and, for each new row, its old position.
    pub fn rehierarch(&self, order: &[usize]) -> Result<(Self, Vec<usize>), IndexError> {
        let mut seen = vec![false; self.depth()];
        let valid = order.len() == self.depth()
            && order
                .iter()
                .all(|&d| d < seen.len() && !std::mem::replace(&mut seen[d], true));
        if !valid {
            return Err(IndexError::InvalidLevelOrder {
                order: order.to_vec(),
                depth: self.depth(),
            });
        }
        let levels: Vec<Index> = order.iter().map(|&d| self.levels[d].clone()).collect();
        let codes: Vec<&Vec<usize>> = order.iter().map(|&d| &self.codes[d]).collect();
        let mut permutation: Vec<usize> = (0..self.len()).collect();
        permutation.sort_by(|&a, &b| {
            codes
                .iter()
                .map(|c| c[a].cmp(&c[b]))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let codes = codes
            .iter()
            .map(|c| permutation.iter().map(|&row| c[row]).collect())
            .collect();
        Ok((Self::from_codes(levels, codes, self.name.clone()), permutation))
    }

    /// Drop outer (positive `count`) or inner (negative) levels. One
    /// remaining level gives a flat index.
    pub fn relabel_drop_level(&self, count: i64) -> Result<AxisIndex, IndexError> {
        let depth = self.depth();
        let dropped = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
        if dropped >= depth {
            return Err(IndexError::InvalidLevelDrop { count, depth });
        }
        if dropped == 0 {
            return Ok(AxisIndex::Hierarchy(IndexHierarchy::from_hierarchy(self)));
        }
        let keep = if count > 0 {
            dropped..depth
        } else {
            0..depth - dropped
        };
        if keep.len() == 1 {
            let labels = self.values_at_depth(keep.start)?;
            let index: Index = Index::from_array(&labels)?;
            return Ok(AxisIndex::Flat(index.rename(self.name.clone())));
        }
        let rows: Vec<Vec<Label>> = self.rows().into_iter().map(|row| row[keep.clone()].to_vec()).collect();
        let hierarchy = IndexHierarchy::from_rows(rows, keep.len())?;
        Ok(AxisIndex::Hierarchy(hierarchy.rename(self.name.clone())))
    }

    /// Prepend an outer level holding `level` for every row.
    pub fn relabel_add_level(&self, level: Label) -> Result<Self, IndexError> {
        let mut levels = Vec::with_capacity(self.depth() + 1);
        levels.push(Index::new([level])?);
        levels.extend(self.levels.iter().cloned());
        let mut codes = Vec::with_capacity(self.depth() + 1);
        codes.push(vec![0; self.len()]);
        codes.extend(self.codes.iter().cloned());
        Ok(Self::from_codes(levels, codes, self.name.clone()))
    }

    /// Relabel whole tuples; new labels must be tuples of the same depth.
    pub fn relabel(&self, relabel: &Relabel) -> Result<Self, IndexError> {
        let labels = relabel.apply(self.iter(), self.len())?;
        let rows = labels.iter().map(tuple_parts).collect();
        let mut out = Self::from_rows(rows, self.depth())?;
        out.name = self.name.clone();
        Ok(out)
    }

    /// Flat index of label tuples.
    pub fn flat(&self) -> Result<Index, IndexError> {
        let index: Index = Index::from_array(&self.tuple_array())?;
        Ok(index.rename(self.name.clone()))
    }

    #[must_use]
    pub fn to_static(&self) -> IndexHierarchy<Static> {
        IndexHierarchy::from_hierarchy(self)
    }

    #[must_use]
    pub fn to_grow_only(&self) -> IndexHierarchyGO {
        IndexHierarchy::from_hierarchy(self)
    }
}

impl IndexHierarchy<GrowOnly> {
    /// Append one label tuple, extending levels with unseen labels.
    pub fn append(&mut self, labels: Vec<Label>) -> Result<(), IndexError> {
        if labels.len() != self.depth() {
            return Err(IndexError::DepthMismatch {
                expected: self.depth(),
                found: labels.len(),
            });
        }
        let tuple = Scalar::Tuple(labels.clone());
        if self.contains(&tuple) {
            return Err(IndexError::DuplicateLabel {
                label: tuple.repr(),
            });
        }
        for (depth, label) in labels.into_iter().enumerate() {
            let code = match self.levels[depth].position(&label) {
                Some(code) => code,
                None => {
                    let mut level = self.levels[depth].to_grow_only();
                    level.append(label)?;
                    self.levels[depth] = level.to_static();
                    self.levels[depth].len() - 1
                }
            };
            self.codes[depth].push(code);
        }
        let row = self.codes[0].len() - 1;
        let tuple = tuple_of(&self.levels, &self.codes, row);
        Arc::make_mut(&mut self.tuples).insert(tuple);
        Ok(())
    }
}

impl<M: IndexMode> fmt::Display for IndexHierarchy<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.iter().map(Label::repr).collect();
        write!(f, "IndexHierarchy([{}], depth={})", labels.join(", "), self.depth())
    }
}
