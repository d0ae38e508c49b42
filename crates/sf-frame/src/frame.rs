use sf_array::{
    ArrayError, Axis, BinaryOp, ILocKey, Product, Shape, Slice, iterable_to_array, matmul,
    shift_positions,
};
use sf_blocks::{BlocksError, Extraction, TypeBlocks, na_fill_for};
use sf_index::{AxisIndex, IndexError, LocKey, Relabel};
use sf_types::{DType, Label, Scalar};
use tracing::debug;

use crate::engine::{align_inner_dimension, align_outer, conform_array, conform_columns, conform_rows};
use crate::series::positions_key;
use crate::{FrameError, Selection, Series};

fn key_not_found(label: &Label) -> FrameError {
    IndexError::KeyNotFound { key: label.repr() }.into()
}

/// Column label for a series: its name, or its position when unnamed.
fn column_label(name: Option<&Label>, position: usize) -> Result<Label, FrameError> {
    match name {
        None => Ok(Scalar::Int(position as i64)),
        Some(name) if name.is_na() => Err(FrameError::NameUnhashable { name: name.repr() }),
        Some(name) => Ok(name.clone()),
    }
}

fn union_all<'a, I>(indices: I) -> Result<Option<AxisIndex>, FrameError>
where
    I: IntoIterator<Item = &'a AxisIndex>,
{
    let mut union: Option<AxisIndex> = None;
    for index in indices {
        union = Some(match union {
            None => index.clone(),
            Some(acc) => acc.union(index)?,
        });
    }
    Ok(union)
}

/// A labeled, immutable 2D table of typed column blocks.
#[derive(Debug, Clone)]
pub struct Frame {
    blocks: TypeBlocks,
    index: AxisIndex,
    columns: AxisIndex,
    name: Option<Label>,
}

impl Frame {
    pub fn new(blocks: TypeBlocks, index: AxisIndex, columns: AxisIndex) -> Result<Self, FrameError> {
        let (rows, cols) = blocks.shape();
        if rows != index.len() {
            return Err(FrameError::LengthMismatch {
                index_len: index.len(),
                values_len: rows,
            });
        }
        if cols != columns.len() {
            return Err(BlocksError::ColumnCountMismatch {
                expected: columns.len(),
                found: cols,
            }
            .into());
        }
        Ok(Self {
            blocks,
            index,
            columns,
            name: None,
        })
    }

    pub fn from_element(element: &Scalar, index: AxisIndex, columns: AxisIndex) -> Result<Self, FrameError> {
        let blocks = TypeBlocks::from_element(element, index.len(), columns.len())?;
        Self::new(blocks, index, columns)
    }

    /// Columns from labeled series, aligned on the union of their indices.
    pub fn from_items<I>(items: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = (Label, Series)>,
    {
        let (labels, series): (Vec<Label>, Vec<Series>) = items.into_iter().unzip();
        let columns = AxisIndex::new(labels)?;
        let index = union_all(series.iter().map(Series::index))?.unwrap_or_else(|| AxisIndex::auto(0));
        let arrays = series
            .iter()
            .map(|s| s.reindex(index.clone(), None).map(|s| s.values().clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let blocks = if arrays.is_empty() {
            TypeBlocks::empty(index.len())
        } else {
            TypeBlocks::from_columns(arrays)?
        };
        Self::new(blocks, index, columns)
    }

    /// Columns labeled by series names; unnamed series take their position.
    pub fn from_series<'a, I>(series: I) -> Result<Self, FrameError>
    where
        I: IntoIterator<Item = &'a Series>,
    {
        let items = series
            .into_iter()
            .enumerate()
            .map(|(i, s)| -> Result<(Label, Series), FrameError> {
                Ok((column_label(s.name(), i)?, s.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_items(items)
    }

    /// Rows of equal width; each column's dtype is inferred from its values.
    pub fn from_records(
        records: &[Vec<Scalar>],
        index: Option<AxisIndex>,
        columns: Option<AxisIndex>,
    ) -> Result<Self, FrameError> {
        let width = records
            .first()
            .map(Vec::len)
            .or_else(|| columns.as_ref().map(AxisIndex::len))
            .unwrap_or(0);
        if let Some(record) = records.iter().find(|r| r.len() != width) {
            return Err(BlocksError::ColumnCountMismatch {
                expected: width,
                found: record.len(),
            }
            .into());
        }
        let arrays = (0..width)
            .map(|c| iterable_to_array(records.iter().map(|r| r[c].clone()), None))
            .collect::<Result<Vec<_>, _>>()?;
        let blocks = if arrays.is_empty() {
            TypeBlocks::empty(records.len())
        } else {
            TypeBlocks::from_columns(arrays)?
        };
        let index = index.unwrap_or_else(|| AxisIndex::auto(records.len()));
        let columns = columns.unwrap_or_else(|| AxisIndex::auto(width));
        Self::new(blocks, index, columns)
    }

    /// Stack frames along `axis`. The other axis becomes the union of all
    /// inputs, missing cells filled with NaN.
    pub fn from_concat(frames: &[Frame], axis: Axis) -> Result<Self, FrameError> {
        if frames.is_empty() {
            return Err(ArrayError::NothingToConcatenate.into());
        }
        match axis {
            Axis::Rows => {
                let columns = union_all(frames.iter().map(|f| &f.columns))?.unwrap_or_else(|| AxisIndex::auto(0));
                let parts = frames
                    .iter()
                    .map(|f| f.reindex(None, Some(columns.clone()), None))
                    .collect::<Result<Vec<_>, _>>()?;
                let blocks = TypeBlocks::concat_vertical(parts.iter().map(|f| &f.blocks))?;
                let index = AxisIndex::concat(parts.iter().map(|f| &f.index))?;
                Self::new(blocks, index, columns)
            }
            Axis::Columns => {
                let index = union_all(frames.iter().map(|f| &f.index))?.unwrap_or_else(|| AxisIndex::auto(0));
                let parts = frames
                    .iter()
                    .map(|f| f.reindex(Some(index.clone()), None, None))
                    .collect::<Result<Vec<_>, _>>()?;
                let blocks = TypeBlocks::concat_horizontal(parts.iter().map(|f| &f.blocks))?;
                let columns = AxisIndex::concat(parts.iter().map(|f| &f.columns))?;
                Self::new(blocks, index, columns)
            }
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: Label) -> Self {
        self.name = Some(name);
        self
    }

    fn with_blocks(&self, blocks: TypeBlocks) -> Self {
        Self {
            blocks,
            index: self.index.clone(),
            columns: self.columns.clone(),
            name: self.name.clone(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.blocks.shape()
    }

    #[must_use]
    pub fn index(&self) -> &AxisIndex {
        &self.index
    }

    #[must_use]
    pub fn columns(&self) -> &AxisIndex {
        &self.columns
    }

    #[must_use]
    pub fn blocks(&self) -> &TypeBlocks {
        &self.blocks
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

    /// One dtype per column.
    #[must_use]
    pub fn dtypes(&self) -> Vec<DType> {
        self.blocks.dtypes()
    }

    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.name == other.name
            && self.index.equals(&other.index)
            && self.columns.equals(&other.columns)
            && self.blocks.equals(&other.blocks)
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Select by positions. Two single positions give an element, one gives
    /// a series, none a frame.
    pub fn iloc(&self, rows: &ILocKey, columns: &ILocKey) -> Result<Selection, FrameError> {
        match self.blocks.extract(rows, columns)? {
            Extraction::Element(value) => Ok(Selection::Element(value)),
            Extraction::Array(values) if rows.is_element() => {
                let row = rows.positions(self.index.len())?[0];
                let series = Series::new(values, self.columns.iloc(columns)?)?;
                Ok(Selection::Series(series.rename(self.index.label_at(row).cloned())))
            }
            Extraction::Array(values) => {
                let col = columns.positions(self.columns.len())?[0];
                let series = Series::new(values, self.index.iloc(rows)?)?;
                Ok(Selection::Series(series.rename(self.columns.label_at(col).cloned())))
            }
            Extraction::Blocks(blocks) => Ok(Selection::Frame(Self {
                blocks,
                index: self.index.iloc(rows)?,
                columns: self.columns.iloc(columns)?,
                name: self.name.clone(),
            })),
        }
    }

    pub fn loc(&self, rows: &LocKey, columns: &LocKey) -> Result<Selection, FrameError> {
        self.iloc(&self.index.loc_to_iloc(rows)?, &self.columns.loc_to_iloc(columns)?)
    }

    /// The column labeled `label`, named by it.
    pub fn column(&self, label: &Label) -> Result<Series, FrameError> {
        let col = self.columns.position(label).ok_or_else(|| key_not_found(label))?;
        let series = Series::new(self.blocks.column_array(col)?, self.index.clone())?;
        Ok(series.with_name(label.clone()))
    }

    pub fn element(&self, row: &Label, column: &Label) -> Result<Scalar, FrameError> {
        let r = self.index.position(row).ok_or_else(|| key_not_found(row))?;
        let c = self.columns.position(column).ok_or_else(|| key_not_found(column))?;
        Ok(self.blocks.element(r, c)?)
    }

    pub fn head(&self, count: usize) -> Result<Self, FrameError> {
        self.select_rows(&ILocKey::Slice(Slice::new(None, Some(count as i64), None)))
    }

    pub fn tail(&self, count: usize) -> Result<Self, FrameError> {
        let start = self.index.len().saturating_sub(count);
        self.select_rows(&ILocKey::Slice(Slice::new(Some(start as i64), None, None)))
    }

    fn select_rows(&self, key: &ILocKey) -> Result<Self, FrameError> {
        Ok(Self {
            blocks: self.blocks.select_rows(key)?,
            index: self.index.iloc(key)?,
            ..self.clone()
        })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Result<(Label, Series), FrameError>> + '_ {
        self.index.iter().enumerate().map(|(r, label)| -> Result<(Label, Series), FrameError> {
            let values = self.blocks.row_array(r)?;
            let series = Series::new(values, self.columns.clone())?.with_name(label.clone());
            Ok((label.clone(), series))
        })
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = Result<(Label, Series), FrameError>> + '_ {
        self.columns.iter().enumerate().map(|(c, label)| -> Result<(Label, Series), FrameError> {
            let values = self.blocks.column_array(c)?;
            let series = Series::new(values, self.index.clone())?.with_name(label.clone());
            Ok((label.clone(), series))
        })
    }

    // ── Reindexing and relabeling ──────────────────────────────────────

    /// Conform rows and/or columns to new labels. New cells take `fill`, by
    /// default NaN (NaT in temporal columns for new rows).
    pub fn reindex(
        &self,
        index: Option<AxisIndex>,
        columns: Option<AxisIndex>,
        fill: Option<&Scalar>,
    ) -> Result<Self, FrameError> {
        let mut blocks = self.blocks.clone();
        let index = match index {
            Some(target) if !self.index.equals(&target) => {
                let positions = self.index.get_indexer(&target);
                blocks = match fill {
                    Some(fill) => blocks.take_rows_with_fill(&positions, fill)?,
                    None => blocks.take_rows_with_fill_by(&positions, na_fill_for)?,
                };
                target
            }
            Some(target) => target,
            None => self.index.clone(),
        };
        let columns = match columns {
            Some(target) if !self.columns.equals(&target) => {
                let positions = self.columns.get_indexer(&target);
                let nan = Scalar::Float(f64::NAN);
                blocks = blocks.take_columns_with_fill(&positions, fill.unwrap_or(&nan))?;
                target
            }
            Some(target) => target,
            None => self.columns.clone(),
        };
        Ok(Self {
            blocks,
            index,
            columns,
            name: self.name.clone(),
        })
    }

    pub fn relabel(&self, index: Option<&Relabel>, columns: Option<&Relabel>) -> Result<Self, FrameError> {
        let index = index.map_or_else(|| Ok(self.index.clone()), |r| self.index.relabel(r))?;
        let columns = columns.map_or_else(|| Ok(self.columns.clone()), |r| self.columns.relabel(r))?;
        Ok(Self {
            index,
            columns,
            ..self.clone()
        })
    }

    /// Reorder the depths of the index (`Axis::Rows`) or the columns
    /// (`Axis::Columns`); values follow their labels.
    pub fn rehierarch(&self, axis: Axis, order: &[usize]) -> Result<Self, FrameError> {
        match axis {
            Axis::Rows => {
                let (index, permutation) = self.index.rehierarch(order)?;
                Ok(Self {
                    blocks: self.blocks.select_rows(&positions_key(permutation))?,
                    index,
                    ..self.clone()
                })
            }
            Axis::Columns => {
                let (columns, permutation) = self.columns.rehierarch(order)?;
                Ok(Self {
                    blocks: self.blocks.select_columns(&positions_key(permutation))?,
                    columns,
                    ..self.clone()
                })
            }
        }
    }

    // ── Transformation ─────────────────────────────────────────────────

    pub fn astype(&self, columns: &ILocKey, dtype: DType) -> Result<Self, FrameError> {
        Ok(self.with_blocks(self.blocks.astype(columns, dtype)?))
    }

    #[must_use]
    pub fn isna(&self) -> Self {
        self.with_blocks(self.blocks.isna())
    }

    pub fn fillna(&self, value: &Scalar) -> Result<Self, FrameError> {
        Ok(self.with_blocks(self.blocks.fillna(value)?))
    }

    /// Circular shift of rows, and of the index when `include_index`.
    pub fn roll(&self, shift: i64, include_index: bool) -> Result<Self, FrameError> {
        let index = if include_index {
            self.index.roll(shift)?
        } else {
            self.index.clone()
        };
        Ok(Self {
            blocks: self.blocks.roll_rows(shift),
            index,
            ..self.clone()
        })
    }

    /// Shift rows against the index. Vacated rows take `fill`, by default
    /// NaN (NaT in temporal columns).
    pub fn shift(&self, shift: i64, fill: Option<&Scalar>) -> Result<Self, FrameError> {
        let blocks = match fill {
            Some(fill) => self.blocks.shift_rows(shift, false, fill)?,
            None => {
                let positions = shift_positions(self.index.len(), shift);
                self.blocks.take_rows_with_fill_by(&positions, na_fill_for)?
            }
        };
        Ok(self.with_blocks(blocks))
    }

    /// Swap rows and columns; the result holds one block.
    pub fn transpose(&self) -> Result<Self, FrameError> {
        Ok(Self {
            blocks: self.blocks.transpose()?,
            index: self.columns.clone(),
            columns: self.index.clone(),
            name: self.name.clone(),
        })
    }

    /// Flag duplicated rows, labeled by the index, or duplicated columns,
    /// labeled by the columns.
    pub fn duplicated(&self, axis: Axis, exclude_first: bool, exclude_last: bool) -> Result<Series, FrameError> {
        let flags = self.blocks.duplicated(axis, exclude_first, exclude_last)?;
        let labels = match axis {
            Axis::Rows => self.index.clone(),
            Axis::Columns => self.columns.clone(),
        };
        Series::new(flags, labels)
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// Elementwise operator after outer alignment of both axes.
    pub fn binary_op(&self, other: &Frame, op: BinaryOp) -> Result<Self, FrameError> {
        let rows = align_outer(&self.index, &other.index)?;
        let cols = align_outer(&self.columns, &other.columns)?;
        let left = conform_columns(&conform_rows(&self.blocks, &rows.left)?, &cols.left)?;
        let right = conform_columns(&conform_rows(&other.blocks, &rows.right)?, &cols.right)?;
        debug!(shape = ?left.shape(), %op, "frame operator on aligned blocks");
        let name = (self.name == other.name).then(|| self.name.clone()).flatten();
        Ok(Self {
            blocks: left.binary_op(&right, op)?,
            index: rows.union_index,
            columns: cols.union_index,
            name,
        })
    }

    /// Apply `op` between every row and `other`, aligning the series index
    /// with the columns.
    pub fn binary_op_series(&self, other: &Series, op: BinaryOp, reflected: bool) -> Result<Self, FrameError> {
        let cols = align_outer(&self.columns, other.index())?;
        let blocks = conform_columns(&self.blocks, &cols.left)?;
        let row = conform_array(other.values(), &cols.right)?;
        Ok(Self {
            blocks: blocks.binary_op_row(&row, op, reflected)?,
            index: self.index.clone(),
            columns: cols.union_index,
            name: self.name.clone(),
        })
    }

    pub fn binary_op_scalar(&self, value: &Scalar, op: BinaryOp, reflected: bool) -> Result<Self, FrameError> {
        Ok(self.with_blocks(self.blocks.binary_op_scalar(value, op, reflected)?))
    }

    fn shape_2d(&self) -> Shape {
        let (rows, cols) = self.shape();
        Shape::Two(rows, cols)
    }

    /// Matrix product; the columns of `self` align with the index of
    /// `other`, which must hold the same labels.
    pub fn matmul(&self, other: &Frame) -> Result<Self, FrameError> {
        let plan = align_inner_dimension(&self.columns, &other.index, self.shape_2d(), other.shape_2d())?;
        let left = conform_columns(&self.blocks, &plan.left)?.to_array()?;
        let right = conform_rows(&other.blocks, &plan.right)?.to_array()?;
        match matmul(&left, &right)? {
            Product::Array(values) => Self::new(
                TypeBlocks::from_blocks([values])?,
                self.index.clone(),
                other.columns.clone(),
            ),
            Product::Scalar(_) => Err(ArrayError::ExpectedRank { expected: 2, found: 0 }.into()),
        }
    }

    pub fn matmul_series(&self, other: &Series) -> Result<Series, FrameError> {
        let plan = align_inner_dimension(
            &self.columns,
            other.index(),
            self.shape_2d(),
            other.values().shape(),
        )?;
        let left = conform_columns(&self.blocks, &plan.left)?.to_array()?;
        let right = conform_array(other.values(), &plan.right)?;
        match matmul(&left, &right)? {
            Product::Array(values) => Series::new(values, self.index.clone()),
            Product::Scalar(_) => Err(ArrayError::ExpectedRank { expected: 1, found: 0 }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use sf_array::{Array, ArithmeticOp, Axis, ILocKey};
    use sf_index::{AxisIndex, IndexHierarchy, LocKey, Relabel};
    use sf_types::{DType, Scalar};

    use super::Frame;
    use crate::{FrameError, Selection, Series};

    fn s(v: &str) -> Scalar {
        Scalar::str(v)
    }

    fn ix(labels: &[&str]) -> AxisIndex {
        AxisIndex::new(labels.iter().map(|l| s(l))).expect("unique")
    }

    fn ints(rows: &[&[i64]]) -> Vec<Vec<Scalar>> {
        rows.iter()
            .map(|r| r.iter().copied().map(Scalar::Int).collect())
            .collect()
    }

    fn sample() -> Frame {
        let records = vec![
            vec![Scalar::Int(1), s("p"), Scalar::Float(0.5)],
            vec![Scalar::Int(2), s("q"), Scalar::Float(1.5)],
        ];
        Frame::from_records(&records, Some(ix(&["r0", "r1"])), Some(ix(&["a", "b", "c"])))
            .expect("frame")
    }

    #[test]
    fn records_infer_column_dtypes() {
        let frame = sample();
        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(frame.dtypes(), vec![DType::Int64, DType::Str(1), DType::Float64]);
        assert_eq!(frame.element(&s("r1"), &s("b")).expect("element"), s("q"));
        assert!(matches!(
            frame.element(&s("r9"), &s("b")),
            Err(FrameError::Index(_))
        ));
    }

    #[test]
    fn selection_reduces_dimensionality() {
        let frame = sample();
        let row = frame
            .iloc(&ILocKey::Position(1), &ILocKey::all())
            .expect("row")
            .into_series()
            .expect("series");
        assert_eq!(row.name(), Some(&s("r1")));
        assert_eq!(row.index().labels(), vec![s("a"), s("b"), s("c")]);
        assert_eq!(row.dtype(), DType::Object);

        let column = frame
            .loc(&LocKey::Labels(vec![s("r0"), s("r1")]), &LocKey::from("c"))
            .expect("column")
            .into_series()
            .expect("series");
        assert_eq!(column.name(), Some(&s("c")));
        assert_eq!(column.dtype(), DType::Float64);

        let sub = frame
            .iloc(&ILocKey::all(), &ILocKey::Positions(vec![2, 0]))
            .expect("sub");
        let Selection::Frame(sub) = sub else {
            panic!("expected a frame");
        };
        assert_eq!(sub.columns().labels(), vec![s("c"), s("a")]);
    }

    #[test]
    fn from_items_aligns_on_union() {
        let a = Series::new(Array::from_i64s(vec![1, 2]), ix(&["x", "y"])).expect("a");
        let b = Series::new(Array::from_i64s(vec![3]), ix(&["y"])).expect("b");
        let frame = Frame::from_items([(s("a"), a), (s("b"), b)]).expect("frame");
        assert_eq!(frame.shape(), (2, 2));
        assert_eq!(frame.dtypes(), vec![DType::Int64, DType::Float64]);
        assert!(frame.element(&s("x"), &s("b")).expect("x,b").is_nan());
    }

    #[test]
    fn na_names_cannot_label_columns() {
        let named = Series::from_values(Array::from_i64s(vec![1])).expect("series").with_name(Scalar::None);
        assert!(matches!(
            Frame::from_series([&named]),
            Err(FrameError::NameUnhashable { .. })
        ));
    }

    #[test]
    fn frame_addition_aligns_both_axes() {
        let left = Frame::from_records(&ints(&[&[1, 2], &[3, 4]]), Some(ix(&["r0", "r1"])), Some(ix(&["a", "b"])))
            .expect("left");
        let right = Frame::from_records(&ints(&[&[10]]), Some(ix(&["r1"])), Some(ix(&["b"]))).expect("right");
        let sum = left.binary_op(&right, ArithmeticOp::Add.into()).expect("sum");
        assert_eq!(sum.element(&s("r1"), &s("b")).expect("r1,b"), Scalar::Float(14.0));
        assert!(sum.element(&s("r0"), &s("a")).expect("r0,a").is_nan());
    }

    #[test]
    fn series_operand_aligns_on_columns() {
        let frame = Frame::from_records(&ints(&[&[1, 2], &[3, 4]]), None, Some(ix(&["a", "b"]))).expect("frame");
        let row = Series::new(Array::from_i64s(vec![100, 10]), ix(&["b", "a"])).expect("row");
        let out = frame.binary_op_series(&row, ArithmeticOp::Add.into(), false).expect("add");
        assert_eq!(out.element(&Scalar::Int(1), &s("a")).expect("1,a"), Scalar::Int(13));
        assert_eq!(out.element(&Scalar::Int(0), &s("b")).expect("0,b"), Scalar::Int(102));
    }

    #[test]
    fn matmul_aligns_inner_labels() {
        let left = Frame::from_records(&ints(&[&[1, 2], &[3, 4]]), None, Some(ix(&["p", "q"]))).expect("left");
        let right = Frame::from_records(&ints(&[&[1], &[10]]), Some(ix(&["q", "p"])), Some(ix(&["z"]))).expect("right");
        let product = left.matmul(&right).expect("matmul");
        assert_eq!(product.element(&Scalar::Int(0), &s("z")).expect("0,z"), Scalar::Int(12));
        assert_eq!(product.element(&Scalar::Int(1), &s("z")).expect("1,z"), Scalar::Int(34));

        let vector = Series::new(Array::from_i64s(vec![1, 1, 1]), ix(&["p", "q", "r"])).expect("vector");
        let err = left.matmul_series(&vector).expect_err("labels differ");
        assert!(matches!(err, FrameError::NotAlignable { .. }));
    }

    #[test]
    fn concat_fills_missing_columns() {
        let a = Frame::from_records(&ints(&[&[1]]), Some(ix(&["r0"])), Some(ix(&["a"]))).expect("a");
        let b = Frame::from_records(&ints(&[&[2]]), Some(ix(&["r1"])), Some(ix(&["b"]))).expect("b");
        let stacked = Frame::from_concat(&[a.clone(), b.clone()], Axis::Rows).expect("rows");
        assert_eq!(stacked.shape(), (2, 2));
        assert!(stacked.element(&s("r1"), &s("a")).expect("r1,a").is_nan());
        let side = Frame::from_concat(&[a, b], Axis::Columns).expect("columns");
        assert_eq!(side.shape(), (2, 2));
        assert!(side.element(&s("r0"), &s("b")).expect("r0,b").is_nan());
    }

    #[test]
    fn shift_transpose_and_duplicates() {
        let frame = Frame::from_records(&ints(&[&[1, 1], &[2, 2], &[1, 1]]), None, Some(ix(&["a", "b"]))).expect("frame");
        let shifted = frame.shift(1, None).expect("shift");
        assert!(shifted.element(&Scalar::Int(0), &s("a")).expect("0,a").is_nan());
        assert_eq!(shifted.element(&Scalar::Int(1), &s("a")).expect("1,a"), Scalar::Float(1.0));
        let vacated = frame.shift(i64::MIN, None).expect("shift past the start");
        assert!(vacated.isna().column(&s("b")).expect("b").values().iter().all(|v| v == Scalar::Bool(true)));

        let transposed = frame.transpose().expect("transpose");
        assert_eq!(transposed.shape(), (2, 3));
        assert_eq!(transposed.element(&s("b"), &Scalar::Int(1)).expect("b,1"), Scalar::Int(2));

        let rows = frame.duplicated(Axis::Rows, false, false).expect("rows");
        assert_eq!(
            rows.values().to_vec(),
            vec![Scalar::Bool(true), Scalar::Bool(false), Scalar::Bool(true)]
        );
        let cols = frame.duplicated(Axis::Columns, true, false).expect("columns");
        assert_eq!(cols.values().to_vec(), vec![Scalar::Bool(false), Scalar::Bool(true)]);
    }

    #[test]
    fn rehierarch_reorders_rows() {
        let index = IndexHierarchy::from_product([vec![s("x"), s("y")], vec![Scalar::Int(1), Scalar::Int(2)]])
            .expect("product");
        let records = ints(&[&[0], &[1], &[2], &[3]]);
        let frame = Frame::from_records(&records, Some(index.into()), Some(ix(&["v"]))).expect("frame");
        let swapped = frame.rehierarch(Axis::Rows, &[1, 0]).expect("rehierarch");
        assert_eq!(
            swapped.column(&s("v")).expect("v").values().to_vec(),
            vec![Scalar::Int(0), Scalar::Int(2), Scalar::Int(1), Scalar::Int(3)]
        );
        let relabeled = frame
            .relabel(None, Some(&Relabel::Labels(vec![s("w")])))
            .expect("relabel");
        assert_eq!(relabeled.columns().labels(), vec![s("w")]);
    }
}
