#![forbid(unsafe_code)]

use std::collections::HashMap;

use sf_array::{
    Array, ArrayError, Axis, BinaryOp, ILocKey, Shape, array_shift, array_to_duplicated,
    binary_op, binary_op_scalar, concat_resolved, fill_dtype, full_for_fill, isna_array, roll_2d,
};
use sf_types::{DType, NAT, Scalar, TypeError};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BlocksError {
    #[error("block has {found} rows, expected {expected}")]
    RowCountMismatch { expected: usize, found: usize },
    #[error("expected {expected} columns, found {found}")]
    ColumnCountMismatch { expected: usize, found: usize },
    #[error("shapes {left:?} and {right:?} are not compatible")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
    #[error(transparent)]
    Array(#[from] ArrayError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Missing-value marker used when reindexing introduces new cells: NaT for
/// temporal dtypes, NaN otherwise.
#[must_use]
pub fn na_fill_for(dtype: DType) -> Scalar {
    match dtype {
        DType::DateTime64(unit) => Scalar::DateTime(NAT, unit),
        DType::TimeDelta64(unit) => Scalar::TimeDelta(NAT, unit),
        _ => Scalar::Float(f64::NAN),
    }
}

/// Result of `extract`: the dimensionality follows the keys.
#[derive(Debug, Clone)]
pub enum Extraction {
    Element(Scalar),
    Array(Array),
    Blocks(TypeBlocks),
}

// ── TypeBlocks ─────────────────────────────────────────────────────────

/// A 2D table stored as a sequence of read-only 2D blocks, each of one
/// dtype, laid side by side.
#[derive(Debug, Clone)]
pub struct TypeBlocks {
    blocks: Vec<Array>,
    /// `offsets[b]` is the first column of block `b`; the last entry is the
    /// column count.
    offsets: Vec<usize>,
    rows: usize,
}

impl TypeBlocks {
    fn assemble(blocks: Vec<Array>, rows: usize) -> Self {
        let mut offsets = Vec::with_capacity(blocks.len() + 1);
        offsets.push(0);
        let mut total = 0;
        let blocks: Vec<Array> = blocks
            .into_iter()
            .filter(|block| block.shape().cols() > 0)
            .map(|block| block.column_2d_filter().freeze())
            .collect();
        for block in &blocks {
            total += block.shape().cols();
            offsets.push(total);
        }
        Self {
            blocks,
            offsets,
            rows,
        }
    }

    /// Build from arrays laid left to right. 1D arrays become single
    /// columns; zero-column arrays are dropped; row counts must agree.
    pub fn from_blocks<I>(arrays: I) -> Result<Self, BlocksError>
    where
        I: IntoIterator<Item = Array>,
    {
        let arrays: Vec<Array> = arrays.into_iter().collect();
        let rows = arrays.first().map_or(0, |a| a.shape().rows());
        for array in &arrays {
            if array.shape().rows() != rows {
                return Err(BlocksError::RowCountMismatch {
                    expected: rows,
                    found: array.shape().rows(),
                });
            }
        }
        Ok(Self::assemble(arrays, rows))
    }

    /// One block per column, then consolidated.
    pub fn from_columns<I>(columns: I) -> Result<Self, BlocksError>
    where
        I: IntoIterator<Item = Array>,
    {
        Self::from_blocks(columns)?.consolidate()
    }

    pub fn from_element(element: &Scalar, rows: usize, columns: usize) -> Result<Self, BlocksError> {
        let block = full_for_fill(None, Shape::Two(rows, columns), element)?;
        Ok(Self::assemble(vec![block], rows))
    }

    /// No rows and no columns.
    #[must_use]
    pub fn empty(rows: usize) -> Self {
        Self::assemble(Vec::new(), rows)
    }

    // ── Accessors ──────────────────────────────────────────────────────

    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns())
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn columns(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    #[must_use]
    pub fn blocks(&self) -> &[Array] {
        &self.blocks
    }

    /// One dtype per column.
    #[must_use]
    pub fn dtypes(&self) -> Vec<DType> {
        self.blocks
            .iter()
            .flat_map(|block| std::iter::repeat_n(block.dtype(), block.shape().cols()))
            .collect()
    }

    /// Block and in-block column of `col`.
    fn locate(&self, col: usize) -> Result<(usize, usize), BlocksError> {
        if col >= self.columns() {
            return Err(ArrayError::PositionOutOfBounds {
                position: col as i64,
                len: self.columns(),
            }
            .into());
        }
        let block = self.offsets.partition_point(|&start| start <= col) - 1;
        Ok((block, col - self.offsets[block]))
    }

    pub fn element(&self, row: usize, col: usize) -> Result<Scalar, BlocksError> {
        let (block, col) = self.locate(col)?;
        self.blocks[block].get2(row, col).ok_or_else(|| {
            ArrayError::PositionOutOfBounds {
                position: row as i64,
                len: self.rows,
            }
            .into()
        })
    }

    /// Column `col` as a 1D array.
    pub fn column_array(&self, col: usize) -> Result<Array, BlocksError> {
        let (block, col) = self.locate(col)?;
        let block = &self.blocks[block];
        if block.shape().cols() == 1 {
            return Ok(block.column_1d_filter());
        }
        Ok(block.column(col)?)
    }

    /// Row `row` as a 1D array of the resolved dtype.
    pub fn row_array(&self, row: usize) -> Result<Array, BlocksError> {
        if self.blocks.is_empty() {
            return Ok(Array::empty(DType::Float64)?);
        }
        let parts = self
            .blocks
            .iter()
            .map(|block| block.row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(concat_resolved(&parts, Axis::Rows)?)
    }

    // ── Selection ──────────────────────────────────────────────────────

    fn block_columns(&self, block: usize, cols: &[usize]) -> Result<Array, BlocksError> {
        let array = &self.blocks[block];
        let whole = cols.len() == array.shape().cols() && cols.iter().enumerate().all(|(i, &c)| i == c);
        if whole {
            return Ok(array.clone());
        }
        Ok(array.take_columns(cols)?)
    }

    /// Columns at `key`. Runs of adjacent columns in one block stay one
    /// block; a fully selected block is reused without copying.
    pub fn select_columns(&self, key: &ILocKey) -> Result<Self, BlocksError> {
        if key.is_all(self.columns()) {
            return Ok(self.clone());
        }
        let mut blocks = Vec::new();
        let mut run: Option<(usize, Vec<usize>)> = None;
        for col in key.positions(self.columns())? {
            let (block, c) = self.locate(col)?;
            match &mut run {
                Some((b, cols)) if *b == block && cols.last().is_some_and(|&last| last + 1 == c) => {
                    cols.push(c);
                }
                _ => {
                    if let Some((b, cols)) = run.take() {
                        blocks.push(self.block_columns(b, &cols)?);
                    }
                    run = Some((block, vec![c]));
                }
            }
        }
        if let Some((b, cols)) = run {
            blocks.push(self.block_columns(b, &cols)?);
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    pub fn select_rows(&self, key: &ILocKey) -> Result<Self, BlocksError> {
        if key.is_all(self.rows) {
            return Ok(self.clone());
        }
        let rows = key.positions(self.rows)?.len();
        let blocks = self
            .blocks
            .iter()
            .map(|block| block.select_rows(key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(blocks, rows))
    }

    /// Select by row and column keys. Two single positions give an element,
    /// one gives a 1D array, none a container.
    pub fn extract(&self, row_key: &ILocKey, col_key: &ILocKey) -> Result<Extraction, BlocksError> {
        if row_key.is_element() && col_key.is_element() {
            let row = row_key.positions(self.rows)?[0];
            let col = col_key.positions(self.columns())?[0];
            return self.element(row, col).map(Extraction::Element);
        }
        let selected = self.select_columns(col_key)?.select_rows(row_key)?;
        if row_key.is_element() {
            return selected.row_array(0).map(Extraction::Array);
        }
        if col_key.is_element() {
            return selected.column_array(0).map(Extraction::Array);
        }
        Ok(Extraction::Blocks(selected))
    }

    /// Like `extract`, always as one array.
    pub fn extract_array(&self, row_key: &ILocKey, col_key: &ILocKey) -> Result<Array, BlocksError> {
        match self.extract(row_key, col_key)? {
            Extraction::Element(value) => Ok(full_for_fill(None, Shape::One(1), &value)?),
            Extraction::Array(array) => Ok(array),
            Extraction::Blocks(blocks) => blocks.to_array(),
        }
    }

    /// All values as one 2D array of the resolved dtype.
    pub fn to_array(&self) -> Result<Array, BlocksError> {
        match self.blocks.as_slice() {
            [] => Ok(Array::from_shape_scalars(
                Shape::Two(self.rows, 0),
                &[],
                DType::Float64,
            )?),
            [block] => Ok(block.clone()),
            blocks => Ok(concat_resolved(blocks, Axis::Columns)?),
        }
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Result<Array, BlocksError>> + '_ {
        (0..self.rows).map(|row| self.row_array(row))
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = Result<Array, BlocksError>> + '_ {
        (0..self.columns()).map(|col| self.column_array(col))
    }

    // ── Restructuring ──────────────────────────────────────────────────

    /// Merge adjacent blocks of equal dtype.
    pub fn consolidate(&self) -> Result<Self, BlocksError> {
        let mut blocks: Vec<Array> = Vec::with_capacity(self.blocks.len());
        let mut group: Vec<Array> = Vec::new();
        let flush = |group: &mut Vec<Array>, blocks: &mut Vec<Array>| -> Result<(), BlocksError> {
            match group.len() {
                0 => {}
                1 => blocks.extend(group.drain(..)),
                _ => {
                    blocks.push(concat_resolved(group, Axis::Columns)?);
                    group.clear();
                }
            }
            Ok(())
        };
        for block in &self.blocks {
            if group.last().is_some_and(|last| last.dtype() != block.dtype()) {
                flush(&mut group, &mut blocks)?;
            }
            group.push(block.clone());
        }
        flush(&mut group, &mut blocks)?;
        if blocks.len() != self.blocks.len() {
            debug!(from = self.blocks.len(), to = blocks.len(), "consolidated blocks");
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Replace the columns in `replacements`, keeping untouched blocks and
    /// runs of untouched columns intact.
    fn with_columns(&self, replacements: &HashMap<usize, Array>) -> Result<Self, BlocksError> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (b, block) in self.blocks.iter().enumerate() {
            let start = self.offsets[b];
            let width = block.shape().cols();
            if !(start..start + width).any(|col| replacements.contains_key(&col)) {
                blocks.push(block.clone());
                continue;
            }
            let mut run = Vec::new();
            for c in 0..width {
                match replacements.get(&(start + c)) {
                    Some(column) => {
                        if !run.is_empty() {
                            blocks.push(block.take_columns(&run)?);
                            run.clear();
                        }
                        trace!(column = start + c, dtype = %column.dtype(), "replace column");
                        blocks.push(column.column_2d_filter());
                    }
                    None => run.push(c),
                }
            }
            if !run.is_empty() {
                blocks.push(block.take_columns(&run)?);
            }
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Cast the columns at `col_key`.
    pub fn astype(&self, col_key: &ILocKey, dtype: DType) -> Result<Self, BlocksError> {
        if col_key.is_all(self.columns()) {
            let blocks = self
                .blocks
                .iter()
                .map(|block| block.astype(dtype))
                .collect::<Result<Vec<_>, _>>()?;
            return Self::assemble(blocks, self.rows).consolidate();
        }
        let mut replacements = HashMap::new();
        for col in col_key.positions(self.columns())? {
            replacements.insert(col, self.column_array(col)?.astype(dtype)?);
        }
        self.with_columns(&replacements)
    }

    /// Replace the columns at `col_key` with the columns of `values`: a 1D
    /// array for one column, or a 2D array with one column per position.
    pub fn assign(&self, col_key: &ILocKey, values: &Array) -> Result<Self, BlocksError> {
        let positions = col_key.positions(self.columns())?;
        let values = values.column_2d_filter();
        if values.shape().rows() != self.rows {
            return Err(BlocksError::RowCountMismatch {
                expected: self.rows,
                found: values.shape().rows(),
            });
        }
        if values.shape().cols() != positions.len() {
            return Err(BlocksError::ColumnCountMismatch {
                expected: positions.len(),
                found: values.shape().cols(),
            });
        }
        let mut replacements = HashMap::with_capacity(positions.len());
        for (i, col) in positions.into_iter().enumerate() {
            replacements.insert(col, values.column(i)?);
        }
        self.with_columns(&replacements)
    }

    /// Per-cell null flags.
    #[must_use]
    pub fn isna(&self) -> Self {
        let blocks = self.blocks.iter().map(isna_array).collect();
        Self::assemble(blocks, self.rows)
    }

    /// Replace null cells with `value`; blocks holding nulls widen to hold it.
    pub fn fillna(&self, value: &Scalar) -> Result<Self, BlocksError> {
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let mask = isna_array(block).to_vec();
            if !mask.iter().any(|m| matches!(m, Scalar::Bool(true))) {
                blocks.push(block.clone());
                continue;
            }
            trace!(dtype = %block.dtype(), "fill nulls in block");
            let dtype = fill_dtype(block.dtype(), value);
            let values: Vec<Scalar> = block
                .iter()
                .zip(mask)
                .map(|(v, m)| if matches!(m, Scalar::Bool(true)) { value.clone() } else { v })
                .collect();
            blocks.push(Array::from_shape_scalars(block.shape(), &values, dtype)?);
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Reindex rows; `None` positions take `fill`.
    pub fn take_rows_with_fill(
        &self,
        positions: &[Option<usize>],
        fill: &Scalar,
    ) -> Result<Self, BlocksError> {
        self.take_rows_with_fill_by(positions, |_| fill.clone())
    }

    /// Reindex rows; `None` positions take the fill chosen per block dtype.
    pub fn take_rows_with_fill_by<F>(&self, positions: &[Option<usize>], fill: F) -> Result<Self, BlocksError>
    where
        F: Fn(DType) -> Scalar,
    {
        let blocks = self
            .blocks
            .iter()
            .map(|block| {
                trace!(dtype = %block.dtype(), rows = positions.len(), "reindex block rows");
                block.take_rows_with_fill(positions, &fill(block.dtype()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(blocks, positions.len()))
    }

    /// Reindex columns; `None` positions become columns of `fill`.
    pub fn take_columns_with_fill(
        &self,
        positions: &[Option<usize>],
        fill: &Scalar,
    ) -> Result<Self, BlocksError> {
        let mut blocks = Vec::with_capacity(positions.len());
        for position in positions {
            let column = match position {
                Some(col) => self.column_array(*col)?,
                None => full_for_fill(None, Shape::One(self.rows), fill)?,
            };
            blocks.push(column);
        }
        Self::assemble(blocks, self.rows).consolidate()
    }

    pub fn shift_rows(&self, shift: i64, wrap: bool, fill: &Scalar) -> Result<Self, BlocksError> {
        let blocks = self
            .blocks
            .iter()
            .map(|block| array_shift(block, shift, Axis::Rows, wrap, fill))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(blocks, self.rows))
    }

    #[must_use]
    pub fn roll_rows(&self, shift: i64) -> Self {
        let blocks = self
            .blocks
            .iter()
            .map(|block| roll_2d(block, shift, Axis::Rows))
            .collect();
        Self::assemble(blocks, self.rows)
    }

    /// Swap rows and columns; the result is one block.
    pub fn transpose(&self) -> Result<Self, BlocksError> {
        let array = self.to_array()?.transpose();
        let rows = array.shape().rows();
        Ok(Self::assemble(vec![array], rows))
    }

    /// Lay containers with equal row counts side by side.
    pub fn concat_horizontal<'a, I>(parts: I) -> Result<Self, BlocksError>
    where
        I: IntoIterator<Item = &'a TypeBlocks>,
    {
        let mut rows = None;
        let mut blocks = Vec::new();
        for part in parts {
            let expected = *rows.get_or_insert(part.rows);
            if part.rows != expected {
                return Err(BlocksError::RowCountMismatch {
                    expected,
                    found: part.rows,
                });
            }
            blocks.extend(part.blocks.iter().cloned());
        }
        Ok(Self::assemble(blocks, rows.unwrap_or(0)))
    }

    /// Stack containers with equal column counts. Matching block layouts
    /// concatenate block by block, otherwise column by column.
    pub fn concat_vertical<'a, I>(parts: I) -> Result<Self, BlocksError>
    where
        I: IntoIterator<Item = &'a TypeBlocks>,
    {
        let parts: Vec<&TypeBlocks> = parts.into_iter().collect();
        let Some(first) = parts.first() else {
            return Ok(Self::empty(0));
        };
        for part in &parts {
            if part.columns() != first.columns() {
                return Err(BlocksError::ColumnCountMismatch {
                    expected: first.columns(),
                    found: part.columns(),
                });
            }
        }
        let rows = parts.iter().map(|part| part.rows).sum();
        if parts.iter().all(|part| part.offsets == first.offsets) {
            let blocks = (0..first.blocks.len())
                .map(|b| {
                    let stack: Vec<Array> = parts.iter().map(|part| part.blocks[b].clone()).collect();
                    concat_resolved(&stack, Axis::Rows)
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Self::assemble(blocks, rows));
        }
        debug!(parts = parts.len(), "vertical concat by column");
        let mut columns = Vec::with_capacity(first.columns());
        for col in 0..first.columns() {
            let stack = parts
                .iter()
                .map(|part| part.column_array(col))
                .collect::<Result<Vec<_>, _>>()?;
            columns.push(concat_resolved(&stack, Axis::Rows)?);
        }
        Self::assemble(columns, rows).consolidate()
    }

    // ── Operators ──────────────────────────────────────────────────────

    /// Columns `start..end`, which must lie inside one block.
    fn segment(&self, start: usize, end: usize) -> Result<Array, BlocksError> {
        let (block, c) = self.locate(start)?;
        let cols: Vec<usize> = (c..c + (end - start)).collect();
        self.block_columns(block, &cols)
    }

    /// Elementwise operator over two containers of equal shape, walking
    /// both block lists along their shared column boundaries.
    pub fn binary_op(&self, other: &Self, op: BinaryOp) -> Result<Self, BlocksError> {
        if self.shape() != other.shape() {
            return Err(BlocksError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut bounds: Vec<usize> = self.offsets.iter().chain(&other.offsets).copied().collect();
        bounds.sort_unstable();
        bounds.dedup();
        let mut blocks = Vec::with_capacity(bounds.len().saturating_sub(1));
        for window in bounds.windows(2) {
            let (start, end) = (window[0], window[1]);
            trace!(start, end, %op, "block operator segment");
            let left = self.segment(start, end)?;
            let right = other.segment(start, end)?;
            blocks.push(binary_op(&left, &right, op)?);
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Elementwise operator with one scalar; `reflected` puts it on the left.
    pub fn binary_op_scalar(&self, value: &Scalar, op: BinaryOp, reflected: bool) -> Result<Self, BlocksError> {
        let blocks = self
            .blocks
            .iter()
            .map(|block| binary_op_scalar(block, value, op, reflected))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Elementwise operator with a 1D array holding one value per column,
    /// applied to every row.
    pub fn binary_op_row(&self, row: &Array, op: BinaryOp, reflected: bool) -> Result<Self, BlocksError> {
        if row.ndim() != 1 || row.len() != self.columns() {
            return Err(BlocksError::ColumnCountMismatch {
                expected: self.columns(),
                found: row.shape().cols().max(row.len()),
            });
        }
        let mut blocks = Vec::with_capacity(self.blocks.len());
        for (b, block) in self.blocks.iter().enumerate() {
            let cols: Vec<usize> = (self.offsets[b]..self.offsets[b + 1]).collect();
            let part = row.take_rows(&cols)?;
            trace!(block = b, %op, "row operand over block");
            let out = if reflected {
                binary_op(&part, block, op)?
            } else {
                binary_op(block, &part, op)?
            };
            blocks.push(out);
        }
        Ok(Self::assemble(blocks, self.rows))
    }

    /// Flag duplicated rows (`Axis::Rows`) or columns (`Axis::Columns`).
    pub fn duplicated(&self, axis: Axis, exclude_first: bool, exclude_last: bool) -> Result<Array, BlocksError> {
        let array = self.to_array()?;
        Ok(array_to_duplicated(&array, axis, exclude_first, exclude_last))
    }

    /// Whether both hold equal values with equal dtypes, NaN matching NaN.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self.dtypes() == other.dtypes()
            && (0..self.columns()).all(|col| {
                match (self.column_array(col), other.column_array(col)) {
                    (Ok(a), Ok(b)) => a.equals(&b),
                    _ => false,
                }
            })
    }
}
