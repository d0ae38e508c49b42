use std::iter;

use sf_array::ArrayError;
use sf_frame::{Frame, FrameError, Series};
use sf_index::AxisIndex;
use sf_types::{DType, Label, Scalar};

use crate::{DisplayConfig, DisplayError, DisplayFormat};

const ELLIPSIS: &str = "...";

/// Positions shown out of `len`: all of them, or a head and a tail around a
/// `None` marking the elided middle.
fn visible(len: usize, limit: usize) -> Vec<Option<usize>> {
    if len <= limit {
        return (0..len).map(Some).collect();
    }
    let head = limit.div_ceil(2);
    let tail = limit - head;
    (0..head)
        .map(Some)
        .chain(iter::once(None))
        .chain((len - tail..len).map(Some))
        .collect()
}

fn clip(cell: String, width: usize) -> String {
    if cell.chars().count() <= width {
        return cell;
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = cell.chars().take(width - 1).collect();
    out.push('…');
    out
}

fn format_value(value: &Scalar, config: &DisplayConfig) -> String {
    match (value, config.value_format_float_positional, config.value_format_complex_positional) {
        (Scalar::Float(v), Some(digits), _) if v.is_finite() => format!("{v:.digits$}"),
        (Scalar::Complex(c), _, Some(digits)) => {
            let sign = if c.im.is_sign_negative() { '-' } else { '+' };
            format!("({:.digits$}{sign}{:.digits$}j)", c.re, c.im.abs())
        }
        _ => value.to_string(),
    }
}

fn format_type(dtype: DType, config: &DisplayConfig) -> String {
    format!("{}{dtype}{}", config.type_delimiter_left, config.type_delimiter_right)
}

fn label_text(label: Option<&Label>) -> String {
    label.map(ToString::to_string).unwrap_or_default()
}

fn index_label(index: &AxisIndex, position: usize) -> String {
    label_text(index.label_at(position))
}

// ── Table model ────────────────────────────────────────────────────────

/// Cells before layout. Every row has the same number of cells; the first
/// column is the index when it is shown.
struct Table {
    title: Option<String>,
    header: Option<Vec<String>>,
    body: Vec<Vec<String>>,
    types: Option<Vec<String>>,
    has_index: bool,
}

impl Table {
    fn width(&self) -> usize {
        self.header
            .as_ref()
            .or(self.body.first())
            .or(self.types.as_ref())
            .map_or(0, Vec::len)
    }

    fn clip(&mut self, config: &DisplayConfig) {
        let has_index = self.has_index;
        let rows = self
            .header
            .iter_mut()
            .chain(self.body.iter_mut())
            .chain(self.types.iter_mut());
        for row in rows {
            for (col, cell) in row.iter_mut().enumerate() {
                let width = if col == 0 && has_index {
                    config.cell_max_width_leftmost
                } else {
                    config.cell_max_width
                };
                *cell = clip(std::mem::take(cell), width);
            }
        }
    }

    fn render(mut self, config: &DisplayConfig) -> String {
        self.clip(config);
        match config.display_format {
            DisplayFormat::Terminal => self.render_terminal(config),
            DisplayFormat::Markdown => self.render_markdown(),
        }
    }

    fn render_terminal(self, config: &DisplayConfig) -> String {
        let rows: Vec<&Vec<String>> = self
            .header
            .iter()
            .chain(self.body.iter())
            .chain(self.types.iter())
            .collect();
        let mut widths = vec![0; self.width()];
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let mut lines: Vec<String> = self.title.into_iter().collect();
        for row in rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| {
                    if config.cell_align_left {
                        format!("{cell:<width$}")
                    } else {
                        format!("{cell:>width$}")
                    }
                })
                .collect();
            lines.push(cells.join("  ").trim_end().to_owned());
        }
        lines.join("\n")
    }

    fn render_markdown(self) -> String {
        let width = self.width();
        let header = self.header.unwrap_or_else(|| vec![String::new(); width]);
        let escape = |cell: &String| cell.replace('|', "\\|");
        let line = |row: &Vec<String>| {
            let cells: Vec<String> = row.iter().map(escape).collect();
            format!("|{}|", cells.join("|"))
        };
        let mut lines = vec![line(&header), format!("|{}|", vec!["---"; width].join("|"))];
        lines.extend(self.body.iter().map(line));
        lines.extend(self.types.iter().map(line));
        lines.join("\n")
    }
}

fn title(kind: &str, name: Option<&Label>, config: &DisplayConfig) -> Option<String> {
    config.include_name.then(|| {
        let (left, right) = (&config.type_delimiter_left, &config.type_delimiter_right);
        match name {
            Some(name) => format!("{left}{kind}: {name}{right}"),
            None => format!("{left}{kind}{right}"),
        }
    })
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render a series: one row per label, then the index and value types.
pub fn render_series(series: &Series, config: &DisplayConfig) -> Result<String, DisplayError> {
    let len = series.len();
    let mut body = Vec::new();
    for position in visible(len, config.display_rows) {
        let mut row = Vec::with_capacity(2);
        match position {
            Some(p) => {
                let value = series.values().get(p).ok_or_else(|| {
                    FrameError::from(ArrayError::PositionOutOfBounds {
                        position: p as i64,
                        len,
                    })
                })?;
                if config.include_index {
                    row.push(index_label(series.index(), p));
                }
                row.push(format_value(&value, config));
            }
            None => {
                if config.include_index {
                    row.push(ELLIPSIS.to_owned());
                }
                row.push(ELLIPSIS.to_owned());
            }
        }
        body.push(row);
    }

    let header = (config.display_format == DisplayFormat::Markdown && config.include_columns).then(|| {
        let mut header = Vec::with_capacity(2);
        if config.include_index {
            header.push(label_text(series.index().name()));
        }
        header.push(label_text(series.name()));
        header
    });
    let types = config.type_show.then(|| {
        let mut types = Vec::with_capacity(2);
        if config.include_index {
            types.push(format_type(series.index().dtype(), config));
        }
        types.push(format_type(series.dtype(), config));
        types
    });
    let table = Table {
        title: title("Series", series.name(), config),
        header,
        body,
        types,
        has_index: config.include_index,
    };
    Ok(table.render(config))
}

/// Render a frame: a header of column labels, one row per index label, then
/// the index and column types.
pub fn render_frame(frame: &Frame, config: &DisplayConfig) -> Result<String, DisplayError> {
    let (rows, cols) = frame.shape();
    let columns = visible(cols, config.display_columns);
    let dtypes = frame.dtypes();

    let prefix = |index_cell: String| -> Vec<String> {
        if config.include_index {
            vec![index_cell]
        } else {
            Vec::new()
        }
    };

    let header = config.include_columns.then(|| {
        let mut header = prefix(label_text(frame.index().name()));
        header.extend(columns.iter().map(|c| match c {
            Some(c) => index_label(frame.columns(), *c),
            None => ELLIPSIS.to_owned(),
        }));
        header
    });

    let mut body = Vec::new();
    for position in visible(rows, config.display_rows) {
        let row = match position {
            Some(r) => {
                let mut row = prefix(index_label(frame.index(), r));
                for column in &columns {
                    row.push(match column {
                        Some(c) => {
                            let value = frame.blocks().element(r, *c).map_err(FrameError::from)?;
                            format_value(&value, config)
                        }
                        None => ELLIPSIS.to_owned(),
                    });
                }
                row
            }
            None => {
                let mut row = prefix(ELLIPSIS.to_owned());
                row.extend(columns.iter().map(|_| ELLIPSIS.to_owned()));
                row
            }
        };
        body.push(row);
    }

    let types = config.type_show.then(|| {
        let mut types = prefix(format_type(frame.index().dtype(), config));
        types.extend(columns.iter().map(|c| match c {
            Some(c) => format_type(dtypes[*c], config),
            None => String::new(),
        }));
        types
    });
    let table = Table {
        title: title("Frame", frame.name(), config),
        header,
        body,
        types,
        has_index: config.include_index,
    };
    Ok(table.render(config))
}

#[cfg(test)]
mod tests {
    use sf_array::Array;
    use sf_frame::{Frame, Series};
    use sf_index::AxisIndex;
    use sf_types::Scalar;

    use super::{render_frame, render_series, visible};
    use crate::{DisplayConfig, DisplayFormat};

    fn s(v: &str) -> Scalar {
        Scalar::str(v)
    }

    fn ix(labels: &[&str]) -> AxisIndex {
        AxisIndex::new(labels.iter().map(|l| s(l))).expect("unique")
    }

    #[test]
    fn visible_keeps_head_and_tail() {
        assert_eq!(visible(3, 5), vec![Some(0), Some(1), Some(2)]);
        assert_eq!(
            visible(10, 4),
            vec![Some(0), Some(1), None, Some(8), Some(9)]
        );
    }

    #[test]
    fn series_terminal_layout() {
        let series = Series::new(Array::from_i64s(vec![1, 2, 3]), ix(&["a", "b", "c"]))
            .expect("series")
            .with_name(s("n"));
        let out = render_series(&series, &DisplayConfig::default()).expect("render");
        assert_eq!(out, "<Series: n>\na      1\nb      2\nc      3\n<<U1>  <int64>");
    }

    #[test]
    fn long_series_is_truncated() {
        let series = Series::from_values(Array::arange(10)).expect("series");
        let config = DisplayConfig::default().with_display_rows(4).with_type_show(false);
        let out = render_series(&series, &config).expect("render");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3], "...  ...");
        assert!(!out.contains('5'));
    }

    #[test]
    fn cells_are_clipped() {
        let series = Series::new(Array::from_strs(&["abcdefghij"]), ix(&["k"])).expect("series");
        let config = DisplayConfig::default()
            .with_cell_max_width(5)
            .with_include_name(false)
            .with_type_show(false);
        assert_eq!(render_series(&series, &config).expect("render"), "k  abcd…");
    }

    #[test]
    fn frame_markdown_table() {
        let records = vec![vec![Scalar::Int(1), s("x")]];
        let frame = Frame::from_records(&records, None, Some(ix(&["a", "b"]))).expect("frame");
        let config = DisplayConfig::default()
            .with_display_format(DisplayFormat::Markdown)
            .with_type_show(false)
            .with_include_name(false);
        assert_eq!(
            render_frame(&frame, &config).expect("render"),
            "||a|b|\n|---|---|---|\n|0|1|x|"
        );
    }

    #[test]
    fn frame_terminal_with_types_and_column_truncation() {
        let records = vec![vec![Scalar::Float(0.5), Scalar::Int(2), Scalar::Int(3)]];
        let frame = Frame::from_records(&records, None, Some(ix(&["p", "q", "r"])))
            .expect("frame")
            .with_name(s("f"));
        let config = DisplayConfig::default()
            .with_display_columns(2)
            .with_float_precision(Some(2));
        let out = render_frame(&frame, &config).expect("render");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "<Frame: f>");
        assert!(lines[1].contains("p") && lines[1].contains("...") && lines[1].contains("r"));
        assert!(!lines[1].contains("q"));
        assert!(lines[2].starts_with("0") && lines[2].contains("0.50"));
        assert!(lines[3].contains("<float64>") && lines[3].contains("<int64>"));
    }
}
