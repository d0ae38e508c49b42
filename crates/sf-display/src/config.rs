use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::DisplayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    #[default]
    Terminal,
    Markdown,
}

/// Rendering options, passed to every render call.
///
/// Missing fields take their defaults when deserializing, so a partial JSON
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub type_show: bool,
    /// Carried for compatibility; output is always plain text.
    pub type_color: bool,
    pub type_delimiter_left: String,
    pub type_delimiter_right: String,
    /// Digits after the decimal point for floats; `None` prints the shortest
    /// round-tripping form.
    pub value_format_float_positional: Option<usize>,
    pub value_format_complex_positional: Option<usize>,
    pub display_format: DisplayFormat,
    pub display_columns: usize,
    pub display_rows: usize,
    pub cell_max_width: usize,
    pub cell_max_width_leftmost: usize,
    pub cell_align_left: bool,
    pub include_index: bool,
    pub include_columns: bool,
    pub include_name: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            type_show: true,
            type_color: true,
            type_delimiter_left: "<".to_owned(),
            type_delimiter_right: ">".to_owned(),
            value_format_float_positional: None,
            value_format_complex_positional: None,
            display_format: DisplayFormat::Terminal,
            display_columns: 12,
            display_rows: 36,
            cell_max_width: 20,
            cell_max_width_leftmost: 36,
            cell_align_left: true,
            include_index: true,
            include_columns: true,
            include_name: true,
        }
    }
}

impl DisplayConfig {
    pub fn from_json(json: &str) -> Result<Self, DisplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DisplayError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DisplayError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DisplayError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// The configuration for a transposed view: row and column limits swap.
    #[must_use]
    pub fn to_transpose(&self) -> Self {
        Self {
            display_rows: self.display_columns,
            display_columns: self.display_rows,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_type_show(mut self, show: bool) -> Self {
        self.type_show = show;
        self
    }

    #[must_use]
    pub fn with_type_color(mut self, color: bool) -> Self {
        self.type_color = color;
        self
    }

    #[must_use]
    pub fn with_type_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.type_delimiter_left = left.into();
        self.type_delimiter_right = right.into();
        self
    }

    #[must_use]
    pub fn with_float_precision(mut self, digits: Option<usize>) -> Self {
        self.value_format_float_positional = digits;
        self
    }

    #[must_use]
    pub fn with_complex_precision(mut self, digits: Option<usize>) -> Self {
        self.value_format_complex_positional = digits;
        self
    }

    #[must_use]
    pub fn with_display_format(mut self, format: DisplayFormat) -> Self {
        self.display_format = format;
        self
    }

    #[must_use]
    pub fn with_display_columns(mut self, columns: usize) -> Self {
        self.display_columns = columns;
        self
    }

    #[must_use]
    pub fn with_display_rows(mut self, rows: usize) -> Self {
        self.display_rows = rows;
        self
    }

    #[must_use]
    pub fn with_cell_max_width(mut self, width: usize) -> Self {
        self.cell_max_width = width;
        self
    }

    #[must_use]
    pub fn with_cell_max_width_leftmost(mut self, width: usize) -> Self {
        self.cell_max_width_leftmost = width;
        self
    }

    #[must_use]
    pub fn with_cell_align_left(mut self, left: bool) -> Self {
        self.cell_align_left = left;
        self
    }

    #[must_use]
    pub fn with_include_index(mut self, include: bool) -> Self {
        self.include_index = include;
        self
    }

    #[must_use]
    pub fn with_include_columns(mut self, include: bool) -> Self {
        self.include_columns = include;
        self
    }

    #[must_use]
    pub fn with_include_name(mut self, include: bool) -> Self {
        self.include_name = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayConfig, DisplayFormat};

    #[test]
    fn partial_json_fills_defaults() {
        let config = DisplayConfig::from_json(r#"{"display_rows": 4, "display_format": "markdown"}"#)
            .expect("parse");
        assert_eq!(config.display_rows, 4);
        assert_eq!(config.display_format, DisplayFormat::Markdown);
        assert_eq!(config.cell_max_width, 20);
        assert!(config.type_show);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("display.json");
        let config = DisplayConfig::default()
            .with_display_columns(3)
            .with_float_precision(Some(2))
            .with_type_delimiters("[", "]");
        config.write(&path).expect("write");
        let loaded = DisplayConfig::from_file(&path).expect("read");
        assert_eq!(loaded, config);
    }

    #[test]
    fn transpose_swaps_limits() {
        let config = DisplayConfig::default().to_transpose();
        assert_eq!((config.display_rows, config.display_columns), (12, 36));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(DisplayConfig::from_json("{").is_err());
    }
}
