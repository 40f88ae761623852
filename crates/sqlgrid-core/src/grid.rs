//! String grids holding query results.

use std::fmt;

use rusqlite::types::ValueRef;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Result of a query as a matrix of strings.
///
/// Row 0 holds the column names whenever the query returned at least one
/// row. A query without rows yields an empty grid with no header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultGrid {
    cells: Vec<Vec<String>>,
}

impl ResultGrid {
    /// Builds a grid from column names and data rows. The header is dropped
    /// when there are no data rows.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let mut cells = Vec::with_capacity(rows.len() + 1);
        cells.push(columns);
        cells.extend(rows);
        Self { cells }
    }

    /// Column names, or an empty slice for an empty grid.
    pub fn columns(&self) -> &[String] {
        self.cells.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Data rows, header excluded.
    pub fn rows(&self) -> &[Vec<String>] {
        self.cells.get(1..).unwrap_or_default()
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value at a data row (0-based, header excluded) and column.
    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows()
            .get(row)
            .and_then(|values| values.get(column))
            .map(String::as_str)
    }

    /// Value at a data row in the column with the given name.
    pub fn get_by_name(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns().iter().position(|name| name == column)?;
        self.get(row, index)
    }

    /// The raw matrix, header row first.
    pub fn into_inner(self) -> Vec<Vec<String>> {
        self.cells
    }

    /// Iterates over data rows.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<String>> {
        self.rows().iter()
    }
}

impl From<ResultGrid> for Vec<Vec<String>> {
    fn from(grid: ResultGrid) -> Self {
        grid.into_inner()
    }
}

impl<'a> IntoIterator for &'a ResultGrid {
    type Item = &'a Vec<String>;
    type IntoIter = std::slice::Iter<'a, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for ResultGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResultGrid", 2)?;
        state.serialize_field("columns", self.columns())?;
        state.serialize_field("rows", self.rows())?;
        state.end()
    }
}

/// Renders the grid as a markdown table.
impl fmt::Display for ResultGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "_No rows_");
        }

        let columns = self.columns();
        write_row(f, columns)?;
        write!(f, "|")?;
        for _ in columns {
            write!(f, " --- |")?;
        }
        writeln!(f)?;
        for row in self.rows() {
            write_row(f, row)?;
        }
        Ok(())
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[String]) -> fmt::Result {
    write!(f, "|")?;
    for cell in cells {
        write!(f, " {} |", escape_cell(cell))?;
    }
    writeln!(f)
}

// Keep a cell on one table line without closing the column early.
fn escape_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
}

/// Renders a single engine value as text.
///
/// NULL becomes the empty string, integers are printed in decimal, reals
/// always carry a decimal point or exponent, and blobs are decoded as lossy
/// UTF-8.
pub fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => render_real(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn render_real(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{text}.0")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultGrid {
        ResultGrid::from_parts(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec!["1".to_string(), "alpha".to_string()],
                vec!["2".to_string(), "beta".to_string()],
            ],
        )
    }

    #[test]
    fn test_header_is_row_zero() {
        let grid = sample();
        assert_eq!(grid.columns(), ["id", "name"]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.get(1, 1), Some("beta"));
        assert_eq!(grid.get_by_name(0, "name"), Some("alpha"));
        assert_eq!(grid.get(2, 0), None);

        let raw = grid.into_inner();
        assert_eq!(raw[0], vec!["id", "name"]);
        assert_eq!(raw.len(), 3);
    }

    #[test]
    fn test_no_rows_means_no_header() {
        let grid = ResultGrid::from_parts(vec!["id".to_string()], Vec::new());
        assert!(grid.is_empty());
        assert!(grid.columns().is_empty());
        assert!(grid.rows().is_empty());
        assert_eq!(grid.row_count(), 0);
        assert_eq!(grid.to_string(), "_No rows_\n");
    }

    #[test]
    fn test_markdown_rendering() {
        let grid = ResultGrid::from_parts(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["x|y".to_string(), "line\nbreak".to_string()]],
        );
        assert_eq!(
            grid.to_string(),
            "| a | b |\n| --- | --- |\n| x\\|y | line break |\n"
        );
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(sample()).expect("grid should serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "columns": ["id", "name"],
                "rows": [["1", "alpha"], ["2", "beta"]],
            })
        );
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(ValueRef::Null), "");
        assert_eq!(render_value(ValueRef::Integer(-7)), "-7");
        assert_eq!(render_value(ValueRef::Real(1.0)), "1.0");
        assert_eq!(render_value(ValueRef::Real(2.5)), "2.5");
        assert_eq!(render_value(ValueRef::Text(b"hello")), "hello");
        assert_eq!(render_value(ValueRef::Blob(b"raw")), "raw");
    }
}
