/// A single cell value as it travels from the source workbook to the
/// compiled one. Numbers stay numeric so display formats apply to them.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    /// No value.
    #[default]
    Empty,
    /// Text literal, including dates and error cells rendered as text.
    Text(String),
    /// Numeric literal.
    Number(f64),
    /// Boolean literal.
    Bool(bool),
}

impl CellValue {
    /// Returns `true` when the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Renders the cell the way it is used in headers and lookups.
    pub fn to_label(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(value) => value.trim().to_string(),
            CellValue::Number(value) => value.to_string(),
            CellValue::Bool(value) => value.to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// A worksheet as read back from disk. `cells[0][0]` is always cell A1,
/// whatever offset the stored range started at.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub cells: Vec<Vec<CellValue>>,
}

impl RawSheet {
    /// Number of rows up to and including the last non-empty one.
    pub fn used_rows(&self) -> usize {
        self.cells
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(0, |last| last + 1)
    }

    /// Number of columns up to and including the right-most non-empty cell.
    pub fn used_columns(&self) -> usize {
        self.cells
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_empty()))
            .max()
            .map_or(0, |last| last + 1)
    }

    /// Returns the cell at the given zero-based position.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.cells
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(EMPTY)
    }
}

/// A headed table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Iterates over the values of the named column.
    pub fn column_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a CellValue> + 'a {
        let index = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| index.and_then(|index| row.get(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_extent_ignores_trailing_blanks() {
        let sheet = RawSheet {
            name: "LTE".into(),
            cells: vec![
                vec!["a".into(), CellValue::Empty],
                vec![CellValue::Empty, CellValue::Number(1.5), CellValue::Empty],
                vec![CellValue::Empty; 4],
            ],
        };
        assert_eq!(sheet.used_rows(), 2);
        assert_eq!(sheet.used_columns(), 2);
        assert_eq!(sheet.cell(9, 9), &CellValue::Empty);
    }
}
