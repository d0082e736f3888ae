use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::Timelike;
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{CellValue, RawSheet};

/// An opened `.xlsx` workbook that hands out sheets by name.
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl WorkbookReader {
    /// Opens the workbook at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let workbook: Xlsx<_> = open_workbook(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// Reads one sheet into a grid anchored at A1, without trailing blank rows
    /// or trailing blank cells.
    pub fn read_sheet(&mut self, name: &str) -> Result<RawSheet> {
        let range = self
            .workbook
            .worksheet_range(name)
            .ok_or_else(|| {
                ToolError::InvalidWorkbook(format!(
                    "missing sheet '{name}' in {}",
                    self.path.display()
                ))
            })?
            .map_err(ToolError::from)?;

        let sheet = range_to_sheet(name, &range);
        debug!(sheet = name, rows = sheet.cells.len(), "sheet read");
        Ok(sheet)
    }

    /// Reads every sheet in workbook order.
    pub fn read_all(&mut self) -> Result<Vec<RawSheet>> {
        self.sheet_names()
            .iter()
            .map(|name| self.read_sheet(name))
            .collect()
    }
}

/// Convenience wrapper that opens `path` and reads every sheet.
pub fn read_workbook(path: &Path) -> Result<Vec<RawSheet>> {
    WorkbookReader::open(path)?.read_all()
}

fn range_to_sheet(name: &str, range: &calamine::Range<DataType>) -> RawSheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut cells: Vec<Vec<CellValue>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut values = vec![CellValue::Empty; col_offset];
        values.extend(row.iter().map(cell_value));
        let width = values
            .iter()
            .rposition(|cell| !cell.is_empty())
            .map_or(0, |last| last + 1);
        values.truncate(width);
        cells.push(values);
    }

    let mut sheet = RawSheet {
        name: name.to_string(),
        cells,
    };
    sheet.cells.truncate(sheet.used_rows());
    sheet
}

fn cell_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) if value.is_empty() => CellValue::Empty,
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Float(value) => CellValue::Number(*value),
        DataType::Int(value) => CellValue::Number(*value as f64),
        DataType::Bool(value) => CellValue::Bool(*value),
        DataType::Empty => CellValue::Empty,
        DataType::DateTime(_) | DataType::DateTimeIso(_) => match cell.as_datetime() {
            Some(datetime) if datetime.num_seconds_from_midnight() == 0 => {
                CellValue::Text(datetime.format("%Y-%m-%d").to_string())
            }
            Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Text(cell.to_string()),
        },
        DataType::Duration(_) => match cell.as_duration() {
            Some(duration) => CellValue::Text(format!(
                "{}:{:02}:{:02}",
                duration.num_hours(),
                duration.num_minutes() % 60,
                duration.num_seconds() % 60
            )),
            None => CellValue::Text(cell.to_string()),
        },
        other => CellValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_stay_numeric() {
        assert_eq!(cell_value(&DataType::Int(3)), CellValue::Number(3.0));
        assert_eq!(cell_value(&DataType::Float(0.25)), CellValue::Number(0.25));
        assert_eq!(cell_value(&DataType::String(String::new())), CellValue::Empty);
        assert_eq!(
            cell_value(&DataType::String("Antenna".into())),
            CellValue::Text("Antenna".into())
        );
    }

    #[test]
    fn date_cells_become_calendar_text() {
        assert_eq!(
            cell_value(&DataType::DateTime(45047.0)),
            CellValue::Text("2023-05-01".into())
        );
        assert_eq!(
            cell_value(&DataType::DateTime(45047.5)),
            CellValue::Text("2023-05-01 12:00:00".into())
        );
        assert_eq!(
            cell_value(&DataType::DateTimeIso("2023-05-01T08:30:00".into())),
            CellValue::Text("2023-05-01 08:30:00".into())
        );
        assert_eq!(
            cell_value(&DataType::Duration(1.5)),
            CellValue::Text("36:00:00".into())
        );
    }
}
