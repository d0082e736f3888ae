use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::model::{CellValue, SheetTable};

/// Writes the table to a single-sheet workbook at `path`, header first and
/// without an index column. An existing file is overwritten.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell, None)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes one value, optionally styled. Empty cells are only emitted when a
/// format has to be attached to them.
pub(crate) fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    match (cell, format) {
        (CellValue::Empty, None) => {}
        (CellValue::Empty, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (CellValue::Text(value), None) => {
            worksheet.write_string(row, col, value)?;
        }
        (CellValue::Text(value), Some(format)) => {
            worksheet.write_string_with_format(row, col, value, format)?;
        }
        (CellValue::Number(value), None) => {
            worksheet.write_number(row, col, *value)?;
        }
        (CellValue::Number(value), Some(format)) => {
            worksheet.write_number_with_format(row, col, *value, format)?;
        }
        (CellValue::Bool(value), None) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        (CellValue::Bool(value), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *value, format)?;
        }
    }
    Ok(())
}
