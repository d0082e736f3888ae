//! Sheet selection and concatenation of the Reported Results data tabs.

use std::collections::HashMap;

use crate::error::{Result, ToolError};
use crate::model::{CellValue, RawSheet, SheetTable};

/// Column inserted in front of every row, holding the source sheet name.
pub const TECHNOLOGY_COLUMN: &str = "Technology";

/// Literal that marks a header row repeated inside the data.
pub const DUPLICATE_HEADER_MARKER: &str = "Antenna";

/// Columns checked for [`DUPLICATE_HEADER_MARKER`], in order of preference.
const GUARD_COLUMNS: [&str; 2] = ["Antenna", "Antenna(s)"];

/// Exact column order of the compiled table.
pub const COLUMN_PROJECTION: [&str; 21] = [
    TECHNOLOGY_COLUMN,
    "Antenna(s)",
    "RF Exposure Condition",
    "Mode(s)",
    "Power Mode(s)",
    "Dist. (mm)",
    "Test Position(s)",
    "Channel",
    "Freq. (MHz)",
    "RB Allocation",
    "RB Offset",
    "Max Output Pwr (dBm)",
    "Meas. (dBm)",
    "1-g Meas. (W/kg)",
    "1-g Scaled (W/kg)",
    "8-g Meas. (W/kg)",
    "8-g Scaled (W/kg)",
    "10-g Meas. (W/kg)",
    "10-g Scaled (W/kg)",
    "APD Meas. (W/m2)",
    "APD Scaled (W/m2)",
];

/// Selects the sheets that carry measurement data.
///
/// The sheet at position `i` is only compared against the first `i + 1`
/// exclusion entries, so an excluded name sitting earlier in the workbook
/// than its place in `exclusions` is kept.
pub fn filter_data_sheets(names: &[String], exclusions: &[String]) -> Vec<String> {
    names
        .iter()
        .enumerate()
        .filter(|(position, name)| {
            let prefix = &exclusions[..exclusions.len().min(position + 1)];
            !prefix.contains(*name)
        })
        .map(|(_, name)| name.clone())
        .collect()
}

/// Concatenates the data sheets into one table named `sheet_name`.
///
/// Each sheet contributes its rows in order, tagged with the sheet name in
/// the [`TECHNOLOGY_COLUMN`] and projected onto [`COLUMN_PROJECTION`].
pub fn concatenate(sheets: &[RawSheet], sheet_name: &str) -> Result<SheetTable> {
    let mut rows = Vec::new();
    for sheet in sheets {
        rows.extend(project_sheet(sheet)?);
    }

    Ok(SheetTable {
        sheet_name: sheet_name.to_string(),
        columns: COLUMN_PROJECTION.iter().map(|column| column.to_string()).collect(),
        rows,
    })
}

/// Projects one sheet onto [`COLUMN_PROJECTION`], dropping blank rows and
/// repeated header rows.
pub fn project_sheet(sheet: &RawSheet) -> Result<Vec<Vec<CellValue>>> {
    let mut body = sheet
        .cells
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()));

    let Some(header_row) = body.next() else {
        return Err(ToolError::InvalidWorkbook(format!(
            "sheet '{}' has no header row",
            sheet.name
        )));
    };

    let header = index_header(header_row);
    let sources = COLUMN_PROJECTION
        .iter()
        .skip(1)
        .map(|column| {
            header
                .get(*column)
                .copied()
                .ok_or_else(|| ToolError::SchemaMismatch {
                    sheet: sheet.name.clone(),
                    column: column.to_string(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let guard = GUARD_COLUMNS
        .iter()
        .find_map(|column| header.get(*column).copied());

    let rows = body
        .filter(|row| !is_repeated_header(row, guard))
        .map(|row| {
            let mut projected = Vec::with_capacity(COLUMN_PROJECTION.len());
            projected.push(CellValue::Text(sheet.name.clone()));
            projected.extend(
                sources
                    .iter()
                    .map(|index| row.get(*index).cloned().unwrap_or_default()),
            );
            projected
        })
        .collect();

    Ok(rows)
}

fn index_header(row: &[CellValue]) -> HashMap<String, usize> {
    let mut header = HashMap::new();
    for (index, cell) in row.iter().enumerate() {
        let label = cell.to_label();
        if !label.is_empty() {
            header.entry(label).or_insert(index);
        }
    }
    header
}

fn is_repeated_header(row: &[CellValue], guard: Option<usize>) -> bool {
    guard
        .and_then(|index| row.get(index))
        .and_then(CellValue::as_text)
        .is_some_and(|value| value.trim() == DUPLICATE_HEADER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn exclusions() -> Vec<String> {
        names(&["Section 1 Summary", "NFC", "Author"])
    }

    fn header() -> Vec<CellValue> {
        COLUMN_PROJECTION[1..]
            .iter()
            .map(|column| CellValue::from(*column))
            .collect()
    }

    fn data_row(antenna: &str, base: f64) -> Vec<CellValue> {
        let mut row = vec![CellValue::from(antenna)];
        for offset in 1..COLUMN_PROJECTION.len() - 1 {
            row.push(CellValue::Number(base + offset as f64));
        }
        row
    }

    #[test]
    fn summary_tabs_are_skipped() {
        let sheets = names(&["Section 1 Summary", "NFC", "LTE", "Wi-Fi 2.4 GHz"]);
        assert_eq!(
            filter_data_sheets(&sheets, &exclusions()),
            names(&["LTE", "Wi-Fi 2.4 GHz"])
        );
    }

    #[test]
    fn exclusion_is_positional() {
        // "NFC" in first position is only compared with "Section 1 Summary".
        let sheets = names(&["NFC", "Section 1 Summary", "LTE", "Author"]);
        assert_eq!(
            filter_data_sheets(&sheets, &exclusions()),
            names(&["NFC", "LTE"])
        );
    }

    #[test]
    fn short_workbooks_use_truncated_prefix() {
        let sheets = names(&["Section 1 Summary"]);
        assert!(filter_data_sheets(&sheets, &exclusions()).is_empty());
        let sheets = names(&["LTE", "NFC"]);
        assert_eq!(filter_data_sheets(&sheets, &exclusions()), names(&["LTE"]));
    }

    #[test]
    fn rows_are_tagged_and_projected() {
        let sheet = RawSheet {
            name: "LTE".into(),
            cells: vec![header(), data_row("Ant 1", 0.0), data_row("Ant 2", 10.0)],
        };
        let table = concatenate(&[sheet], "AJ is Mean").expect("concatenated");

        assert_eq!(table.columns, COLUMN_PROJECTION.to_vec());
        assert_eq!(table.rows.len(), 2);
        assert!(
            table
                .column_values(TECHNOLOGY_COLUMN)
                .all(|cell| cell == &CellValue::from("LTE"))
        );
        assert_eq!(table.rows[1][1], CellValue::from("Ant 2"));
        assert_eq!(table.rows[1][2], CellValue::Number(11.0));
    }

    #[test]
    fn repeated_headers_and_blank_rows_are_dropped() {
        let mut with_guard = header();
        with_guard.push(CellValue::from("Antenna"));
        let mut repeated = data_row("Ant 1", 0.0);
        repeated.push(CellValue::from("Antenna"));
        let mut kept = data_row("Ant 2", 0.0);
        kept.push(CellValue::from("Main"));

        let sheet = RawSheet {
            name: "NR".into(),
            cells: vec![
                with_guard,
                repeated,
                vec![CellValue::Empty; 3],
                kept,
            ],
        };
        let rows = project_sheet(&sheet).expect("projected");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], CellValue::from("Ant 2"));
    }

    #[test]
    fn antenna_column_guards_when_no_dedicated_column() {
        let sheet = RawSheet {
            name: "LTE".into(),
            cells: vec![header(), data_row("Antenna", 0.0), data_row("Ant 1", 0.0)],
        };
        assert_eq!(project_sheet(&sheet).expect("projected").len(), 1);
    }

    #[test]
    fn extra_and_reordered_columns_are_ignored() {
        let mut columns = header();
        columns.reverse();
        columns.insert(3, CellValue::from("Notes"));
        let mut row: Vec<CellValue> = data_row("Ant 1", 0.0);
        row.reverse();
        row.insert(3, CellValue::from("ignore me"));

        let sheet = RawSheet {
            name: "LTE".into(),
            cells: vec![columns, row],
        };
        let rows = project_sheet(&sheet).expect("projected");
        assert_eq!(rows[0], {
            let mut expected = vec![CellValue::from("LTE")];
            expected.extend(data_row("Ant 1", 0.0));
            expected
        });
    }

    #[test]
    fn missing_column_names_sheet_and_column() {
        let columns: Vec<CellValue> = header()
            .into_iter()
            .filter(|cell| cell != &CellValue::from("RB Offset"))
            .collect();
        let sheet = RawSheet {
            name: "Wi-Fi 2.4 GHz".into(),
            cells: vec![columns],
        };
        match project_sheet(&sheet) {
            Err(ToolError::SchemaMismatch { sheet, column }) => {
                assert_eq!(sheet, "Wi-Fi 2.4 GHz");
                assert_eq!(column, "RB Offset");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
