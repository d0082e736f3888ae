//! Presentation pass applied to a compiled workbook.
//!
//! The xlsx writer cannot edit a package in place, so formatting re-reads
//! every sheet of the workbook and writes it back out with styles attached.

use std::path::Path;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet,
};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::io::excel_read;
use crate::io::excel_write::write_cell;
use crate::model::RawSheet;

/// Name of the credit sheet appended to every formatted workbook.
pub const AUTHOR_SHEET: &str = "Author";

/// Widths of columns A through U as stored in the package, where one unit
/// is one maximum digit width of the default font.
pub const COLUMN_WIDTHS: [f64; 21] = [
    14.72, 12.72, 17.47, 12.86, 10.29, 9.58, 9.58, 8.72, 8.72, 8.72, 9.15, 10.29, 10.29, 10.29,
    10.72, 10.72, 10.72, 10.72, 10.72, 10.72, 10.72,
];

/// Sheets whose power columns are shown with two decimals.
pub const BAND_SHEETS: [&str; 9] = [
    "Wi-Fi 2.4 GHz",
    "Wi-Fi 5.2 GHz",
    "Wi-Fi 5.3 GHz",
    "Wi-Fi 5.5 GHz",
    "Wi-Fi 5.8 GHz",
    "U-NII 5",
    "U-NII 6",
    "U-NII 7",
    "U-NII 8",
];

/// Number formats are applied down to this row (zero-based, exclusive),
/// i.e. to spreadsheet rows 2 through 10000.
pub const NUMBER_FORMAT_ROWS: u32 = 10_000;

const HEADER_FILL: u32 = 0x538DD5;
const MAX_DIGIT_WIDTH_PX: f64 = 7.0;
const FONT_NAME: &str = "Arial";
const FONT_SIZE: f64 = 8.0;
const CREDIT_FONT_SIZE: f64 = 72.0;

/// Display precision of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberFormat {
    OneDecimal,
    TwoDecimal,
    ThreeDecimal,
}

impl NumberFormat {
    /// Excel number format code.
    pub fn pattern(self) -> &'static str {
        match self {
            NumberFormat::OneDecimal => "0.0",
            NumberFormat::TwoDecimal => "0.00",
            NumberFormat::ThreeDecimal => "0.000",
        }
    }

    fn index(self) -> usize {
        match self {
            NumberFormat::OneDecimal => 0,
            NumberFormat::TwoDecimal => 1,
            NumberFormat::ThreeDecimal => 2,
        }
    }
}

/// Extent of the populated part of a sheet, anchored at A1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsedRange {
    pub rows: u32,
    pub columns: u16,
}

impl UsedRange {
    fn of(sheet: &RawSheet) -> Self {
        Self {
            rows: sheet.used_rows() as u32,
            columns: sheet.used_columns() as u16,
        }
    }

    fn contains(&self, row: u32, col: u16) -> bool {
        row < self.rows && col < self.columns
    }
}

/// Style attached to a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Bold, filled header cell.
    Header,
    /// Bordered body cell, with the column's number format if it has one.
    Body(Option<NumberFormat>),
    /// Bare number format on a cell outside the used range.
    Number(NumberFormat),
}

/// Returns `true` for the Wi-Fi and U-NII band sheets.
pub fn is_band_sheet(sheet: &str) -> bool {
    BAND_SHEETS.contains(&sheet)
}

/// Number format of a zero-based cell position, if any.
///
/// Columns L-M carry the measured and maximum power, N-U the SAR and APD
/// values.
pub fn number_format(sheet: &str, row: u32, col: u16) -> Option<NumberFormat> {
    if row == 0 || row >= NUMBER_FORMAT_ROWS {
        return None;
    }
    match col {
        11 | 12 if is_band_sheet(sheet) => Some(NumberFormat::TwoDecimal),
        11 | 12 => Some(NumberFormat::OneDecimal),
        13..=20 => Some(NumberFormat::ThreeDecimal),
        _ => None,
    }
}

/// Decides the style of a zero-based cell position.
pub fn cell_style(sheet: &str, row: u32, col: u16, used: UsedRange) -> Option<CellStyle> {
    let inside = used.contains(row, col);
    if inside && row == 0 {
        return Some(CellStyle::Header);
    }

    let number = number_format(sheet, row, col);
    if inside {
        Some(CellStyle::Body(number))
    } else {
        number.map(CellStyle::Number)
    }
}

/// Converts a stored column width into the pixel width the writer expects.
///
/// `set_column_width` adds the cell padding on top of the value it is given,
/// so stored widths go through pixels to land on the same `<col>` width.
pub fn column_width_pixels(width: f64) -> u16 {
    (width * MAX_DIGIT_WIDTH_PX).round() as u16
}

struct StyleSheet {
    header: Format,
    body: Format,
    body_numbers: [Format; 3],
    numbers: [Format; 3],
}

impl StyleSheet {
    fn new() -> Self {
        let body = Format::new()
            .set_font_name(FONT_NAME)
            .set_font_size(FONT_SIZE)
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap();

        let header = body
            .clone()
            .set_bold()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(HEADER_FILL));

        let all = [
            NumberFormat::OneDecimal,
            NumberFormat::TwoDecimal,
            NumberFormat::ThreeDecimal,
        ];

        Self {
            body_numbers: all.map(|number| body.clone().set_num_format(number.pattern())),
            numbers: all.map(|number| Format::new().set_num_format(number.pattern())),
            header,
            body,
        }
    }

    fn format(&self, style: CellStyle) -> &Format {
        match style {
            CellStyle::Header => &self.header,
            CellStyle::Body(None) => &self.body,
            CellStyle::Body(Some(number)) => &self.body_numbers[number.index()],
            CellStyle::Number(number) => &self.numbers[number.index()],
        }
    }
}

/// Re-opens the workbook at `path`, styles every sheet, appends the
/// [`AUTHOR_SHEET`] credit and saves over the same file.
///
/// An existing credit sheet is replaced rather than duplicated.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn format_workbook(path: &Path, author_credit: &str) -> Result<()> {
    let sheets = excel_read::read_workbook(path)?;
    let styles = StyleSheet::new();
    let mut workbook = Workbook::new();

    for sheet in sheets.iter().filter(|sheet| sheet.name != AUTHOR_SHEET) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        format_sheet(worksheet, sheet, &styles)?;
        debug!(sheet = %sheet.name, "sheet formatted");
    }

    let credit = Format::new()
        .set_font_name(FONT_NAME)
        .set_font_size(CREDIT_FONT_SIZE);
    let author = workbook.add_worksheet();
    author.set_name(AUTHOR_SHEET)?;
    author.write_string_with_format(0, 0, author_credit, &credit)?;

    workbook.save(path)?;
    Ok(())
}

fn format_sheet(worksheet: &mut Worksheet, sheet: &RawSheet, styles: &StyleSheet) -> Result<()> {
    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width_pixels(col as u16, column_width_pixels(*width))?;
    }

    let used = UsedRange::of(sheet);
    let rows = used.rows.max(NUMBER_FORMAT_ROWS);
    let columns = used.columns.max(COLUMN_WIDTHS.len() as u16);

    for row in 0..rows {
        for col in 0..columns {
            let style = cell_style(&sheet.name, row, col, used);
            write_cell(
                worksheet,
                row,
                col,
                sheet.cell(row as usize, col as usize),
                style.map(|style| styles.format(style)),
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const USED: UsedRange = UsedRange {
        rows: 5,
        columns: 21,
    };

    #[test]
    fn band_sheets_show_two_decimals_on_power_columns() {
        for col in [11, 12] {
            assert_eq!(
                cell_style("Wi-Fi 2.4 GHz", 1, col, USED),
                Some(CellStyle::Body(Some(NumberFormat::TwoDecimal)))
            );
            assert_eq!(
                cell_style("LTE", 1, col, USED),
                Some(CellStyle::Body(Some(NumberFormat::OneDecimal)))
            );
        }
    }

    #[test]
    fn sar_columns_always_show_three_decimals() {
        for sheet in ["Wi-Fi 2.4 GHz", "LTE", "AJ is Mean"] {
            for col in 13..=20 {
                assert_eq!(
                    number_format(sheet, 4, col),
                    Some(NumberFormat::ThreeDecimal)
                );
            }
        }
        assert_eq!(NumberFormat::ThreeDecimal.pattern(), "0.000");
    }

    #[test]
    fn header_row_gets_header_style_only_inside_used_range() {
        assert_eq!(cell_style("LTE", 0, 12, USED), Some(CellStyle::Header));
        assert_eq!(cell_style("LTE", 0, 25, USED), None);
    }

    #[test]
    fn number_formats_extend_past_the_data() {
        assert_eq!(
            cell_style("LTE", 9_999, 11, USED),
            Some(CellStyle::Number(NumberFormat::OneDecimal))
        );
        assert_eq!(cell_style("LTE", 10_000, 11, USED), None);
        assert_eq!(cell_style("LTE", 200, 3, USED), None);
    }

    #[test]
    fn body_cells_without_number_format_are_still_bordered() {
        assert_eq!(cell_style("LTE", 2, 0, USED), Some(CellStyle::Body(None)));
        assert_eq!(number_format("LTE", 2, 10), None);
    }

    #[test]
    fn column_widths_convert_to_whole_pixels() {
        assert_eq!(column_width_pixels(14.72), 103);
        assert_eq!(column_width_pixels(8.72), 61);
        assert_eq!(column_width_pixels(10.29), 72);
    }
}
