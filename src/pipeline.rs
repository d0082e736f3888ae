use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::format;
use crate::io::excel_read::WorkbookReader;
use crate::io::excel_write;
use crate::merge;
use crate::settings::Settings;

/// Summary of a successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileReport {
    /// Path of the formatted workbook.
    pub output: PathBuf,
    /// Sheets that contributed rows, in output order.
    pub sheets: Vec<String>,
    /// Number of data rows written.
    pub rows: usize,
}

/// Reads the data tabs of `source`, concatenates them and writes the
/// formatted result into `destination`.
///
/// The workbook is built under a staging name inside `destination` and only
/// renamed over the output once formatting succeeds, so a failed run never
/// touches the output of a previous one.
#[instrument(
    level = "info",
    skip_all,
    fields(source = %source.display(), destination = %destination.display())
)]
pub fn compile_workbook(
    source: &Path,
    destination: &Path,
    settings: &Settings,
) -> Result<CompileReport> {
    if !source.is_file() {
        return Err(ToolError::MissingInput(source.to_path_buf()));
    }
    if !destination.is_dir() {
        return Err(ToolError::MissingDestination(destination.to_path_buf()));
    }

    let mut reader = WorkbookReader::open(source)?;
    let names = reader.sheet_names();
    let data_sheets = merge::filter_data_sheets(&names, &settings.exclusions);
    debug!(?names, ?data_sheets, "sheets selected");
    if data_sheets.is_empty() {
        return Err(ToolError::NoDataSheets(source.to_path_buf()));
    }

    let sheets = data_sheets
        .iter()
        .map(|name| reader.read_sheet(name))
        .collect::<Result<Vec<_>>>()?;
    let table = merge::concatenate(&sheets, &settings.output_sheet_name)?;
    info!(rows = table.rows.len(), sheets = sheets.len(), "sheets concatenated");

    let output = settings.output_path(destination);
    let staging = staging_path(&output);
    let written = excel_write::write_table(&staging, &table)
        .and_then(|()| format::format_workbook(&staging, &settings.author_credit))
        .and_then(|()| fs::rename(&staging, &output).map_err(ToolError::from));
    if let Err(error) = written {
        discard_partial_output(&staging);
        return Err(error);
    }

    info!(output = %output.display(), "compiled workbook written");
    Ok(CompileReport {
        output,
        sheets: data_sheets,
        rows: table.rows.len(),
    })
}

/// Hidden sibling of `output` that holds the workbook while it is built.
pub fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

fn discard_partial_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => debug!(output = %output.display(), "partial workbook removed"),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            warn!(output = %output.display(), %error, "could not remove partial workbook")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_file_sits_next_to_the_output() {
        let output = Path::new("out").join("AJ_is_Mean.xlsx");
        assert_eq!(
            staging_path(&output),
            Path::new("out").join(".AJ_is_Mean.xlsx.partial")
        );
    }
}
