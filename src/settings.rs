use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

/// File name of the compiled workbook inside the destination folder.
pub const DEFAULT_OUTPUT_FILE: &str = "AJ_is_Mean.xlsx";
/// Name of the single data sheet of the compiled workbook.
pub const DEFAULT_OUTPUT_SHEET: &str = "AJ is Mean";
/// Credit written to the author sheet.
pub const DEFAULT_AUTHOR_CREDIT: &str = "Brought to you by: AJ Newcomer";
/// Error log written next to the working directory.
pub const DEFAULT_ERROR_LOG: &str = "error.log";
/// Leading summary tabs that never hold measurement data.
pub const DEFAULT_EXCLUSIONS: [&str; 3] = ["Section 1 Summary", "NFC", "Author"];

/// Runtime configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sheet names dropped by the positional exclusion rule.
    pub exclusions: Vec<String>,
    /// File name of the compiled workbook.
    pub output_file_name: String,
    /// Data sheet name of the compiled workbook.
    pub output_sheet_name: String,
    /// Text of the author sheet.
    pub author_credit: String,
    /// Destination of the error log.
    pub error_log: PathBuf,
    /// Console log level, used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|name| name.to_string()).collect(),
            output_file_name: DEFAULT_OUTPUT_FILE.to_string(),
            output_sheet_name: DEFAULT_OUTPUT_SHEET.to_string(),
            author_credit: DEFAULT_AUTHOR_CREDIT.to_string(),
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file, falling back to defaults for absent
    /// keys.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Path of the compiled workbook inside `destination`.
    pub fn output_path(&self, destination: &Path) -> PathBuf {
        destination.join(&self.output_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "log_level": "debug" }"#).expect("settings parsed");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.output_file_name, DEFAULT_OUTPUT_FILE);
        assert_eq!(settings.exclusions.len(), 3);
    }

    #[test]
    fn output_path_joins_destination() {
        let settings = Settings::default();
        assert_eq!(
            settings.output_path(Path::new("out")),
            Path::new("out").join("AJ_is_Mean.xlsx")
        );
    }
}
