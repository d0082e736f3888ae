use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the failures that can occur while compiling a
/// Reported Results workbook.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the settings file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a data sheet lacks one of the projected columns.
    #[error("sheet '{sheet}' is missing required column '{column}'")]
    SchemaMismatch { sheet: String, column: String },

    /// Raised when every sheet of the source workbook was excluded.
    #[error("no data sheets left to compile in {0}")]
    NoDataSheets(PathBuf),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the destination folder does not exist.
    #[error("destination directory not found: {0}")]
    MissingDestination(PathBuf),

    /// Raised when the pipeline worker is gone before a request is sent.
    #[error("pipeline worker is not running")]
    WorkerUnavailable,

    /// Raised when the pipeline panicked inside the worker.
    #[error("pipeline aborted unexpectedly: {0}")]
    Panicked(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Coarse classification reported to the user when a run fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source could not be read or the destination could not be written.
    IoFailure,
    /// A data sheet does not carry the projected columns.
    SchemaMismatch,
    /// Anything else.
    Unhandled,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::IoFailure => write!(f, "I/O failure"),
            FailureKind::SchemaMismatch => write!(f, "schema mismatch"),
            FailureKind::Unhandled => write!(f, "unhandled error"),
        }
    }
}

impl ToolError {
    /// Maps the error onto the user-facing failure taxonomy.
    pub fn kind(&self) -> FailureKind {
        match self {
            ToolError::Io(_)
            | ToolError::ExcelRead(_)
            | ToolError::ExcelWrite(_)
            | ToolError::MissingInput(_)
            | ToolError::MissingDestination(_) => FailureKind::IoFailure,
            ToolError::SchemaMismatch { .. } => FailureKind::SchemaMismatch,
            ToolError::Json(_)
            | ToolError::InvalidWorkbook(_)
            | ToolError::NoDataSheets(_)
            | ToolError::WorkerUnavailable
            | ToolError::Panicked(_)
            | ToolError::Logging(_) => FailureKind::Unhandled,
        }
    }

    /// Renders the error together with every underlying cause, one per line.
    /// Causes already spelled out by the message above them are skipped.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut shown = report.clone();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !shown.contains(&text) {
                report.push_str("\n  caused by: ");
                report.push_str(&text);
            }
            shown = text;
            source = cause.source();
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let missing = ToolError::SchemaMismatch {
            sheet: "LTE".into(),
            column: "RB Offset".into(),
        };
        assert_eq!(missing.kind(), FailureKind::SchemaMismatch);
        assert_eq!(
            ToolError::MissingDestination(PathBuf::from("out")).kind(),
            FailureKind::IoFailure
        );
        assert_eq!(
            ToolError::NoDataSheets(PathBuf::from("in.xlsx")).kind(),
            FailureKind::Unhandled
        );
    }

    #[test]
    fn report_does_not_repeat_wrapped_message() {
        let error = ToolError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "locked",
        ));
        assert_eq!(error.report(), "I/O error: locked");
    }

    #[derive(Debug, Error)]
    #[error("sheet stream truncated")]
    struct Truncated(#[source] std::io::Error);

    #[test]
    fn report_includes_distinct_causes() {
        let inner = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "zip ended early");
        let error = ToolError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            Truncated(inner),
        ));
        assert_eq!(
            error.report(),
            "I/O error: sheet stream truncated\n  caused by: zip ended early"
        );
    }
}
