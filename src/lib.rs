//! Core library for the Reported Results compiler.
//!
//! The compiler merges the measurement tabs of a Reported Results workbook
//! into one formatted sheet. IO adapters live under [`io`], the cell and
//! table representations in [`model`], sheet selection and concatenation in
//! [`merge`], the presentation pass in [`format`], and the orchestration in
//! [`pipeline`]. The interactive form is in [`shell`].

pub mod error;
pub mod format;
pub mod io;
pub mod logging;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod settings;
pub mod shell;

pub use error::{FailureKind, Result, ToolError};
