// src/parse/mod.rs

pub mod rows;
pub mod sections;

pub use rows::{parse_table, ParsedTable, RejectReason, RowOutcome, ScanStats};
pub use sections::{split_sections, Section, PART_I_MARKER};

use thiserror::Error;

/// Structural failures that abort the whole parse. Cell-level and line-level
/// anomalies never land here; the classifier absorbs those as
/// [`RejectReason`]s and the materializer maps bad numerics to NULL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The document does not contain the PART-I section marker at all, so it
    /// is not the expected TDS certificate export format.
    #[error("section marker `^PART-I - Details of Tax Deducted at Source^` not found; document is not a PART-I TDS export")]
    MissingMarker,

    /// No line containing the `Sr. No.` header token was found in any
    /// section; the document cannot be interpreted as a table.
    #[error("no header row containing `Sr. No.` found in any section")]
    MissingHeader,
}
