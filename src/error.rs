//! Error kinds surfaced by the normalization-and-load pipeline.
//!
//! Row-level problems that have a defined default (text, integer, float,
//! and the TYPE/COST_TYPE categorical pair) are recovered in place and
//! reported as warnings, never as errors. The variants here cover the
//! conditions that change a file's disposition.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file could not be read, decoded, or contained no data lines.
    /// Fatal for that file.
    #[error("Malformed input {path:?}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    /// A data row carries fewer columns than the schema declares. The row
    /// is dropped with a warning; this variant renders the warning text.
    #[error("Row {row}: expected at least {expected} column(s) but found {found}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A field without a defined default failed to parse. Fatal for the
    /// batch; no partial load.
    #[error("Row {row} field '{field}': cannot coerce '{value}' to {target}")]
    TypeCoercion {
        row: usize,
        field: String,
        value: String,
        target: String,
    },

    /// The persistent store rejected table creation or an insert. Always
    /// surfaced to the caller, never retried.
    #[error("Persistent store error: {0}")]
    Persistence(#[from] rusqlite::Error),
}
