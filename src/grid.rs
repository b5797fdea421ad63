//! Tabular loader: reads a raw delimited file into an untyped row/column
//! grid of strings.
//!
//! The first line of every export is a header whose content is never
//! trusted; it is consumed and discarded, and field binding happens
//! positionally in the normalizer. No type or shape validation occurs here.

use std::path::Path;

use encoding_rs::Encoding;
use log::debug;

use crate::{error::PipelineError, io_utils};

/// Untyped rows as read from the file, header line already skipped.
#[derive(Debug, Clone)]
pub struct RawGrid {
    rows: Vec<Vec<String>>,
}

impl RawGrid {
    /// Builds a grid directly from in-memory rows. Intended for tests and
    /// callers that already hold parsed data.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads `path` into a [`RawGrid`], honoring quoting and embedded-delimiter
/// rules. Fails with [`PipelineError::MalformedInput`] if the file cannot be
/// opened, cannot be decoded, or contains no data lines after the header.
pub fn load(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawGrid, PipelineError> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter, true).map_err(|err| {
        PipelineError::MalformedInput {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|err| PipelineError::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("reading row {}: {err}", row_idx + 2),
        })?;
        let decoded =
            io_utils::decode_record(&record, encoding).map_err(|err| {
                PipelineError::MalformedInput {
                    path: path.to_path_buf(),
                    reason: format!("decoding row {}: {err}", row_idx + 2),
                }
            })?;
        rows.push(decoded);
    }

    if rows.is_empty() {
        return Err(PipelineError::MalformedInput {
            path: path.to_path_buf(),
            reason: "no data rows after header".to_string(),
        });
    }

    debug!(
        "Read {} data row(s) from {:?} using delimiter '{}'",
        rows.len(),
        path,
        io_utils::printable_delimiter(delimiter)
    );
    Ok(RawGrid { rows })
}
