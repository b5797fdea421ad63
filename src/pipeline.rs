//! Per-file orchestration: load, normalize, probe for duplicates, and
//! conditionally append, returning a disposition for the file.

use std::path::Path;

use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    error::PipelineError,
    grid,
    normalize::{self, RowWarning},
    schema::ImportSchema,
    store::Store,
};

/// What happened to one file.
#[derive(Debug, Clone)]
pub enum Disposition {
    Loaded { batch_id: String, rows: usize },
    SkippedDuplicate { existing_batch_id: String },
    Rejected { reason: String },
}

impl Disposition {
    pub fn report(&self) -> String {
        match self {
            Disposition::Loaded { batch_id, rows } => {
                format!("loaded {rows} row(s) under batch {batch_id}")
            }
            Disposition::SkippedDuplicate { existing_batch_id } => {
                format!("skipped — duplicate of batch {existing_batch_id}")
            }
            Disposition::Rejected { reason } => format!("rejected — {reason}"),
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub disposition: Disposition,
    pub warnings: Vec<RowWarning>,
}

/// Processes one file start to finish. Input and batch problems become a
/// [`Disposition::Rejected`]; store problems propagate as errors because the
/// run cannot meaningfully continue without the store.
pub fn process_file(
    path: &Path,
    schema: &ImportSchema,
    store: &mut Store,
    batch_id: &str,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Outcome, PipelineError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let grid = match grid::load(path, delimiter, encoding) {
        Ok(grid) => grid,
        Err(err @ PipelineError::MalformedInput { .. }) => {
            return Ok(Outcome {
                disposition: Disposition::Rejected {
                    reason: err.to_string(),
                },
                warnings: Vec::new(),
            });
        }
        Err(err) => return Err(err),
    };

    let batch = match normalize::normalize(&grid, schema, batch_id, &file_name) {
        Ok(batch) => batch,
        Err(err @ PipelineError::TypeCoercion { .. }) => {
            return Ok(Outcome {
                disposition: Disposition::Rejected {
                    reason: err.to_string(),
                },
                warnings: Vec::new(),
            });
        }
        Err(err) => return Err(err),
    };

    for warning in batch.warnings() {
        warn!("{file_name} row {}: {}", warning.row, warning.message);
    }

    // The duplicate probe queries the target table, so it must exist before
    // the first run against a fresh database.
    store.ensure_table(schema)?;

    if batch.is_empty() {
        info!("{file_name}: no loadable rows after filtering");
        return Ok(Outcome {
            disposition: Disposition::Loaded {
                batch_id: batch_id.to_string(),
                rows: 0,
            },
            warnings: batch.warnings().to_vec(),
        });
    }

    if let Some(existing) = store.find_existing_batch(schema, &batch)? {
        info!("{file_name}: content already loaded under batch {existing}");
        return Ok(Outcome {
            disposition: Disposition::SkippedDuplicate {
                existing_batch_id: existing,
            },
            warnings: batch.warnings().to_vec(),
        });
    }

    let rows = store.append(schema, &batch)?;
    Ok(Outcome {
        disposition: Disposition::Loaded {
            batch_id: batch_id.to_string(),
            rows,
        },
        warnings: batch.warnings().to_vec(),
    })
}
