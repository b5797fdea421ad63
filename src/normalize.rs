//! Normalizer: turns an untyped [`RawGrid`] into a schema-conformant
//! [`NormalizedBatch`] through five ordered sub-steps.
//!
//! 1. Column truncation — keep the first N columns, N = registry size;
//!    short rows with actual data are dropped with a warning.
//! 2. Required-row filter — rows missing any required key are filtered,
//!    never errored; an all-filtered file is a legally empty batch.
//! 3. Header assignment — registry names bind to columns by position,
//!    realized as index-based access against the registry order.
//! 4. Whitespace normalization — every text-typed cell is trimmed.
//! 5. Type coercion and null policy — per type tag, with the TYPE/COST_TYPE
//!    categorical rule applied last; batch-tracking fields are attached at
//!    the batch level.
//!
//! Coercion failures on defaultable fields are recovered locally and
//! reported as warnings. A non-defaultable failure (an unparseable date)
//! fails the whole batch: no partial load.

use crate::{
    data::{Value, parse_typed_value},
    error::PipelineError,
    grid::RawGrid,
    schema::{FieldDef, FieldType, ImportSchema},
};

/// Recovered row-level issue, reported alongside the batch.
#[derive(Debug, Clone)]
pub struct RowWarning {
    /// 1-based line number in the source file (header is line 1).
    pub row: usize,
    pub message: String,
}

/// Immutable output of the normalizer. Downstream components only read it.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    batch_id: String,
    source_file: String,
    rows: Vec<Vec<Option<Value>>>,
    warnings: Vec<RowWarning>,
}

impl NormalizedBatch {
    pub fn batch_id(&self) -> &str {
        &self.batch_id
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Business-field cells in registry order. `None` occurs only for
    /// nullable fields.
    pub fn rows(&self) -> &[Vec<Option<Value>>] {
        &self.rows
    }

    pub fn first_row(&self) -> Option<&[Option<Value>]> {
        self.rows.first().map(|row| row.as_slice())
    }

    pub fn warnings(&self) -> &[RowWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Runs the five sub-steps against `grid` and attaches the batch-tracking
/// fields. `batch_id` is an externally supplied correlation token shared by
/// every row of the batch; content uniqueness is the duplicate checker's
/// concern, not this function's.
pub fn normalize(
    grid: &RawGrid,
    schema: &ImportSchema,
    batch_id: &str,
    source_file: &str,
) -> Result<NormalizedBatch, PipelineError> {
    let mut warnings = Vec::new();

    let truncated = truncate_columns(grid, schema.field_count(), &mut warnings);
    let filtered = filter_required(truncated, &schema.required_indexes());

    let mut rows = Vec::with_capacity(filtered.len());
    for (line, cells) in filtered {
        rows.push(coerce_row(&cells, schema, line, &mut warnings)?);
    }

    Ok(NormalizedBatch {
        batch_id: batch_id.to_string(),
        source_file: source_file.to_string(),
        rows,
        warnings,
    })
}

/// Sub-step 1. Keeps the first `width` columns of every row, dropping the
/// stray trailing columns common in exports with extra delimiters. Rows that
/// are entirely empty are discarded silently; rows with data but too few
/// columns are dropped with a warning. Returns rows tagged with their
/// 1-based source line number.
fn truncate_columns(
    grid: &RawGrid,
    width: usize,
    warnings: &mut Vec<RowWarning>,
) -> Vec<(usize, Vec<String>)> {
    let mut kept = Vec::with_capacity(grid.len());
    for (idx, cells) in grid.rows().iter().enumerate() {
        let line = idx + 2;
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if cells.len() < width {
            warnings.push(RowWarning {
                row: line,
                message: PipelineError::SchemaMismatch {
                    row: line,
                    expected: width,
                    found: cells.len(),
                }
                .to_string(),
            });
            continue;
        }
        kept.push((line, cells[..width].to_vec()));
    }
    kept
}

/// Sub-step 2. Retains only rows where every required-key field is
/// non-empty. A filter, not an error.
fn filter_required(
    rows: Vec<(usize, Vec<String>)>,
    required: &[usize],
) -> Vec<(usize, Vec<String>)> {
    rows.into_iter()
        .filter(|(_, cells)| {
            required
                .iter()
                .all(|&idx| cells.get(idx).is_some_and(|cell| !cell.trim().is_empty()))
        })
        .collect()
}

/// Sub-steps 3-5. Registry names bind to cells by position (the loop index
/// is the header assignment); text cells are trimmed; types are coerced
/// with the per-tag null policy and the TYPE/COST_TYPE categorical rule.
fn coerce_row(
    cells: &[String],
    schema: &ImportSchema,
    line: usize,
    warnings: &mut Vec<RowWarning>,
) -> Result<Vec<Option<Value>>, PipelineError> {
    let mut values = Vec::with_capacity(schema.field_count());
    for (idx, field) in schema.fields.iter().enumerate() {
        let raw = cells.get(idx).map(|cell| cell.trim()).unwrap_or("");
        values.push(coerce_field(raw, field, line, warnings)?);
    }
    Ok(values)
}

fn coerce_field(
    raw: &str,
    field: &FieldDef,
    line: usize,
    warnings: &mut Vec<RowWarning>,
) -> Result<Option<Value>, PipelineError> {
    // Categorical business rule for exactly two fields: force into
    // {valid integer, default 1} regardless of the declared type tag.
    if field.default_one {
        return Ok(Some(match raw.parse::<i64>() {
            Ok(value) => Value::Integer(value),
            Err(_) => {
                if !raw.is_empty() {
                    warnings.push(RowWarning {
                        row: line,
                        message: format!(
                            "field '{}': '{}' is not a whole number, defaulting to 1",
                            field.name, raw
                        ),
                    });
                }
                Value::Integer(1)
            }
        }));
    }

    match parse_typed_value(raw, field.datatype) {
        Ok(Some(value)) => Ok(Some(value)),
        Ok(None) => Ok(default_for(field, line, raw)?),
        Err(err) => match field.datatype {
            // Defaultable tags recover locally with a warning.
            FieldType::Text => Ok(Some(Value::Text(raw.to_string()))),
            FieldType::Integer => {
                warnings.push(RowWarning {
                    row: line,
                    message: format!("field '{}': {err:#}, defaulting to 0", field.name),
                });
                Ok(Some(Value::Integer(0)))
            }
            FieldType::Float => {
                warnings.push(RowWarning {
                    row: line,
                    message: format!("field '{}': {err:#}, defaulting to 0", field.name),
                });
                Ok(Some(Value::Float(0.0)))
            }
            // No default is defined for dates: fatal for the batch.
            FieldType::Date => Err(PipelineError::TypeCoercion {
                row: line,
                field: field.name.clone(),
                value: raw.to_string(),
                target: field.datatype.as_str().to_string(),
            }),
        },
    }
}

fn default_for(
    field: &FieldDef,
    line: usize,
    raw: &str,
) -> Result<Option<Value>, PipelineError> {
    match field.datatype {
        FieldType::Text => Ok(Some(Value::Text(String::new()))),
        FieldType::Integer => Ok(Some(Value::Integer(0))),
        FieldType::Float => Ok(Some(Value::Float(0.0))),
        FieldType::Date => {
            if field.nullable {
                Ok(None)
            } else {
                Err(PipelineError::TypeCoercion {
                    row: line,
                    field: field.name.clone(),
                    value: raw.to_string(),
                    target: field.datatype.as_str().to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ImportSchema {
        ImportSchema::timesheet()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn truncate_drops_short_rows_with_warning_and_blank_rows_silently() {
        let grid = RawGrid::from_rows(vec![
            row(&["a", "b", "c"]),
            row(&["", " ", ""]),
            row(&["a", "b", "c", "d", "e"]),
        ]);
        let mut warnings = Vec::new();
        let kept = truncate_columns(&grid, 4, &mut warnings);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, 4);
        assert_eq!(kept[0].1.len(), 4);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 2);
    }

    #[test]
    fn filter_required_is_not_an_error_for_fully_filtered_input() {
        let rows = vec![(2, row(&["", "x"])), (3, row(&[" ", "y"]))];
        let kept = filter_required(rows, &[0]);
        assert!(kept.is_empty());
    }

    #[test]
    fn coerce_field_defaults_categoricals_to_one() {
        let schema = schema();
        let type_field = &schema.fields[1];
        let mut warnings = Vec::new();

        let blank = coerce_field("", type_field, 2, &mut warnings).unwrap();
        assert_eq!(blank, Some(Value::Integer(1)));
        assert!(warnings.is_empty());

        let junk = coerce_field("2.5", type_field, 2, &mut warnings).unwrap();
        assert_eq!(junk, Some(Value::Integer(1)));
        assert_eq!(warnings.len(), 1);

        let valid = coerce_field("7", type_field, 2, &mut warnings).unwrap();
        assert_eq!(valid, Some(Value::Integer(7)));
    }

    #[test]
    fn coerce_field_recovers_numeric_junk_with_warning() {
        let schema = schema();
        let hours = &schema.fields[3];
        let mut warnings = Vec::new();
        let value = coerce_field("n/a", hours, 5, &mut warnings).unwrap();
        assert_eq!(value, Some(Value::Float(0.0)));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].row, 5);
    }

    #[test]
    fn coerce_field_fails_batch_on_unparseable_required_date() {
        let schema = schema();
        let date = &schema.fields[4];
        let mut warnings = Vec::new();
        let err = coerce_field("not-a-date", date, 3, &mut warnings).unwrap_err();
        assert!(matches!(err, PipelineError::TypeCoercion { .. }));
    }

    #[test]
    fn coerce_field_nulls_empty_nullable_date() {
        let schema = schema();
        let eq_date = &schema.fields[13];
        let mut warnings = Vec::new();
        let value = coerce_field("", eq_date, 3, &mut warnings).unwrap();
        assert_eq!(value, None);
    }
}
