mod common;

use encoding_rs::UTF_8;
use timesheet_loader::data::Value;
use timesheet_loader::error::PipelineError;
use timesheet_loader::grid::{self, RawGrid};
use timesheet_loader::normalize::normalize;
use timesheet_loader::schema::ImportSchema;

use common::{TestWorkspace, baseline_row};

fn base_cells() -> Vec<String> {
    vec![
        "E100", "1", "2.0", "8.0", "2024-01-05", "J100", "P1", "LAB", "", "", "", "1", "1", "",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[test]
fn row_missing_required_key_is_filtered_not_errored() {
    let mut missing_emp = base_cells();
    missing_emp[0] = String::new();
    let grid = RawGrid::from_rows(vec![base_cells(), missing_emp, base_cells()]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert_eq!(batch.len(), 2);
}

#[test]
fn extra_trailing_columns_are_truncated_to_registry_width() {
    let mut wide = base_cells();
    wide.push("stray".to_string());
    wide.push("trailing".to_string());
    let grid = RawGrid::from_rows(vec![wide]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.rows()[0].len(), schema.field_count());
    assert_eq!(batch.batch_id(), "B1");
    assert_eq!(batch.source_file(), "hours.csv");
}

#[test]
fn short_row_with_data_is_dropped_with_warning() {
    let short: Vec<String> = vec!["E100".to_string(), "1".to_string()];
    let grid = RawGrid::from_rows(vec![base_cells(), short]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.warnings().len(), 1);
    assert_eq!(batch.warnings()[0].row, 3);
}

#[test]
fn missing_type_defaults_to_one_and_missing_hours_to_zero_float() {
    let mut cells = base_cells();
    cells[1] = String::new(); // TYPE
    cells[3] = String::new(); // HOURS
    let grid = RawGrid::from_rows(vec![cells]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    let row = &batch.rows()[0];
    assert_eq!(row[1], Some(Value::Integer(1)));
    assert_eq!(row[3], Some(Value::Float(0.0)));
}

#[test]
fn blank_categoricals_and_equipment_fields_normalize_per_policy() {
    // EMP present, TYPE is a lone space, equipment columns blank.
    let cells: Vec<String> = vec![
        "Alice", " ", "10", "8", "2024-01-05", "J1", "P1", "", "", "", "", "", "", "",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
    let grid = RawGrid::from_rows(vec![cells]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert_eq!(batch.len(), 1);
    let row = &batch.rows()[0];
    assert_eq!(row[1], Some(Value::Integer(1))); // TYPE
    assert_eq!(row[12], Some(Value::Integer(1))); // COST_TYPE
    assert_eq!(row[8], Some(Value::Text(String::new()))); // EQUIP_NUM
    assert_eq!(row[13], None); // EQ_DATE is nullable
}

#[test]
fn text_fields_are_stripped_of_surrounding_whitespace() {
    let mut cells = base_cells();
    cells[0] = "  E100  ".to_string();
    cells[7] = "\tLAB ".to_string();
    let grid = RawGrid::from_rows(vec![cells]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    let row = &batch.rows()[0];
    assert_eq!(row[0], Some(Value::Text("E100".to_string())));
    assert_eq!(row[7], Some(Value::Text("LAB".to_string())));
}

#[test]
fn unparseable_date_fails_the_whole_batch() {
    let mut bad_date = base_cells();
    bad_date[4] = "2024-13-99".to_string();
    let grid = RawGrid::from_rows(vec![base_cells(), bad_date]);
    let schema = ImportSchema::timesheet();
    let err = normalize(&grid, &schema, "B1", "hours.csv").unwrap_err();
    assert!(matches!(err, PipelineError::TypeCoercion { .. }));
}

#[test]
fn unparseable_eq_date_also_fails_the_batch() {
    let mut bad = base_cells();
    bad[13] = "soon".to_string();
    let grid = RawGrid::from_rows(vec![bad]);
    let schema = ImportSchema::timesheet();
    let err = normalize(&grid, &schema, "B1", "hours.csv").unwrap_err();
    assert!(matches!(err, PipelineError::TypeCoercion { .. }));
}

#[test]
fn file_of_only_unloadable_rows_yields_a_legally_empty_batch() {
    let mut no_job = base_cells();
    no_job[5] = String::new();
    let mut no_phase = base_cells();
    no_phase[6] = "   ".to_string();
    let grid = RawGrid::from_rows(vec![no_job, no_phase]);
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert!(batch.is_empty());
}

#[test]
fn loaded_grid_normalizes_end_to_end() {
    let ws = TestWorkspace::new();
    let path = ws.write_timesheet("hours.csv", &[&baseline_row()]);
    let grid = grid::load(&path, None, UTF_8).expect("load");
    let schema = ImportSchema::timesheet();
    let batch = normalize(&grid, &schema, "B1", "hours.csv").expect("normalize");
    assert_eq!(batch.len(), 1);
    let row = &batch.rows()[0];
    assert_eq!(row[0], Some(Value::Text("E100".to_string())));
    assert!(matches!(row[4], Some(Value::Date(_))));
    assert_eq!(row[10], Some(Value::Float(0.0))); // EQUIP_HRS blank -> 0.0
}
