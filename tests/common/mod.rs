#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const TIMESHEET_HEADER: &str =
    "EMP,TYPE,UNITS,HOURS,DATE,JOB,PHASE,CAT,EQUIP_NUM,EQUIP_CODE,EQUIP_HRS,WORK_TYPE,COST_TYPE,EQ_DATE";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a timesheet CSV with the standard header and the given data
    /// lines, and returns the path.
    pub fn write_timesheet(&self, name: &str, data_lines: &[&str]) -> PathBuf {
        let mut contents = String::from(TIMESHEET_HEADER);
        contents.push('\n');
        for line in data_lines {
            contents.push_str(line);
            contents.push('\n');
        }
        self.write(name, &contents)
    }
}

/// A complete, well-formed data line: 14 positional fields.
pub fn baseline_row() -> String {
    "E100,1,2.0,8.0,2024-01-05,J100,P1,LAB,,,,1,1,".to_string()
}
