//! Drop-folder helpers: discovering candidate files by extension and
//! relocating processed files into success/failure folders.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::info;

/// Non-recursive scan of `folder` for files with the given extension
/// (case-insensitive, no leading dot). Results are sorted for a
/// deterministic processing order.
pub fn find_files(folder: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    info!("Looking for *.{extension} in {}", folder.display());
    let mut matches = Vec::new();
    let entries =
        fs::read_dir(folder).with_context(|| format!("Reading drop folder {folder:?}"))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Reading entry in {folder:?}"))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matched = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matched {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}

/// Moves `file` into `destination_dir`, creating the directory if needed.
/// Falls back to copy-and-remove when a rename crosses filesystems.
pub fn move_to_folder(file: &Path, destination_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(destination_dir)
        .with_context(|| format!("Creating destination folder {destination_dir:?}"))?;
    let file_name = file
        .file_name()
        .with_context(|| format!("Path {file:?} has no file name"))?;
    let destination = destination_dir.join(file_name);
    if fs::rename(file, &destination).is_err() {
        fs::copy(file, &destination)
            .with_context(|| format!("Copying {file:?} to {destination:?}"))?;
        fs::remove_file(file).with_context(|| format!("Removing {file:?} after copy"))?;
    }
    Ok(destination)
}

/// Splits a path into (directory, file stem, extension without the dot).
pub fn split_path(path: &Path) -> (PathBuf, String, String) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, stem, extension)
}
