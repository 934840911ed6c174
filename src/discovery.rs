use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::GcBenchError;

const CSV_EXTENSION: &str = "csv";

pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == CSV_EXTENSION)
}

/// CSV files directly inside `dir`, sorted. A missing directory has none.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>, GcBenchError> {
    list_files(dir, |path| is_csv(path))
}

/// CSV files in `dir` whose file name contains `fragment`, sorted.
pub fn find_csv_matching(dir: &Path, fragment: &str) -> Result<Vec<PathBuf>, GcBenchError> {
    list_files(dir, |path| {
        is_csv(path)
            && path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(fragment))
    })
}

/// Deletes every CSV directly inside `dir` and returns how many were removed.
pub fn remove_stale_csvs(dir: &Path) -> Result<usize, GcBenchError> {
    let stale = list_csv_files(dir)?;
    for path in &stale {
        fs::remove_file(path)
            .map_err(|e| GcBenchError::io(format!("unable to delete {}: {e}", path.display())))?;
        debug!(path = %path.display(), "removed stale csv");
    }
    Ok(stale.len())
}

/// File names in `dir` that contain `needle` and end with `suffix`, sorted.
pub fn list_names_matching(dir: &Path, needle: &str, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(needle) && name.ends_with(suffix))
        .collect();
    names.sort();
    names
}

fn list_files<F>(dir: &Path, keep: F) -> Result<Vec<PathBuf>, GcBenchError>
where
    F: Fn(&Path) -> bool,
{
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)
        .map_err(|e| GcBenchError::io(format!("unable to read {}: {e}", dir.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| GcBenchError::io(e.to_string()))?;
        let path = entry.path();
        if path.is_file() && keep(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
