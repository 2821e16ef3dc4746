//! Artifact path resolution with glob pattern support.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// List files matching a glob pattern, sorted by path.
pub fn matching_files(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = glob::glob(pattern)
        .map_err(|e| {
            Error::validation_invalid_argument(
                "artifact_pattern",
                format!("Invalid glob pattern '{}': {}", pattern, e),
                Some(pattern.to_string()),
            )
        })?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();

    entries.sort();
    Ok(entries)
}

/// Resolve a glob pattern that must match exactly one file.
///
/// Zero or multiple matches are an error; an ambiguous artifact is never
/// picked silently.
pub fn resolve_single_match(pattern: &str) -> Result<PathBuf> {
    let mut entries = matching_files(pattern)?;

    if entries.len() != 1 {
        let matches = entries
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        return Err(Error::archive_count(pattern, matches));
    }

    let path = entries.remove(0);
    log_status!("package", "Resolved '{}' -> '{}'", pattern, path.display());
    Ok(path)
}
