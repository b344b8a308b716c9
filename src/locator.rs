//! Discovery of input files under a data root.

use crate::error::EtlError;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Extension shared by song files and activity logs.
pub const DATA_FILE_EXTENSION: &str = "json";

/// Recursively lists regular files under `root` whose extension matches
/// `extension`, ignoring case.
///
/// Returned paths are absolute and sorted, so repeated runs over the same tree
/// visit files in the same order. Any walk error fails the whole discovery.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, EtlError> {
    let discovery_failure = |reason: String| EtlError::DiscoveryFailure {
        path: root.to_path_buf(),
        reason,
    };

    if !root.exists() {
        return Err(discovery_failure("path does not exist".to_string()));
    }
    if !root.is_dir() {
        return Err(discovery_failure("not a directory".to_string()));
    }
    let root = root
        .canonicalize()
        .map_err(|e| discovery_failure(e.to_string()))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|e| discovery_failure(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();

    debug!("Found {} .{} files under {:?}", files.len(), extension, root);
    Ok(files)
}
