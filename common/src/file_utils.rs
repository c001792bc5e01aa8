//! File discovery for asset folders.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Background image extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Model file extensions.
pub const MODEL_EXTENSIONS: &[&str] = &["obj", "3ds"];

/// Recursively collects files under `dir` whose extension matches one of
/// `extensions` (case-insensitive). Hidden entries are skipped.
///
/// The result is sorted so that repeated runs enumerate assets in the same
/// order. Failing to open `dir` itself is an error, unreadable subdirectories
/// are logged and skipped.
pub fn find_files(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut result = Vec::new();
    collect(dir, extensions, &mut result)?;
    result.sort();

    Ok(result)
}

fn collect(dir: &Path, extensions: &[&str], result: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            if let Err(err) = collect(&path, extensions, result) {
                log::warn!("Skipping directory {}: {}", path.display(), err);
            }
        } else if has_extension(&path, extensions) {
            result.push(path);
        }
    }

    Ok(())
}

/// Returns true when the file extension of `path` is in `extensions`,
/// ignoring ASCII case.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}
