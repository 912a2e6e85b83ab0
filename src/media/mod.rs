pub mod probe;
pub mod wav;

use std::collections::HashSet;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// File stems present in a directory. Used to verify downloader output
/// and to derive used-sets from already-rendered assets.
pub fn stem_set(dir: &Path) -> PipelineResult<HashSet<String>> {
    let mut stems = HashSet::new();
    if !dir.exists() {
        return Ok(stems);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.insert(stem.to_string());
        }
    }
    Ok(stems)
}

/// Files in a directory carrying the given extension, sorted by name for
/// deterministic pool order under a seeded rng.
pub fn files_with_extension(dir: &Path, extension: &str) -> PipelineResult<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
