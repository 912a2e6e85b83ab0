//! Append-only ledgers of consumed identifiers.
//!
//! One line-oriented UTF-8 file per category, first line the header
//! token. The on-disk record is the sole source of dedup truth at run
//! start; in-memory reads are cached per run and invalidated by the
//! next append.

use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

/// Header line written to every new ledger and links file; dropped on read.
pub const HEADER_TOKEN: &str = "video_id";

pub struct LedgerStore {
    dir: PathBuf,
    cache: HashMap<String, HashSet<String>>,
}

impl LedgerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: HashMap::new(),
        }
    }

    fn file_path(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{category}.csv"))
    }

    /// All identifiers recorded for `category`, loaded once per run.
    /// A missing file is an empty ledger; an unreadable one aborts the run.
    pub fn all(&mut self, category: &str) -> PipelineResult<&HashSet<String>> {
        if !self.cache.contains_key(category) {
            let ids = read_id_file(&self.file_path(category))?;
            self.cache.insert(category.to_string(), ids);
        }
        Ok(&self.cache[category])
    }

    /// Append identifiers to the category's ledger, creating the file
    /// with a header line on first use. The category's cache entry is
    /// invalidated so the next read reflects the on-disk record.
    pub fn record(&mut self, category: &str, ids: &[String]) -> PipelineResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let path = self.file_path(category);
        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))?;
        if !path.exists() {
            fs::write(&path, format!("{HEADER_TOKEN}\n")).map_err(|e| PipelineError::io(&path, e))?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| PipelineError::io(&path, e))?;
        for id in ids {
            writeln!(file, "{id}").map_err(|e| PipelineError::io(&path, e))?;
        }

        self.cache.remove(category);
        Ok(())
    }
}

/// Read a line-oriented identifier file, dropping blanks and the header
/// token. Missing files read as empty; I/O or encoding failures are
/// fatal rather than silently treated as empty.
pub fn read_id_file(path: &Path) -> PipelineResult<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != HEADER_TOKEN)
        .map(String::from)
        .collect())
}

/// Create `path` seeded with the header token if it does not exist yet.
pub fn seed_id_file(path: &Path) -> PipelineResult<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    fs::write(path, format!("{HEADER_TOKEN}\n")).map_err(|e| PipelineError::io(path, e))
}

/// Identifiers requested but not yet consumed. Pure set subtraction with
/// the header token excluded from both sides; iteration order is
/// unspecified.
pub fn pending(requested: &HashSet<String>, consumed: &HashSet<String>) -> HashSet<String> {
    requested
        .iter()
        .filter(|id| id.as_str() != HEADER_TOKEN && !consumed.contains(*id))
        .cloned()
        .collect()
}
