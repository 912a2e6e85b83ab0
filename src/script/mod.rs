//! Unique-script selection.
//!
//! A script is a (transcript, narration audio) pair sharing a file stem.
//! Selection prefers stems never consumed before, falling back to random
//! reuse once the pool is cycled through; the selector never blocks on an
//! exhausted pool, only on an empty one.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::media::files_with_extension;
use crate::ui::prelude::*;

#[derive(Debug, Clone)]
pub struct ScriptAsset {
    pub stem: String,
    pub transcript: PathBuf,
    pub audio: PathBuf,
}

/// Stems of all files with `extension` in `dir`, sorted for determinism.
pub fn scan_stems(dir: &Path, extension: &str) -> PipelineResult<Vec<String>> {
    let files = files_with_extension(dir, extension)?;
    Ok(files
        .iter()
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()))
        .map(String::from)
        .collect())
}

/// Pick a stem from `pool` that is not in `used`, reusing a random one
/// when everything has been consumed. An empty pool is unrecoverable.
pub fn select_stem<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[String],
    used: &HashSet<String>,
) -> PipelineResult<String> {
    if pool.is_empty() {
        return Err(PipelineError::NotFound("script pool is empty".into()));
    }

    let unused: Vec<&String> = pool.iter().filter(|stem| !used.contains(*stem)).collect();
    let candidates = if unused.is_empty() {
        emit(
            Level::Warn,
            "script.pool.exhausted",
            "every script has been used at least once; reusing a random one",
            None,
        );
        pool.iter().collect()
    } else {
        unused
    };

    candidates
        .choose(rng)
        .map(|stem| (*stem).clone())
        .ok_or_else(|| PipelineError::NotFound("script pool is empty".into()))
}

/// Locate both halves of the chosen script. A missing half is pruned
/// from composition by erroring out, distinct from an empty pool.
pub fn resolve_script(
    captions_dir: &Path,
    audio_dir: &Path,
    stem: &str,
) -> PipelineResult<ScriptAsset> {
    let transcript = captions_dir.join(format!("{stem}.json"));
    let audio = audio_dir.join(format!("{stem}.wav"));

    if !transcript.exists() {
        return Err(PipelineError::NotFound(format!(
            "script '{stem}' has no transcript at {}",
            transcript.display()
        )));
    }
    if !audio.exists() {
        return Err(PipelineError::NotFound(format!(
            "script '{stem}' has no narration audio at {}",
            audio.display()
        )));
    }

    Ok(ScriptAsset {
        stem: stem.to_string(),
        transcript,
        audio,
    })
}
