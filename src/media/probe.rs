//! Clip metadata probing through ffprobe.
//!
//! Probing spawns a process per file, so results are cached by path for
//! the lifetime of the run and the cache is drained when the run ends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipMeta {
    pub duration: f64,
    pub width: u32,
}

/// Metadata source for the assembler. The production implementation is
/// [`FfprobeCache`]; tests supply fixed metadata.
pub trait ClipProber {
    fn probe(&mut self, path: &Path) -> PipelineResult<ClipMeta>;
}

#[derive(Default)]
pub struct FfprobeCache {
    cache: HashMap<PathBuf, ClipMeta>,
}

impl FfprobeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release all cached entries. Must run before the process exits so
    /// a long-lived host does not accumulate stale metadata.
    pub fn drain(&mut self) {
        self.cache.clear();
    }
}

impl ClipProber for FfprobeCache {
    fn probe(&mut self, path: &Path) -> PipelineResult<ClipMeta> {
        if let Some(meta) = self.cache.get(path) {
            return Ok(*meta);
        }
        let meta = ffprobe_clip(path)?;
        self.cache.insert(path.to_path_buf(), meta);
        Ok(meta)
    }
}

/// Width of the first video stream plus container duration, in one
/// ffprobe invocation.
fn ffprobe_clip(path: &Path) -> PipelineResult<ClipMeta> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| PipelineError::tool("ffprobe", format!("{}: {e}", path.display())))?;

    if !output.status.success() {
        return Err(PipelineError::tool(
            "ffprobe",
            format!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut width = None;
    let mut duration = None;
    for line in stdout.lines() {
        if let Some(value) = line.strip_prefix("width=") {
            width = value.trim().parse::<u32>().ok();
        } else if let Some(value) = line.strip_prefix("duration=") {
            duration = value.trim().parse::<f64>().ok();
        }
    }

    match (width, duration) {
        (Some(width), Some(duration)) => Ok(ClipMeta { duration, width }),
        _ => Err(PipelineError::tool(
            "ffprobe",
            format!("{}: missing width/duration in output", path.display()),
        )),
    }
}

/// Container duration of an audio file in seconds.
pub fn probe_audio_duration(path: &Path) -> PipelineResult<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| PipelineError::tool("ffprobe", format!("{}: {e}", path.display())))?;

    if !output.status.success() {
        return Err(PipelineError::tool(
            "ffprobe",
            format!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .trim()
        .parse::<f64>()
        .map_err(|e| {
            PipelineError::tool(
                "ffprobe",
                format!("{}: unparseable duration: {e}", path.display()),
            )
        })
}
