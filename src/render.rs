//! Final composition through ffmpeg.
//!
//! The planned clips are concatenated with the concat demuxer, the ASS
//! caption track is burned in, and the narration audio is muxed on top.
//! Output duration is capped at the narration duration.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::assemble::PlannedClip;
use crate::error::{PipelineError, PipelineResult};
use crate::ui::prelude::*;

pub const VIDEO_FPS: u32 = 60;

pub struct RenderJob<'a> {
    pub clips: &'a [PlannedClip],
    pub subtitles: &'a Path,
    pub audio: &'a Path,
    /// Narration duration in seconds; the output is trimmed to this.
    pub duration: f64,
    pub output: &'a Path,
}

pub fn render_video(job: &RenderJob) -> PipelineResult<()> {
    if job.clips.is_empty() {
        return Err(PipelineError::Assembly(
            "render called with an empty clip plan".into(),
        ));
    }

    if let Some(parent) = job.output.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }

    let concat_list = write_concat_list(job.clips)?;

    emit(
        Level::Info,
        "render.start",
        &format!(
            "rendering {} clips into {}",
            job.clips.len(),
            job.output.display()
        ),
        None,
    );

    let status = Command::new("ffmpeg")
        .args(["-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(concat_list.path())
        .arg("-i")
        .arg(job.audio)
        .arg("-vf")
        .arg(format!("ass={}", job.subtitles.display()))
        .args(["-map", "0:v:0", "-map", "1:a:0"])
        .args(["-c:v", "libx264", "-c:a", "aac"])
        .args(["-r", &VIDEO_FPS.to_string()])
        .args(["-preset", "ultrafast"])
        .args(["-t", &format!("{:.3}", job.duration)])
        .arg(job.output)
        .status()
        .map_err(|e| PipelineError::tool("ffmpeg", e.to_string()))?;

    if !status.success() {
        return Err(PipelineError::tool(
            "ffmpeg",
            format!("render failed for {}", job.output.display()),
        ));
    }

    emit(
        Level::Success,
        "render.done",
        &format!("wrote {}", job.output.display()),
        None,
    );
    Ok(())
}

/// Concat demuxer input: one `file '<path>'` line per planned clip, in
/// plan order, repeats included.
fn write_concat_list(clips: &[PlannedClip]) -> PipelineResult<tempfile::NamedTempFile> {
    let mut list = tempfile::NamedTempFile::new()
        .map_err(|e| PipelineError::io("render concat list", e))?;
    for clip in clips {
        let escaped = clip.path.display().to_string().replace('\'', "'\\''");
        writeln!(list, "file '{escaped}'").map_err(|e| PipelineError::io(list.path(), e))?;
    }
    list.flush().map_err(|e| PipelineError::io(list.path(), e))?;
    Ok(list)
}
