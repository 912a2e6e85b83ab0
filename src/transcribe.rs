//! Word-level transcription of narration audio.
//!
//! Each narration wav without a transcript is handed to the external
//! transcriber; transcripts whose audio half has disappeared are pruned
//! so the script pool only ever contains complete pairs.

use duct::cmd;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::media::files_with_extension;
use crate::ui::prelude::*;

/// Transcribe every wav in `audio_dir` that has no `<stem>.json` in
/// `captions_dir` yet. Returns how many transcripts were produced.
pub fn transcribe_missing(
    audio_dir: &Path,
    captions_dir: &Path,
    language: &str,
) -> PipelineResult<usize> {
    fs::create_dir_all(captions_dir).map_err(|e| PipelineError::io(captions_dir, e))?;

    let mut produced = 0;
    for audio in files_with_extension(audio_dir, "wav")? {
        let Some(stem) = audio.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let transcript = captions_dir.join(format!("{stem}.json"));
        if transcript.exists() {
            continue;
        }

        emit(
            Level::Info,
            "transcribe.start",
            &format!("transcribing {}", audio.display()),
            None,
        );
        run_transcriber(&audio, language, captions_dir)?;

        if !transcript.exists() {
            // Some transcriber builds name their output after the full
            // file name; fold that back onto the stem contract.
            let alternate = captions_dir.join(format!("{stem}.wav.words.json"));
            if alternate.exists() {
                fs::rename(&alternate, &transcript)
                    .map_err(|e| PipelineError::io(&alternate, e))?;
            } else {
                return Err(PipelineError::tool(
                    "transcriber",
                    format!("no transcript produced for {}", audio.display()),
                ));
            }
        }
        produced += 1;
    }
    Ok(produced)
}

fn run_transcriber(audio: &Path, language: &str, output_dir: &Path) -> PipelineResult<()> {
    let args: Vec<OsString> = vec![
        OsString::from("whisper-timestamped"),
        audio.as_os_str().to_os_string(),
        OsString::from("--language"),
        OsString::from(language),
        OsString::from("--output_format"),
        OsString::from("json"),
        OsString::from("--output_dir"),
        output_dir.as_os_str().to_os_string(),
    ];

    cmd("uvx", args)
        .run()
        .map_err(|e| PipelineError::tool("transcriber", format!("{}: {e}", audio.display())))?;
    Ok(())
}

/// Remove transcripts whose narration audio is gone. Returns how many
/// orphans were pruned.
pub fn prune_orphans(audio_dir: &Path, captions_dir: &Path) -> PipelineResult<usize> {
    let mut pruned = 0;
    for transcript in files_with_extension(captions_dir, "json")? {
        let Some(stem) = transcript.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let audio = audio_dir.join(format!("{stem}.wav"));
        if !audio.exists() {
            emit(
                Level::Info,
                "transcribe.prune",
                &format!(
                    "removing orphaned transcript {} (no matching audio)",
                    transcript.display()
                ),
                None,
            );
            fs::remove_file(&transcript).map_err(|e| PipelineError::io(&transcript, e))?;
            pruned += 1;
        }
    }
    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prune_removes_only_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("audio");
        let captions = dir.path().join("captions");
        fs::create_dir_all(&audio).unwrap();
        fs::create_dir_all(&captions).unwrap();

        fs::write(audio.join("kept.wav"), b"riff").unwrap();
        fs::write(captions.join("kept.json"), "{}").unwrap();
        fs::write(captions.join("orphan.json"), "{}").unwrap();

        let pruned = prune_orphans(&audio, &captions).unwrap();
        assert_eq!(pruned, 1);
        assert!(captions.join("kept.json").exists());
        assert!(!captions.join("orphan.json").exists());
    }

    #[test]
    fn prune_of_empty_dirs_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let pruned = prune_orphans(&dir.path().join("none"), &dir.path().join("none2")).unwrap();
        assert_eq!(pruned, 0);
    }
}
