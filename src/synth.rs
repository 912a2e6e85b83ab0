//! Speech synthesis for text scripts.
//!
//! Text scripts become narration audio: a never-used script is chosen
//! (stems that already have a wav count as used), the synthesizer
//! returns raw PCM, and the PCM is wrapped into a wav next to the other
//! narration files. The source text is removed once the audio exists.

use duct::cmd;
use rand::Rng;
use rand::seq::SliceRandom;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::media::{stem_set, wav};
use crate::script::{scan_stems, select_stem};
use crate::ui::prelude::*;

/// Text-to-speech boundary: text plus a voice selector in, raw PCM out.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str, voice: &Path) -> PipelineResult<Vec<u8>>;
}

/// Piper-backed synthesizer reading raw PCM from the tool's stdout.
pub struct PiperSynthesizer;

impl SpeechSynthesizer for PiperSynthesizer {
    fn synthesize(&self, text: &str, voice: &Path) -> PipelineResult<Vec<u8>> {
        let args: Vec<OsString> = vec![
            OsString::from("--model"),
            voice.as_os_str().to_os_string(),
            OsString::from("--output-raw"),
        ];
        let output = cmd("piper", args)
            .stdin_bytes(text.as_bytes().to_vec())
            .stdout_capture()
            .run()
            .map_err(|e| PipelineError::tool("piper", e.to_string()))?;
        Ok(output.stdout)
    }
}

/// Generate narration for one unused text script. Returns the stem that
/// was synthesized.
pub fn generate_audio<R: Rng + ?Sized>(
    rng: &mut R,
    synthesizer: &dyn SpeechSynthesizer,
    scripts_dir: &Path,
    audio_dir: &Path,
    voices: &[PathBuf],
) -> PipelineResult<String> {
    let pool = scan_stems(scripts_dir, "txt")?;
    let used = stem_set(audio_dir)?;
    let stem = select_stem(rng, &pool, &used)?;

    let voice = voices
        .choose(rng)
        .ok_or_else(|| PipelineError::Config("no voices configured for this account".into()))?;

    let script_path = scripts_dir.join(format!("{stem}.txt"));
    let text = fs::read_to_string(&script_path).map_err(|e| PipelineError::io(&script_path, e))?;
    let text = text.trim();
    if text.is_empty() {
        return Err(PipelineError::NotFound(format!(
            "script '{stem}' is empty"
        )));
    }

    emit(
        Level::Info,
        "synth.start",
        &format!("synthesizing '{stem}' with voice {}", voice.display()),
        None,
    );

    let pcm = synthesizer.synthesize(text, voice)?;
    if pcm.is_empty() {
        return Err(PipelineError::tool(
            "synthesizer",
            format!("no PCM returned for '{stem}'"),
        ));
    }

    fs::create_dir_all(audio_dir).map_err(|e| PipelineError::io(audio_dir, e))?;
    let audio_path = audio_dir.join(format!("{stem}.wav"));
    wav::write_pcm_wav(&audio_path, &pcm)?;

    // The text half is consumed; only the audio half remains.
    fs::remove_file(&script_path).map_err(|e| PipelineError::io(&script_path, e))?;

    emit(
        Level::Success,
        "synth.done",
        &format!("narration written to {}", audio_path.display()),
        None,
    );
    Ok(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct StubSynthesizer {
        pcm: Vec<u8>,
    }

    impl SpeechSynthesizer for StubSynthesizer {
        fn synthesize(&self, _text: &str, _voice: &Path) -> PipelineResult<Vec<u8>> {
            Ok(self.pcm.clone())
        }
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("scripts");
        let audio = dir.path().join("audio");
        fs::create_dir_all(&scripts).unwrap();
        fs::create_dir_all(&audio).unwrap();
        (dir, scripts, audio)
    }

    #[test]
    fn synthesizes_and_consumes_the_script() {
        let (_dir, scripts, audio) = setup();
        fs::write(scripts.join("story1.txt"), "once upon a time").unwrap();

        let synth = StubSynthesizer {
            pcm: vec![0u8; 400],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let stem = generate_audio(
            &mut rng,
            &synth,
            &scripts,
            &audio,
            &[PathBuf::from("voice.onnx")],
        )
        .unwrap();

        assert_eq!(stem, "story1");
        assert!(audio.join("story1.wav").exists());
        assert!(!scripts.join("story1.txt").exists());
    }

    #[test]
    fn stems_with_audio_count_as_used() {
        let (_dir, scripts, audio) = setup();
        fs::write(scripts.join("done.txt"), "already voiced").unwrap();
        fs::write(scripts.join("fresh.txt"), "new story").unwrap();
        fs::write(audio.join("done.wav"), b"riff").unwrap();

        let synth = StubSynthesizer {
            pcm: vec![0u8; 4],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let stem = generate_audio(
            &mut rng,
            &synth,
            &scripts,
            &audio,
            &[PathBuf::from("voice.onnx")],
        )
        .unwrap();
        assert_eq!(stem, "fresh");
    }

    #[test]
    fn empty_pcm_is_a_tool_error() {
        let (_dir, scripts, audio) = setup();
        fs::write(scripts.join("story.txt"), "text").unwrap();

        let synth = StubSynthesizer { pcm: vec![] };
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_audio(
            &mut rng,
            &synth,
            &scripts,
            &audio,
            &[PathBuf::from("voice.onnx")],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::ExternalTool { .. }));
        // The script must survive a failed synthesis.
        assert!(scripts.join("story.txt").exists());
    }

    #[test]
    fn no_voices_is_a_config_error() {
        let (_dir, scripts, audio) = setup();
        fs::write(scripts.join("story.txt"), "text").unwrap();

        let synth = StubSynthesizer {
            pcm: vec![0u8; 4],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_audio(&mut rng, &synth, &scripts, &audio, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn no_scripts_is_not_found() {
        let (_dir, scripts, audio) = setup();
        let synth = StubSynthesizer {
            pcm: vec![0u8; 4],
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_audio(
            &mut rng,
            &synth,
            &scripts,
            &audio,
            &[PathBuf::from("voice.onnx")],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }
}
