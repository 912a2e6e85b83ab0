//! Word-level caption events derived from a transcription.
//!
//! The transcriber produces segments of timed words; the overlay turns
//! them into a lazy, finite sequence of caption events aligned to
//! absolute audio time. Re-running with the same seed reproduces the
//! same color draws.

pub mod ass;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// Highlight palette; one color is drawn per run.
pub const HIGHLIGHT_COLORS: [&str; 2] = ["#a4c7c0", "#beb6b1"];
pub const DEFAULT_COLOR: &str = "#ffffff";

/// Words shorter than this never get the highlight color.
const HIGHLIGHT_MIN_CHARS: usize = 5;

/// Fallback display duration when the transcriber omits a word's end.
pub const FALLBACK_WORD_SECONDS: f64 = 0.5;

#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(default)]
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Word {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub start: f64,
    pub end: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEvent {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub color: &'static str,
}

pub fn load_transcript(path: &Path) -> PipelineResult<Transcript> {
    let contents = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| {
        PipelineError::tool(
            "transcriber",
            format!("{}: malformed transcript: {e}", path.display()),
        )
    })
}

/// Lazy iterator over the transcript's caption events.
pub struct CaptionEvents<'a, R: Rng + ?Sized> {
    segments: &'a [Segment],
    segment: usize,
    word: usize,
    highlight: &'static str,
    rng: &'a mut R,
}

/// Build the event sequence for one run. The highlight color is drawn
/// once up front; each long-enough word then gets it on a two-in-three
/// check. Restart by calling this again with a fresh rng.
pub fn caption_events<'a, R: Rng + ?Sized>(
    transcript: &'a Transcript,
    rng: &'a mut R,
) -> CaptionEvents<'a, R> {
    let highlight = HIGHLIGHT_COLORS
        .choose(rng)
        .copied()
        .unwrap_or(DEFAULT_COLOR);
    CaptionEvents {
        segments: &transcript.segments,
        segment: 0,
        word: 0,
        highlight,
        rng,
    }
}

impl<R: Rng + ?Sized> Iterator for CaptionEvents<'_, R> {
    type Item = CaptionEvent;

    fn next(&mut self) -> Option<CaptionEvent> {
        loop {
            let segment = self.segments.get(self.segment)?;
            let Some(word) = segment.words.get(self.word) else {
                self.segment += 1;
                self.word = 0;
                continue;
            };
            self.word += 1;

            let text = word.text.trim();
            if text.is_empty() {
                continue;
            }

            let color = if text.chars().count() >= HIGHLIGHT_MIN_CHARS
                && self.rng.gen_range(1..=3) >= 2
            {
                self.highlight
            } else {
                DEFAULT_COLOR
            };

            return Some(CaptionEvent {
                text: text.to_string(),
                start: word.start,
                end: word.end.unwrap_or(word.start + FALLBACK_WORD_SECONDS),
                color,
            });
        }
    }
}
