//! ASS (Advanced SubStation Alpha) subtitle generation.
//!
//! Caption events are burned into the video by ffmpeg's `ass` filter;
//! per-word colors are expressed as inline primary-color overrides on a
//! single base style.

use std::fmt::Write;

use super::{CaptionEvent, DEFAULT_COLOR};

/// Base style for caption rendering on a 9:16 canvas.
#[derive(Debug, Clone)]
pub struct CaptionStyle {
    pub font_name: String,
    pub font_size: u32,
    pub outline: u32,
    /// Numpad alignment (5 = dead center, matching the source overlay).
    pub alignment: u8,
    pub play_res: (u32, u32),
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_name: "Komika Axis".to_string(),
            font_size: 80,
            outline: 4,
            alignment: 5,
            play_res: (1080, 1920),
        }
    }
}

impl CaptionStyle {
    fn to_style_line(&self) -> String {
        format!(
            "Style: Default,{font},{size},{primary},{primary},&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,{outline},0,{align},40,40,40,1",
            font = self.font_name,
            size = self.font_size,
            primary = ass_color(DEFAULT_COLOR),
            outline = self.outline,
            align = self.alignment,
        )
    }
}

/// Render caption events into a complete ASS file.
pub fn generate_ass(events: impl IntoIterator<Item = CaptionEvent>, style: &CaptionStyle) -> String {
    let mut output = String::new();

    writeln!(output, "[Script Info]").unwrap();
    writeln!(output, "ScriptType: v4.00+").unwrap();
    writeln!(output, "PlayResX: {}", style.play_res.0).unwrap();
    writeln!(output, "PlayResY: {}", style.play_res.1).unwrap();
    writeln!(output, "WrapStyle: 0").unwrap();
    writeln!(output, "ScaledBorderAndShadow: yes").unwrap();
    writeln!(output).unwrap();

    writeln!(output, "[V4+ Styles]").unwrap();
    writeln!(
        output,
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
    )
    .unwrap();
    writeln!(output, "{}", style.to_style_line()).unwrap();
    writeln!(output).unwrap();

    writeln!(output, "[Events]").unwrap();
    writeln!(
        output,
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
    )
    .unwrap();

    for event in events {
        let text = if event.color == DEFAULT_COLOR {
            escape_ass_text(&event.text)
        } else {
            format!(
                "{{\\1c{}}}{}",
                ass_color(event.color),
                escape_ass_text(&event.text)
            )
        };
        writeln!(
            output,
            "Dialogue: 0,{start},{end},Default,,0,0,0,,{text}",
            start = format_ass_timestamp(event.start),
            end = format_ass_timestamp(event.end),
        )
        .unwrap();
    }

    output
}

/// `#rrggbb` to the ASS `&HAABBGGRR&` form (alpha 0 = opaque).
fn ass_color(hex: &str) -> String {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return "&H00FFFFFF&".to_string();
    }
    let (r, g, b) = (&hex[0..2], &hex[2..4], &hex[4..6]);
    format!("&H00{}{}{}&", b, g, r).to_uppercase()
}

/// Seconds to the ASS timestamp form (H:MM:SS.cc).
fn format_ass_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u32;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u32;
    let secs = (seconds % 60.0).floor() as u32;
    let centiseconds = ((seconds % 1.0) * 100.0).round() as u32;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centiseconds)
}

fn escape_ass_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('{', "\\{")
        .replace('}', "\\}")
        .replace('\n', "\\N")
}
