//! Bulk asset acquisition.
//!
//! Resolves the pending set for a category, hands it to the external
//! downloader through a transient batch file, and records only the
//! identifiers whose output file actually landed. Unverified identifiers
//! stay in the links file for the next run.

use duct::cmd;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::{PipelineError, PipelineResult};
use crate::ledger::{HEADER_TOKEN, LedgerStore, pending, read_id_file};
use crate::media::stem_set;
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy)]
pub enum MediaKind {
    Audio,
    Clips,
}

impl MediaKind {
    fn downloader_args(self) -> &'static [&'static str] {
        match self {
            MediaKind::Audio => &["-x", "--audio-format", "mp3"],
            MediaKind::Clips => &["--merge-output-format", "mp4", "-f", "bv+ba/b"],
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub fetched: Vec<String>,
    pub missing: Vec<String>,
}

/// Fetch every identifier listed in `links_path` that the category's
/// ledger does not already contain. Ledger writes happen only after the
/// download batch returns and each identifier's output file is verified
/// present.
pub fn sync_category(
    ledger: &mut LedgerStore,
    links_path: &Path,
    category: &str,
    dest_dir: &Path,
    kind: MediaKind,
) -> PipelineResult<FetchOutcome> {
    let requested = read_id_file(links_path)?;
    let consumed = ledger.all(category)?;
    let pending_ids = pending(&requested, consumed);

    if pending_ids.is_empty() {
        emit(
            Level::Debug,
            "fetch.up_to_date",
            &format!("{category}: nothing pending"),
            None,
        );
        return Ok(FetchOutcome::default());
    }

    emit(
        Level::Info,
        "fetch.pending",
        &format!("{category}: fetching {} new assets", pending_ids.len()),
        None,
    );

    fs::create_dir_all(dest_dir).map_err(|e| PipelineError::io(dest_dir, e))?;
    run_downloader(kind, &pending_ids, dest_dir)?;

    // Only identifiers whose output landed are considered done; the rest
    // stay requested so the next run retries them.
    let present = stem_set(dest_dir)?;
    let mut fetched = Vec::new();
    let mut missing = Vec::new();
    for id in pending_ids {
        if present.contains(&id) {
            fetched.push(id);
        } else {
            missing.push(id);
        }
    }
    fetched.sort();
    missing.sort();

    for id in &missing {
        emit(
            Level::Warn,
            "fetch.missing_output",
            &format!("{category}: downloader produced no file for '{id}'"),
            None,
        );
    }

    ledger.record(category, &fetched)?;
    rewrite_links(links_path, &missing)?;

    Ok(FetchOutcome { fetched, missing })
}

/// Invoke the bulk downloader with a transient batch file (one
/// identifier per line, no header) and an output-path template. The
/// batch file is removed when this returns.
fn run_downloader(kind: MediaKind, ids: &HashSet<String>, dest_dir: &Path) -> PipelineResult<()> {
    let mut batch = tempfile::NamedTempFile::new()
        .map_err(|e| PipelineError::io("downloader batch file", e))?;
    for id in ids {
        writeln!(batch, "{id}").map_err(|e| PipelineError::io(batch.path(), e))?;
    }
    batch
        .flush()
        .map_err(|e| PipelineError::io(batch.path(), e))?;

    let template = format!("{}/%(id)s.%(ext)s", dest_dir.display());
    let mut args: Vec<String> = kind.downloader_args().iter().map(|s| s.to_string()).collect();
    args.extend([
        "-o".to_string(),
        template,
        "--batch-file".to_string(),
        batch.path().display().to_string(),
    ]);

    cmd("yt-dlp", args)
        .run()
        .map_err(|e| PipelineError::tool("yt-dlp", e.to_string()))?;
    Ok(())
}

/// Re-seed the links file with the header token and the identifiers that
/// are still unsatisfied.
fn rewrite_links(links_path: &Path, remaining: &[String]) -> PipelineResult<()> {
    if let Some(parent) = links_path.parent() {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let mut contents = format!("{HEADER_TOKEN}\n");
    for id in remaining {
        contents.push_str(id);
        contents.push('\n');
    }
    fs::write(links_path, contents).map_err(|e| PipelineError::io(links_path, e))
}

/// Normalize downloaded audio: convert each mp3 in `dir` to wav and
/// remove the original.
pub fn transcode_audio(dir: &Path) -> PipelineResult<usize> {
    let sources = crate::media::files_with_extension(dir, "mp3")?;
    let mut converted = 0;
    for source in sources {
        let target = source.with_extension("wav");
        let status = Command::new("ffmpeg")
            .args(["-y", "-i"])
            .arg(&source)
            .arg(&target)
            .status()
            .map_err(|e| PipelineError::tool("ffmpeg", format!("{}: {e}", source.display())))?;
        if !status.success() {
            return Err(PipelineError::tool(
                "ffmpeg",
                format!("transcode failed for {}", source.display()),
            ));
        }
        fs::remove_file(&source).map_err(|e| PipelineError::io(&source, e))?;
        converted += 1;
        emit(
            Level::Debug,
            "fetch.transcoded",
            &format!("{} -> wav", source.display()),
            None,
        );
    }
    Ok(converted)
}
