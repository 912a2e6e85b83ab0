use anyhow::Result;
use rand::Rng;
use std::path::Path;
use std::time::Instant;

use crate::assemble::{assemble_plan, scan_clip_pool};
use crate::captions::ass::{CaptionStyle, generate_ass};
use crate::captions::{caption_events, load_transcript};
use crate::cli::{AssembleArgs, AudioArgs, SyncArgs};
use crate::config::{AccountConfig, AccountPaths, Config};
use crate::error::{PipelineError, PipelineResult};
use crate::fetch::{MediaKind, sync_category, transcode_audio};
use crate::ledger::{LedgerStore, seed_id_file};
use crate::media::probe::{FfprobeCache, probe_audio_duration};
use crate::render::{RenderJob, render_video};
use crate::script::{resolve_script, scan_stems, select_stem};
use crate::synth::{PiperSynthesizer, generate_audio};
use crate::transcribe::{prune_orphans, transcribe_missing};
use crate::ui::prelude::*;

pub fn handle_init(config_path: &Path) -> Result<()> {
    let config = Config::load_from_path(config_path)?;

    for account in &config.accounts {
        let paths = AccountPaths::new(&config.workspace, account);
        paths.ensure_directories()?;

        seed_id_file(paths.audio_links())?;
        seed_id_file(paths.clip_links())?;

        let ledger_dir = paths.ledger_dir();
        for category in [
            account.audio_category(),
            account.clip_category(),
            account.name.clone(),
        ] {
            seed_id_file(&ledger_dir.join(format!("{category}.csv")))?;
        }

        emit(
            Level::Info,
            "init.account",
            &format!("prepared workspace for '{}'", account.name),
            None,
        );
    }

    emit(
        Level::Success,
        "init.done",
        &format!("workspace ready at {}", config.workspace.display()),
        None,
    );
    Ok(())
}

pub fn handle_sync(config_path: &Path, args: SyncArgs) -> Result<()> {
    let started = Instant::now();
    let config = Config::load_from_path(config_path)?;
    let accounts = config.select_accounts(args.account.as_deref())?;

    for account in accounts {
        let paths = AccountPaths::new(&config.workspace, account);
        match sync_account(account, &paths, args.skip_transcribe) {
            Ok(()) => {}
            Err(err) if err.is_per_account() => {
                emit(
                    Level::Error,
                    "sync.account_failed",
                    &format!("{}: {err}", account.name),
                    None,
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    emit(
        Level::Success,
        "sync.done",
        &format!("sync finished in {:.1}s", started.elapsed().as_secs_f64()),
        None,
    );
    Ok(())
}

fn sync_account(
    account: &AccountConfig,
    paths: &AccountPaths,
    skip_transcribe: bool,
) -> PipelineResult<()> {
    let mut ledger = LedgerStore::new(paths.ledger_dir());

    let audio = sync_category(
        &mut ledger,
        paths.audio_links(),
        &account.audio_category(),
        paths.audio_dir(),
        MediaKind::Audio,
    )?;
    let clips = sync_category(
        &mut ledger,
        paths.clip_links(),
        &account.clip_category(),
        paths.clips_dir(),
        MediaKind::Clips,
    )?;
    if !audio.fetched.is_empty() || !clips.fetched.is_empty() {
        emit(
            Level::Info,
            "sync.fetched",
            &format!(
                "{}: downloaded {} audio and {} clip assets ({} still missing)",
                account.name,
                audio.fetched.len(),
                clips.fetched.len(),
                audio.missing.len() + clips.missing.len()
            ),
            None,
        );
    }

    let converted = transcode_audio(paths.audio_dir())?;
    if converted > 0 {
        emit(
            Level::Info,
            "sync.transcoded",
            &format!("{}: normalized {converted} audio files", account.name),
            None,
        );
    }

    if !skip_transcribe {
        transcribe_missing(paths.audio_dir(), paths.captions_dir(), &account.language)?;
        prune_orphans(paths.audio_dir(), paths.captions_dir())?;
    }

    Ok(())
}

pub fn handle_audio<R: Rng + ?Sized>(config_path: &Path, args: AudioArgs, rng: &mut R) -> Result<()> {
    let config = Config::load_from_path(config_path)?;
    let accounts = config.select_accounts(args.account.as_deref())?;
    let synthesizer = PiperSynthesizer;

    for account in accounts {
        let paths = AccountPaths::new(&config.workspace, account);
        for _ in 0..args.count {
            match generate_audio(
                rng,
                &synthesizer,
                paths.scripts_dir(),
                paths.audio_dir(),
                &account.voices,
            ) {
                Ok(stem) => emit(
                    Level::Info,
                    "audio.generated",
                    &format!("{}: synthesized '{stem}'", account.name),
                    None,
                ),
                Err(err) if err.is_per_account() => {
                    emit(
                        Level::Error,
                        "audio.account_failed",
                        &format!("{}: {err}", account.name),
                        None,
                    );
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

pub fn handle_assemble<R: Rng + ?Sized>(
    config_path: &Path,
    args: AssembleArgs,
    rng: &mut R,
) -> Result<()> {
    let started = Instant::now();
    let config = Config::load_from_path(config_path)?;
    let accounts = config.select_accounts(args.account.as_deref())?;

    for account in accounts {
        let paths = AccountPaths::new(&config.workspace, account);
        match assemble_account(rng, account, &paths) {
            Ok(()) => {}
            Err(err) if err.is_per_account() => {
                emit(
                    Level::Error,
                    "assemble.account_failed",
                    &format!("{}: {err}", account.name),
                    None,
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    emit(
        Level::Success,
        "assemble.done",
        &format!(
            "assembly finished in {:.1}s",
            started.elapsed().as_secs_f64()
        ),
        None,
    );
    Ok(())
}

fn assemble_account<R: Rng + ?Sized>(
    rng: &mut R,
    account: &AccountConfig,
    paths: &AccountPaths,
) -> PipelineResult<()> {
    let mut prober = FfprobeCache::new();
    let result = compose_account(rng, account, paths, &mut prober);
    // Probe handles are run-scoped; release them before moving on.
    prober.drain();
    result
}

fn compose_account<R: Rng + ?Sized>(
    rng: &mut R,
    account: &AccountConfig,
    paths: &AccountPaths,
    prober: &mut FfprobeCache,
) -> PipelineResult<()> {
    let mut ledger = LedgerStore::new(paths.ledger_dir());
    let used = ledger.all(&account.name)?.clone();

    let pool = scan_stems(paths.captions_dir(), "json")?;
    let stem = select_stem(rng, &pool, &used)?;
    emit(
        Level::Info,
        "assemble.script",
        &format!("{}: using script '{stem}'", account.name),
        None,
    );

    let script = resolve_script(paths.captions_dir(), paths.audio_dir(), &stem)?;
    let transcript = load_transcript(&script.transcript)?;
    let target = probe_audio_duration(&script.audio)?;
    emit(
        Level::Info,
        "assemble.audio",
        &format!("narration runs {target:.2}s"),
        None,
    );

    let clip_pool = scan_clip_pool(paths.clips_dir())?;
    let plan = assemble_plan(rng, prober, &clip_pool, target)?;

    let ass = generate_ass(caption_events(&transcript, rng), &CaptionStyle::default());
    let subtitles = paths.output_dir().join(format!("{stem}.ass"));
    if let Some(parent) = subtitles.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(&subtitles, ass).map_err(|e| PipelineError::io(&subtitles, e))?;

    for platform in &account.platforms {
        let output = paths
            .output_dir()
            .join(format!("{}_{}_{}.mp4", account.name, platform, stem));
        render_video(&RenderJob {
            clips: &plan.clips,
            subtitles: &subtitles,
            audio: &script.audio,
            duration: target,
            output: &output,
        })?;
    }

    // The script counts as consumed only once every platform rendered.
    ledger.record(&account.name, std::slice::from_ref(&script.stem))?;
    std::fs::remove_file(&subtitles).map_err(|e| PipelineError::io(&subtitles, e))?;

    emit(
        Level::Success,
        "assemble.recorded",
        &format!("{}: script '{}' marked as used", account.name, script.stem),
        None,
    );
    Ok(())
}
