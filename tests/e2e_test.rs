use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn write_config(dir: &Path) {
    fs::write(
        dir.join("reelgen.toml"),
        r#"
workspace = "."

[[accounts]]
name = "knoxreads"
language = "en"
category = "minecraft"
subtype = "parkour"
platforms = ["tiktok"]
"#,
    )
    .unwrap();
}

fn run_reelgen(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reelgen"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run reelgen binary")
}

#[test]
fn init_creates_seeded_workspace() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    let output = run_reelgen(dir.path(), &["init"]);
    assert!(output.status.success(), "init failed: {output:?}");

    for seeded in [
        "links/audio_en.csv",
        "links/minecraft_parkour.csv",
        "ledger/audio_en.csv",
        "ledger/minecraft_parkour.csv",
        "ledger/knoxreads.csv",
    ] {
        let path = dir.path().join(seeded);
        assert!(path.exists(), "missing {seeded}");
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "video_id\n", "unexpected seed in {seeded}");
    }

    for dir_name in [
        "media/audio/en",
        "media/clips/minecraft/parkour",
        "media/captions/en",
        "media/scripts/en",
        "output",
    ] {
        assert!(dir.path().join(dir_name).is_dir(), "missing dir {dir_name}");
    }
}

#[test]
fn init_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());

    assert!(run_reelgen(dir.path(), &["init"]).status.success());

    // Simulate prior history, then re-init: seeds must not truncate.
    let ledger = dir.path().join("ledger/knoxreads.csv");
    fs::write(&ledger, "video_id\nstory1\n").unwrap();
    assert!(run_reelgen(dir.path(), &["init"]).status.success());
    assert_eq!(fs::read_to_string(&ledger).unwrap(), "video_id\nstory1\n");
}

#[test]
fn assemble_with_empty_pool_continues_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    assert!(run_reelgen(dir.path(), &["init"]).status.success());

    let output = run_reelgen(dir.path(), &["--seed", "1", "assemble"]);
    assert!(
        output.status.success(),
        "empty pool must not abort the batch: {output:?}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("script pool is empty"),
        "expected a per-account error, got: {stderr}"
    );
}

#[test]
fn sync_with_empty_links_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    assert!(run_reelgen(dir.path(), &["init"]).status.success());

    let output = run_reelgen(dir.path(), &["sync"]);
    assert!(output.status.success(), "sync failed: {output:?}");
}

#[test]
fn missing_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_reelgen(dir.path(), &["init"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("config"), "got: {stderr}");
}

#[test]
fn corrupt_ledger_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path());
    assert!(run_reelgen(dir.path(), &["init"]).status.success());

    // Invalid UTF-8 makes the used-script record unreadable. Provide a
    // caption/audio pair so assembly gets far enough to read it.
    fs::write(
        dir.path().join("media/captions/en/story1.json"),
        r#"{"segments":[]}"#,
    )
    .unwrap();
    fs::write(dir.path().join("media/audio/en/story1.wav"), b"riff").unwrap();
    fs::write(
        dir.path().join("ledger/knoxreads.csv"),
        [0xffu8, 0xfe, 0x00, 0xff],
    )
    .unwrap();

    let output = run_reelgen(dir.path(), &["--seed", "1", "assemble"]);
    assert!(!output.status.success(), "corrupt ledger must be fatal");
}
