use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// reelgen main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Activate debug output
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Emit events as JSON lines instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the accounts configuration
    #[arg(short, long, global = true, default_value = "reelgen.toml", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    /// Seed for all random draws (reproducible runs)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the workspace tree and seed links/ledger files
    Init,
    /// Download pending assets, normalize audio, and transcribe narration
    Sync(SyncArgs),
    /// Synthesize narration audio for unused text scripts
    Audio(AudioArgs),
    /// Assemble and render one short per account
    Assemble(AssembleArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Restrict the run to a single account
    #[arg(long)]
    pub account: Option<String>,

    /// Skip the transcription step after downloading
    #[arg(long)]
    pub skip_transcribe: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AudioArgs {
    /// Restrict the run to a single account
    #[arg(long)]
    pub account: Option<String>,

    /// How many scripts to synthesize per account
    #[arg(long, default_value_t = 1)]
    pub count: usize,
}

#[derive(Args, Debug, Clone)]
pub struct AssembleArgs {
    /// Restrict the run to a single account
    #[arg(long)]
    pub account: Option<String>,
}
