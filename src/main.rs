mod assemble;
mod captions;
mod cli;
mod commands;
mod config;
mod error;
mod fetch;
mod ledger;
mod media;
mod render;
mod script;
mod synth;
mod transcribe;
mod ui;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::cli::{Cli, Commands};
use crate::ui::prelude::*;

fn main() {
    let cli = Cli::parse();

    ui::init(
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        },
        !cli.json,
    );
    ui::set_debug_mode(cli.debug);

    let mut rng: StdRng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let result = match cli.command {
        Commands::Init => commands::handle_init(&cli.config),
        Commands::Sync(args) => commands::handle_sync(&cli.config, args),
        Commands::Audio(args) => commands::handle_audio(&cli.config, args, &mut rng),
        Commands::Assemble(args) => commands::handle_assemble(&cli.config, args, &mut rng),
    };

    if let Err(err) = result {
        emit(Level::Error, "fatal", &format!("{err:#}"), None);
        std::process::exit(1);
    }
}
