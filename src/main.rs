use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use tripwiz::cli::commands::{Cli, Commands};
use tripwiz::cli;

fn main() {
    // stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TRIPWIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli_args = Cli::parse();
    let json_output = cli_args.json;

    let exit_code = match cli_args.command {
        Commands::Init { owner, autosave_secs } => cli::init::run(owner, autosave_secs, json_output),
        Commands::Wizard(cmd) => cli::wizard::run(cmd, json_output),
        Commands::Draft(cmd) => cli::draft::run(cmd, json_output),
        Commands::Trip(cmd) => cli::trip::run(cmd, json_output),
        Commands::Join(cmd) => cli::join::run(cmd, json_output),
        Commands::Notify(cmd) => cli::notify::run(cmd, json_output),
    };

    process::exit(exit_code);
}
