pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "brewbot",
    about = "Brewbot operator CLI",
    long_about = "Operate brewbot runtime readiness, config inspection, and catalog ingestion.",
    after_help = "Examples:\n  brewbot doctor --json\n  brewbot config\n  brewbot upload --file inventory.csv"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, Telegram token readiness, and vector index connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
    #[command(about = "Embed a catalog CSV and upsert it into the vector index in rate-limited batches")]
    Upload {
        #[arg(long, default_value = "inventory.csv", help = "Path to the catalog CSV file")]
        file: PathBuf,
        #[arg(long, default_value_t = 10, help = "Items embedded and upserted per batch")]
        batch_size: usize,
        #[arg(long, help = "Parse and summarize the CSV without touching the index")]
        dry_run: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Upload { file, batch_size, dry_run } => {
            commands::upload::run(&file, batch_size, dry_run)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
