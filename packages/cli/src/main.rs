mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    export, init, stats, templates, ExportArgs, InitArgs, StatsArgs, TemplatesArgs,
};
use tracing_subscriber::EnvFilter;

/// Playbook CLI - inspect and convert playbook documents
#[derive(Parser, Debug)]
#[command(name = "playbook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a Playbook workspace
    Init(InitArgs),

    /// Convert an export envelope to Markdown or normalized JSON
    Export(ExportArgs),

    /// Print document statistics
    Stats(StatsArgs),

    /// Manage saved templates
    Templates(TemplatesArgs),
}

fn main() {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Export(args) => export(args, &cwd),
                Command::Stats(args) => stats(args, &cwd),
                Command::Templates(args) => templates(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
