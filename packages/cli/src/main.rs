mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, import, render, CheckArgs, ImportArgs, RenderArgs};

/// Quire CLI - render, import and inspect editor snapshots
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a JSON snapshot to HTML
    Render(RenderArgs),

    /// Convert an HTML page into a JSON snapshot
    Import(ImportArgs),

    /// Report node counts and skipped node types of a snapshot
    Check(CheckArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Render(args) => render(args, &cwd),
            Command::Import(args) => import(args),
            Command::Check(args) => check(args),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
