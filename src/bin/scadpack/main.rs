//! scadpack CLI - bundle OpenSCAD designs with everything they reference

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scadpack::util::shell::Shell;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("scadpack=debug")
    } else {
        EnvFilter::new("scadpack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);

    // Execute command
    match cli.command {
        Commands::Pack(args) => commands::pack::execute(&shell, args),
        Commands::Tree(args) => commands::tree::execute(&shell, args),
        Commands::Check(args) => commands::check::execute(&shell, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
