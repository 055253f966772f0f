//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use scadpack::util::shell::ColorChoice;

/// scadpack - Bundle an OpenSCAD design and everything it references
#[derive(Parser)]
#[command(name = "scadpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// When to use colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto", value_name = "WHEN")]
    pub color: ColorChoice,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy a design and everything it references into a directory
    Pack(PackArgs),

    /// Display the resolved reference tree
    Tree(TreeArgs),

    /// Resolve a design and report problems without copying
    Check(CheckArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Search-root options shared by every resolving command.
#[derive(Args)]
pub struct SearchArgs {
    /// Additional library roots, searched in the order given
    #[arg(short = 'L', long = "library", value_name = "DIR")]
    pub library: Vec<PathBuf>,

    /// Ignore OPENSCADPATH and the platform library directory
    #[arg(long)]
    pub no_default_libraries: bool,
}

#[derive(Args)]
pub struct PackArgs {
    /// The entry .scad file
    pub file: PathBuf,

    /// Directory to write the bundle to
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Bundle subdirectory for library files; `.` for the bundle root
    #[arg(long, value_name = "NAME")]
    pub lib_dir: Option<PathBuf>,

    /// Demote unresolved and dynamic references to warnings
    #[arg(long)]
    pub relaxed: bool,

    /// Do not follow import() directives
    #[arg(long)]
    pub skip_imports: bool,

    /// Copy extra files matching GLOB, relative to the entry file
    #[arg(long, value_name = "GLOB")]
    pub add: Vec<String>,

    /// Delete the output directory first if it already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Print the copy plan as JSON instead of copying
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// The entry .scad file
    pub file: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Maximum depth to display
    #[arg(short, long)]
    pub depth: Option<usize>,

    /// Demote unresolved and dynamic references to warnings
    #[arg(long)]
    pub relaxed: bool,

    /// Do not follow import() directives
    #[arg(long)]
    pub skip_imports: bool,
}

#[derive(Args)]
pub struct CheckArgs {
    /// The entry .scad file
    pub file: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    /// Bundle subdirectory for library files; `.` for the bundle root
    #[arg(long, value_name = "NAME")]
    pub lib_dir: Option<PathBuf>,

    /// Demote unresolved and dynamic references to warnings
    #[arg(long)]
    pub relaxed: bool,

    /// Do not follow import() directives
    #[arg(long)]
    pub skip_imports: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
