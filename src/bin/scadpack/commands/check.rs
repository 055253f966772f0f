//! `scadpack check` command

use std::path::PathBuf;

use anyhow::Result;

use scadpack::ops::DEFAULT_LIBRARY_DIR;
use scadpack::resolver::{self, ResolveOptions};
use scadpack::util::diagnostic;
use scadpack::util::shell::{Shell, Status};

use crate::cli::CheckArgs;
use crate::commands::{ancillary_patterns, build_search, load_entry_config};

pub fn execute(shell: &Shell, args: CheckArgs) -> Result<()> {
    let config = load_entry_config(&args.file);
    let search = build_search(&args.search, &config);
    let library_dir = args
        .lib_dir
        .clone()
        .or_else(|| config.output.library_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR));

    shell.status(Status::Resolving, args.file.display());

    let options = ResolveOptions {
        relaxed: args.relaxed,
        skip_imports: args.skip_imports,
        ancillary_patterns: ancillary_patterns(&config),
    };
    let resolution = match resolver::resolve(&args.file, &search, &options) {
        Ok(resolution) => resolution,
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), shell.use_color());
            anyhow::bail!("resolution failed for {}", args.file.display());
        }
    };

    for skipped in &resolution.skipped {
        diagnostic::emit(&skipped.to_diagnostic(), shell.use_color());
    }

    // Lay the bundle out without writing anything so collisions and escapes
    // surface exactly as they would during a pack.
    let manifest = match resolver::assemble(&resolution.graph, &library_dir) {
        Ok(manifest) => manifest,
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), shell.use_color());
            anyhow::bail!("could not lay out the bundle for {}", args.file.display());
        }
    };

    shell.status(
        Status::Finished,
        format!(
            "{} files, {} warnings",
            manifest.len(),
            resolution.skipped.len()
        ),
    );
    println!("digest: {}", manifest.digest());

    Ok(())
}
