//! `scadpack pack` command

use std::path::PathBuf;

use anyhow::Result;

use scadpack::ops::pack::{pack, PackOptions, DEFAULT_LIBRARY_DIR};
use scadpack::util::shell::Shell;

use crate::cli::PackArgs;
use crate::commands::{ancillary_patterns, build_search, load_entry_config};

pub fn execute(shell: &Shell, args: PackArgs) -> Result<()> {
    // Load configuration (global + project)
    let config = load_entry_config(&args.file);
    let search = build_search(&args.search, &config);

    // CLI overrides config
    let library_dir = args
        .lib_dir
        .or_else(|| config.output.library_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_DIR));

    let opts = PackOptions::new(&args.file, &args.output_dir)
        .with_search(search)
        .with_library_dir(library_dir)
        .with_relaxed(args.relaxed)
        .with_skip_imports(args.skip_imports)
        .with_ancillary_patterns(ancillary_patterns(&config))
        .with_add(args.add)
        .with_overwrite(args.overwrite)
        .with_plan(args.plan);

    pack(shell, &opts)?;

    Ok(())
}
