//! Command implementations

pub mod check;
pub mod completions;
pub mod pack;
pub mod tree;

use std::path::Path;

use scadpack::core::search::{default_library_roots, SearchPath, DEFAULT_ANCILLARY_PATTERNS};
use scadpack::util::config::{global_config_path, load_config, project_config_path, Config};

use crate::cli::SearchArgs;

/// Load configuration for an entry file: the global config overlaid with
/// the project's `.scadpack.toml` beside the entry.
pub fn load_entry_config(entry: &Path) -> Config {
    let global = global_config_path().unwrap_or_default();
    let project = project_config_path(entry.parent().unwrap_or(Path::new(".")));
    load_config(&global, &project)
}

/// Build the library search path for a run: `-L` roots in command-line
/// order, then configured libraries, then OPENSCADPATH and the platform
/// directory unless defaults are disabled.
pub fn build_search(args: &SearchArgs, config: &Config) -> SearchPath {
    let mut search = SearchPath::new();
    search.extend_roots(args.library.iter().cloned());
    search.extend_roots(config.search.libraries.iter().cloned());
    if !args.no_default_libraries && config.use_default_libraries() {
        search.extend_roots(default_library_roots());
    }
    search
}

/// The ancillary filename globs for a run: configured patterns, or the
/// built-in set when the configuration has none.
pub fn ancillary_patterns(config: &Config) -> Vec<String> {
    if config.ancillary.patterns.is_empty() {
        DEFAULT_ANCILLARY_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .collect()
    } else {
        config.ancillary.patterns.clone()
    }
}
