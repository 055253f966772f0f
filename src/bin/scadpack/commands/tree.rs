//! `scadpack tree` command

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;

use scadpack::core::graph::{DependencyGraph, FileId, Origin};
use scadpack::resolver::{self, ResolveOptions};
use scadpack::util::diagnostic;
use scadpack::util::fs::relative_path;
use scadpack::util::shell::Shell;

use crate::cli::TreeArgs;
use crate::commands::{ancillary_patterns, build_search, load_entry_config};

pub fn execute(shell: &Shell, args: TreeArgs) -> Result<()> {
    let config = load_entry_config(&args.file);
    let search = build_search(&args.search, &config);

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

    let graph = &resolution.graph;
    let entry = graph.file(graph.entry());
    let entry_dir = entry.path().parent().unwrap_or(Path::new("/"));

    println!("{}", entry.path().display());

    let mut seen = HashSet::new();
    seen.insert(graph.entry());
    print_children(
        graph,
        entry_dir,
        graph.entry(),
        "",
        args.depth.unwrap_or(usize::MAX),
        &mut seen,
    );

    Ok(())
}

fn print_children(
    graph: &DependencyGraph,
    entry_dir: &Path,
    id: FileId,
    prefix: &str,
    depth_left: usize,
    seen: &mut HashSet<FileId>,
) {
    if depth_left == 0 {
        return;
    }

    let children = graph.children(id);
    let count = children.len();
    for (i, (kind, child)) in children.into_iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };

        let node = graph.file(child);
        let label = match node.origin() {
            Origin::Library(root) => format!(
                "{} (library)",
                relative_path(root, node.path()).display()
            ),
            _ => relative_path(entry_dir, node.path()).display().to_string(),
        };

        // a file already printed elsewhere is marked, not expanded again
        let repeat = !seen.insert(child);
        let marker = if repeat { " (*)" } else { "" };
        println!("{prefix}{branch}{kind} {label}{marker}");

        if !repeat {
            let next = format!("{prefix}{}", if last { "    " } else { "│   " });
            print_children(graph, entry_dir, child, &next, depth_left - 1, seen);
        }
    }
}
