//! The resolution walk.
//!
//! Builds a DependencyGraph from an entry file with an explicit work
//! stack: pop a scannable file, scan it, resolve each literal reference,
//! add newly resolved files to the graph, and push the scannable ones.
//! The graph's path table doubles as the visited set, so cycles terminate
//! and every file is scanned at most once. Newly discovered children are
//! pushed in reverse so the pop order matches the order directives appear
//! in the source.
//!
//! Files reached via `include`/`use` are scanned; files reached via
//! `import()` are leaf assets. Library hits additionally get their
//! directory swept for ancillary files, once per directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::graph::{DependencyGraph, FileKind, FileNode, Origin};
use crate::core::reference::{RefKind, TargetSpec};
use crate::core::search::{SearchPath, DEFAULT_ANCILLARY_PATTERNS};
use crate::util::diagnostic::{suggestions, Diagnostic};

use super::errors::ResolveError;
use super::paths::{self, FsProbe};

/// Filename globs match case-insensitively, `*` may cross nothing (names
/// have no separators), and dotfiles are matchable.
const ANCILLARY_MATCH: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Knobs for a resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Demote unresolved and dynamic references to warnings
    pub relaxed: bool,

    /// Do not follow `import()` directives at all
    pub skip_imports: bool,

    /// Filename globs for ancillary files collected beside library files
    pub ancillary_patterns: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        ResolveOptions {
            relaxed: false,
            skip_imports: false,
            ancillary_patterns: DEFAULT_ANCILLARY_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

/// Why a reference was left out of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The target exists nowhere under the search locations
    Unresolved,
    /// The import argument is a runtime expression
    Dynamic,
}

/// A reference that was skipped rather than resolved. Only produced in
/// relaxed mode; strict mode turns these into errors instead.
#[derive(Debug, Clone)]
pub struct SkippedReference {
    pub file: PathBuf,
    pub directive: String,
    pub line: u32,
    pub reason: SkipReason,
}

impl SkippedReference {
    /// Render as a warning with the matching remediation hints.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self.reason {
            SkipReason::Unresolved => {
                Diagnostic::warning(format!("skipped unresolved `{}`", self.directive))
                    .with_location_line(self.file.clone(), self.line)
                    .with_suggestion(suggestions::ADD_LIBRARY_ROOT.to_string())
            }
            SkipReason::Dynamic => {
                Diagnostic::warning(format!("skipped dynamic import `{}`", self.directive))
                    .with_location_line(self.file.clone(), self.line)
                    .with_suggestion(suggestions::DYNAMIC_IMPORT.to_string())
            }
        }
    }
}

/// The outcome of a resolution run.
#[derive(Debug)]
pub struct Resolution {
    /// Every reachable file, discovery-ordered
    pub graph: DependencyGraph,

    /// References omitted from the graph (relaxed mode only)
    pub skipped: Vec<SkippedReference>,
}

/// Resolve the full dependency graph rooted at `entry`.
pub fn resolve(
    entry: &Path,
    search: &SearchPath,
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    let probe = FsProbe;
    let patterns = compile_patterns(&options.ancillary_patterns);

    let entry = entry
        .canonicalize()
        .map_err(|_| ResolveError::MissingEntryFile {
            path: entry.to_path_buf(),
        })?;
    if !entry.is_file() {
        return Err(ResolveError::BadEntryFile { path: entry });
    }

    let mut graph = DependencyGraph::new(FileNode::new(
        entry,
        FileKind::Source,
        Origin::Entry,
        None,
    ));
    let mut skipped = Vec::new();
    let mut swept_dirs: HashSet<PathBuf> = HashSet::new();

    let mut stack = vec![graph.entry()];
    while let Some(id) = stack.pop() {
        let path = graph.file(id).path().to_path_buf();
        tracing::debug!("scanning {}", path.display());

        let text = fs::read_to_string(&path).map_err(|source| ResolveError::Read {
            file: path.clone(),
            source,
        })?;
        let references =
            super::scanner::scan(&text).map_err(|source| ResolveError::Scan {
                file: path.clone(),
                source,
            })?;

        let referrer_dir = path.parent().unwrap_or(Path::new("/"));
        let mut discovered = Vec::new();

        for (ref_idx, reference) in references.iter().enumerate() {
            if options.skip_imports && reference.kind() == RefKind::Import {
                continue;
            }

            let target = match reference.target() {
                TargetSpec::Literal(target) => target,
                TargetSpec::Dynamic(_) => {
                    if options.relaxed {
                        skipped.push(SkippedReference {
                            file: path.clone(),
                            directive: reference.directive().to_string(),
                            line: reference.line(),
                            reason: SkipReason::Dynamic,
                        });
                        continue;
                    }
                    return Err(ResolveError::DynamicImport {
                        file: path.clone(),
                        directive: reference.directive().to_string(),
                        line: reference.line(),
                    });
                }
            };

            let Some(hit) = paths::resolve_target(&probe, target, referrer_dir, search)
            else {
                if options.relaxed {
                    skipped.push(SkippedReference {
                        file: path.clone(),
                        directive: reference.directive().to_string(),
                        line: reference.line(),
                        reason: SkipReason::Unresolved,
                    });
                    continue;
                }
                return Err(ResolveError::UnresolvedReference {
                    file: path.clone(),
                    directive: reference.directive().to_string(),
                    line: reference.line(),
                    searched: search.roots().to_vec(),
                });
            };

            let canonical =
                hit.path
                    .canonicalize()
                    .map_err(|source| ResolveError::Read {
                        file: hit.path.clone(),
                        source,
                    })?;

            let child = match graph.lookup(&canonical) {
                Some(existing) => {
                    if reference.kind().is_scannable()
                        && graph.file(existing).kind() == FileKind::Asset
                    {
                        graph.promote_to_source(existing);
                        discovered.push(existing);
                    }
                    existing
                }
                None => {
                    let kind = if reference.kind().is_scannable() {
                        FileKind::Source
                    } else {
                        FileKind::Asset
                    };
                    let origin = hit.origin.clone();
                    let child = graph.add_file(FileNode::new(
                        canonical.clone(),
                        kind,
                        hit.origin,
                        Some((id, ref_idx)),
                    ));
                    if kind == FileKind::Source {
                        discovered.push(child);
                    }

                    if matches!(origin, Origin::Library(_)) {
                        if let Some(dir) = canonical.parent() {
                            if swept_dirs.insert(dir.to_path_buf()) {
                                for ancillary in sweep_ancillary(dir, &patterns) {
                                    graph.add_ancillary(ancillary, child);
                                }
                            }
                        }
                    }

                    child
                }
            };

            graph.add_edge(id, child, reference.kind());
        }

        graph.set_references(id, references);
        stack.extend(discovered.into_iter().rev());
    }

    Ok(Resolution { graph, skipped })
}

fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!("ignoring invalid ancillary pattern `{p}`: {err}");
                None
            }
        })
        .collect()
}

/// Collect ancillary files directly inside `dir`, name-sorted so the
/// result does not depend on readdir order.
fn sweep_ancillary(dir: &Path, patterns: &[glob::Pattern]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if patterns.iter().any(|p| p.matches_with(&name, ANCILLARY_MATCH)) {
            tracing::debug!("ancillary {}", entry.path().display());
            found.push(entry.into_path());
        }
    }
    found
}
