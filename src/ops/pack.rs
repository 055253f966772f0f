//! The pack operation.
//!
//! Resolves an entry file's dependency graph, assembles the copy
//! manifest, and materializes the bundle in the output directory.
//! `--plan` stops after assembly and prints the manifest as JSON instead
//! of copying.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::HumanBytes;

use crate::core::graph::{DependencyGraph, Origin};
use crate::core::manifest::{CopyManifest, EntryRole, InsertOutcome, ManifestEntry};
use crate::core::search::{SearchPath, DEFAULT_ANCILLARY_PATTERNS};
use crate::resolver::{self, ResolveOptions};
use crate::util::diagnostic::{self, suggestions, Diagnostic};
use crate::util::fs::{
    copy_file, ensure_dir, escapes_base, glob_files, relative_path, remove_dir_all_if_exists,
};
use crate::util::shell::{Shell, Status};

/// Default bundle subdirectory for files resolved via library roots.
pub const DEFAULT_LIBRARY_DIR: &str = "lib";

/// Options for packing a design into a bundle.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// The entry `.scad` file
    pub entry: PathBuf,

    /// Directory the bundle is written to
    pub output_dir: PathBuf,

    /// Library roots, in search order
    pub search: SearchPath,

    /// Bundle subdirectory for library files; `.` means the bundle root
    pub library_dir: PathBuf,

    /// Demote unresolved and dynamic references to warnings
    pub relaxed: bool,

    /// Do not follow `import()` directives
    pub skip_imports: bool,

    /// Filename globs for ancillary files
    pub ancillary_patterns: Vec<String>,

    /// Extra file globs, relative to the entry file's directory
    pub add: Vec<String>,

    /// Delete an existing output directory first
    pub overwrite: bool,

    /// Print the manifest as JSON and copy nothing
    pub plan: bool,
}

impl PackOptions {
    /// Create pack options for an entry file and output directory.
    pub fn new(entry: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        PackOptions {
            entry: entry.into(),
            output_dir: output_dir.into(),
            search: SearchPath::new(),
            library_dir: PathBuf::from(DEFAULT_LIBRARY_DIR),
            relaxed: false,
            skip_imports: false,
            ancillary_patterns: DEFAULT_ANCILLARY_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            add: Vec::new(),
            overwrite: false,
            plan: false,
        }
    }

    /// Set the library roots.
    pub fn with_search(mut self, search: SearchPath) -> Self {
        self.search = search;
        self
    }

    /// Set the bundle subdirectory for library files.
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = dir.into();
        self
    }

    /// Set relaxed mode.
    pub fn with_relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    /// Set whether `import()` directives are followed.
    pub fn with_skip_imports(mut self, skip: bool) -> Self {
        self.skip_imports = skip;
        self
    }

    /// Set the ancillary filename globs.
    pub fn with_ancillary_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ancillary_patterns = patterns;
        self
    }

    /// Set extra file globs to merge into the bundle.
    pub fn with_add(mut self, globs: Vec<String>) -> Self {
        self.add = globs;
        self
    }

    /// Set overwrite mode.
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set plan mode.
    pub fn with_plan(mut self, plan: bool) -> Self {
        self.plan = plan;
        self
    }
}

/// Result of a pack run.
#[derive(Debug, Clone)]
pub struct PackResult {
    /// The assembled manifest, including any `--add` entries
    pub manifest: CopyManifest,

    /// Files actually copied (zero in plan mode)
    pub files_copied: usize,

    /// Bytes copied (zero in plan mode)
    pub total_size: u64,

    /// References skipped with a warning
    pub warnings: usize,

    /// Manifest digest, stable for a given input tree
    pub digest: String,
}

/// Pack an entry file and everything it references into a bundle.
pub fn pack(shell: &Shell, opts: &PackOptions) -> Result<PackResult> {
    shell.status(Status::Resolving, opts.entry.display());

    let resolve_opts = ResolveOptions {
        relaxed: opts.relaxed,
        skip_imports: opts.skip_imports,
        ancillary_patterns: opts.ancillary_patterns.clone(),
    };
    let resolution = match resolver::resolve(&opts.entry, &opts.search, &resolve_opts) {
        Ok(resolution) => resolution,
        Err(err) => {
            diagnostic::emit(&err.to_diagnostic(), shell.use_color());
            bail!("resolution failed for {}", opts.entry.display());
        }
    };

    for skipped in &resolution.skipped {
        diagnostic::emit(&skipped.to_diagnostic(), shell.use_color());
    }

    let mut manifest = match resolver::assemble(&resolution.graph, &opts.library_dir) {
        Ok(manifest) => manifest,
        Err(err) => {
            let diag = err
                .to_diagnostic()
                .with_suggestion(suggestions::DRY_RUN.to_string());
            diagnostic::emit(&diag, shell.use_color());
            bail!("could not lay out the bundle for {}", opts.entry.display());
        }
    };

    merge_added_files(shell, &mut manifest, &opts.entry, &opts.add)?;
    let digest = manifest.digest();

    if opts.plan {
        let plan = serde_json::to_string_pretty(manifest.entries())
            .context("failed to serialize the copy plan")?;
        println!("{plan}");
        return Ok(PackResult {
            manifest,
            files_copied: 0,
            total_size: 0,
            warnings: resolution.skipped.len(),
            digest,
        });
    }

    if opts.output_dir.exists() {
        if opts.overwrite {
            shell.warn(format!(
                "replacing existing {}",
                opts.output_dir.display()
            ));
            remove_dir_all_if_exists(&opts.output_dir)?;
        } else {
            let diag = Diagnostic::error(format!(
                "output directory already exists: {}",
                opts.output_dir.display()
            ))
            .with_suggestion(suggestions::OVERWRITE.to_string());
            diagnostic::emit(&diag, shell.use_color());
            bail!(
                "output directory already exists: {}",
                opts.output_dir.display()
            );
        }
    }
    ensure_dir(&opts.output_dir)?;

    shell.status(
        Status::Copying,
        format!("{} files into {}", manifest.len(), opts.output_dir.display()),
    );
    let mut progress = shell.progress(manifest.len() as u64, "copying");
    let mut total_size = 0u64;
    for entry in manifest.entries() {
        let dest = opts.output_dir.join(&entry.destination);
        total_size += copy_file(&entry.source, &dest)?;
        tracing::debug!("copied {} -> {}", entry.source.display(), dest.display());
        progress.inc(1);
    }
    progress.finish();

    shell.status(
        Status::Finished,
        format!(
            "{} files, {} in {}",
            manifest.len(),
            HumanBytes(total_size),
            opts.output_dir.display()
        ),
    );
    print_hints(shell, opts, &resolution.graph);

    Ok(PackResult {
        files_copied: manifest.len(),
        total_size,
        warnings: resolution.skipped.len(),
        digest,
        manifest,
    })
}

/// Merge `--add` glob matches into the manifest. Matches are rooted at the
/// entry file's directory and keep their relative paths; destinations
/// already claimed by the resolution are left alone.
fn merge_added_files(
    shell: &Shell,
    manifest: &mut CopyManifest,
    entry: &Path,
    globs: &[String],
) -> Result<()> {
    if globs.is_empty() {
        return Ok(());
    }

    let canonical = entry
        .canonicalize()
        .with_context(|| format!("failed to canonicalize {}", entry.display()))?;
    let entry_dir = canonical.parent().unwrap_or(Path::new("/"));

    for file in glob_files(entry_dir, globs)? {
        let destination = relative_path(entry_dir, &file);
        if destination.as_os_str().is_empty()
            || destination.is_absolute()
            || escapes_base(&destination)
        {
            tracing::warn!("--add match outside the entry tree: {}", file.display());
            continue;
        }

        match manifest.insert(ManifestEntry {
            destination: destination.clone(),
            source: file,
            role: EntryRole::Added,
        }) {
            InsertOutcome::Inserted => {
                shell.status(Status::Added, destination.display());
            }
            InsertOutcome::Duplicate | InsertOutcome::Collision { .. } => {
                tracing::debug!("--add skipping claimed {}", destination.display());
            }
        }
    }

    Ok(())
}

fn print_hints(shell: &Shell, opts: &PackOptions, graph: &DependencyGraph) {
    let Some(entry_name) = opts.entry.file_name() else {
        return;
    };
    let bundled_entry = opts.output_dir.join(entry_name);
    let libraries_bundled = opts.library_dir != Path::new(".")
        && graph
            .files()
            .any(|(_, node)| matches!(node.origin(), Origin::Library(_)));
    let lib_root = opts.output_dir.join(&opts.library_dir);

    if which::which("openscad").is_ok() {
        if libraries_bundled {
            shell.note(format!(
                "open with: OPENSCADPATH={} openscad {}",
                lib_root.display(),
                bundled_entry.display()
            ));
        } else {
            shell.note(format!("open with: openscad {}", bundled_entry.display()));
        }
    } else if libraries_bundled {
        shell.note(format!(
            "set OPENSCADPATH={} when opening the bundle",
            lib_root.display()
        ));
    }

    shell.note(format!(
        "share with: zip -r {0}.zip {0}",
        opts.output_dir.display()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    fn quiet_shell() -> Shell {
        Shell::new(Verbosity::Quiet, ColorChoice::Never)
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn fixture(tmp: &TempDir) -> (PathBuf, SearchPath) {
        let entry = write(
            tmp.path(),
            "design/main.scad",
            "include <util.scad>\nuse <gears/spur.scad>\n",
        );
        write(tmp.path(), "design/util.scad", "u = 1;\n");
        write(tmp.path(), "libs/gears/spur.scad", "s = 1;\n");
        write(tmp.path(), "libs/gears/LICENSE", "MIT\n");

        let mut search = SearchPath::new();
        search.push_root(tmp.path().join("libs"));
        (entry, search)
    }

    #[test]
    fn test_pack_copies_bundle() {
        let tmp = TempDir::new().unwrap();
        let (entry, search) = fixture(&tmp);
        let out = tmp.path().join("bundle");

        let opts = PackOptions::new(&entry, &out).with_search(search);
        let result = pack(&quiet_shell(), &opts).unwrap();

        assert_eq!(result.files_copied, 4);
        assert!(result.warnings == 0);
        assert!(out.join("main.scad").is_file());
        assert!(out.join("util.scad").is_file());
        assert!(out.join("lib/gears/spur.scad").is_file());
        assert!(out.join("lib/gears/LICENSE").is_file());
        assert_eq!(
            fs::read_to_string(out.join("util.scad")).unwrap(),
            "u = 1;\n"
        );
    }

    #[test]
    fn test_pack_plan_copies_nothing() {
        let tmp = TempDir::new().unwrap();
        let (entry, search) = fixture(&tmp);
        let out = tmp.path().join("bundle");

        let opts = PackOptions::new(&entry, &out)
            .with_search(search)
            .with_plan(true);
        let result = pack(&quiet_shell(), &opts).unwrap();

        assert_eq!(result.files_copied, 0);
        assert_eq!(result.manifest.len(), 4);
        assert!(!out.exists());
    }

    #[test]
    fn test_pack_existing_output_needs_overwrite() {
        let tmp = TempDir::new().unwrap();
        let (entry, search) = fixture(&tmp);
        let out = tmp.path().join("bundle");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.txt"), "old").unwrap();

        let opts = PackOptions::new(&entry, &out).with_search(search.clone());
        let err = pack(&quiet_shell(), &opts).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        let opts = PackOptions::new(&entry, &out)
            .with_search(search)
            .with_overwrite(true);
        pack(&quiet_shell(), &opts).unwrap();
        assert!(!out.join("stale.txt").exists());
        assert!(out.join("main.scad").is_file());
    }

    #[test]
    fn test_pack_add_globs_merge() {
        let tmp = TempDir::new().unwrap();
        let (entry, search) = fixture(&tmp);
        write(tmp.path(), "design/docs/notes.txt", "printed at 0.2mm\n");
        let out = tmp.path().join("bundle");

        // the *.scad glob re-matches files the resolution already placed
        let opts = PackOptions::new(&entry, &out)
            .with_search(search)
            .with_add(vec!["docs/*.txt".to_string(), "*.scad".to_string()]);
        let result = pack(&quiet_shell(), &opts).unwrap();

        assert!(out.join("docs/notes.txt").is_file());
        assert_eq!(result.files_copied, 5);
        let roles: Vec<_> = result
            .manifest
            .entries()
            .iter()
            .filter(|e| e.role == EntryRole::Added)
            .collect();
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn test_pack_relaxed_counts_warnings() {
        let tmp = TempDir::new().unwrap();
        let entry = write(
            tmp.path(),
            "main.scad",
            "include <ghost.scad>\nimport(name);\n",
        );
        let out = tmp.path().join("bundle");

        let opts = PackOptions::new(&entry, &out).with_relaxed(true);
        let result = pack(&quiet_shell(), &opts).unwrap();

        assert_eq!(result.warnings, 2);
        assert_eq!(result.files_copied, 1);
        assert!(out.join("main.scad").is_file());
    }

    #[test]
    fn test_pack_digest_stable_across_runs() {
        let tmp = TempDir::new().unwrap();
        let (entry, search) = fixture(&tmp);
        let out = tmp.path().join("bundle");

        let opts = PackOptions::new(&entry, &out)
            .with_search(search)
            .with_overwrite(true);
        let first = pack(&quiet_shell(), &opts).unwrap();
        let second = pack(&quiet_shell(), &opts).unwrap();

        assert_eq!(first.digest, second.digest);
    }

    #[test]
    fn test_pack_strict_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let entry = write(tmp.path(), "main.scad", "include <ghost.scad>\n");
        let out = tmp.path().join("bundle");

        let opts = PackOptions::new(&entry, &out);
        let err = pack(&quiet_shell(), &opts).unwrap_err();
        assert!(err.to_string().contains("resolution failed"));
        assert!(!out.exists());
    }
}
