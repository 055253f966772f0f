//! Library search roots.
//!
//! A SearchPath is the ordered list of directories a reference target is
//! resolved against after the referencing file's own directory. Order is
//! significant: the first root containing the target wins and later roots
//! are never consulted.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Environment variable holding extra library locations, in the platform's
/// path-list syntax (same variable OpenSCAD itself honors).
pub const OPENSCADPATH: &str = "OPENSCADPATH";

/// Built-in filename globs for ancillary files collected beside library
/// files. Matched case-insensitively against file names only.
pub const DEFAULT_ANCILLARY_PATTERNS: &[&str] = &[
    "license*",
    "licence*",
    "copying*",
    "copyright*",
    "readme*",
    "changelog*",
    "notice*",
];

/// An ordered list of library roots.
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    /// Create an empty search path.
    pub fn new() -> Self {
        SearchPath { roots: Vec::new() }
    }

    /// Append a root, keeping the list duplicate-free. The first occurrence
    /// of a root keeps its position.
    pub fn push_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    /// Append several roots in order.
    pub fn extend_roots<I, P>(&mut self, roots: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for root in roots {
            self.push_root(root);
        }
    }

    /// Get the roots in search order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if there are no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Default library locations: `OPENSCADPATH` entries first, then the
/// platform's conventional OpenSCAD library directory.
pub fn default_library_roots() -> Vec<PathBuf> {
    let mut roots = openscadpath_roots(env::var_os(OPENSCADPATH).as_deref());
    if let Some(platform) = platform_library_root() {
        roots.push(platform);
    }
    roots
}

/// Parse an `OPENSCADPATH`-style value into individual roots.
pub fn openscadpath_roots(value: Option<&OsStr>) -> Vec<PathBuf> {
    match value {
        Some(value) => env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// The platform's conventional OpenSCAD library directory:
/// `Documents/OpenSCAD/libraries` on Windows and macOS,
/// `~/.local/share/OpenSCAD/libraries` elsewhere.
pub fn platform_library_root() -> Option<PathBuf> {
    if cfg!(any(windows, target_os = "macos")) {
        directories::UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(Path::to_path_buf))
            .map(|docs| docs.join("OpenSCAD").join("libraries"))
    } else {
        directories::BaseDirs::new()
            .map(|dirs| dirs.data_dir().join("OpenSCAD").join("libraries"))
    }
}
