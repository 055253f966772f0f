//! File references extracted from OpenSCAD source.
//!
//! A Reference is one `include`, `use`, or `import` directive found by the
//! scanner: what kind it is, what it points at, and where it was found.

use std::fmt;
use std::path::{Path, PathBuf};

/// The directive a reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `include <...>` - textual inclusion, target is scannable source
    Include,
    /// `use <...>` - module/function import, target is scannable source
    Use,
    /// `import("...")` - geometry/data load, target is an opaque asset
    Import,
}

impl RefKind {
    /// The source keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            RefKind::Include => "include",
            RefKind::Use => "use",
            RefKind::Import => "import",
        }
    }

    /// Whether the referenced file is itself OpenSCAD source to be scanned.
    pub fn is_scannable(&self) -> bool {
        matches!(self, RefKind::Include | RefKind::Use)
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// What a directive points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A path known at scan time, exactly as written in the source.
    Literal(PathBuf),
    /// A runtime-computed expression (`import(name * suffix)`); cannot be
    /// resolved statically.
    Dynamic(String),
}

/// A single file reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// What directive produced it
    kind: RefKind,

    /// What it points at
    target: TargetSpec,

    /// 1-based line the directive starts on
    line: u32,

    /// The directive text as written, for diagnostics
    directive: String,
}

impl Reference {
    /// Create a reference with a literal target path.
    pub fn literal(
        kind: RefKind,
        path: impl Into<PathBuf>,
        line: u32,
        directive: impl Into<String>,
    ) -> Self {
        Reference {
            kind,
            target: TargetSpec::Literal(path.into()),
            line,
            directive: directive.into(),
        }
    }

    /// Create a reference whose target is computed at runtime.
    pub fn dynamic(
        kind: RefKind,
        expr: impl Into<String>,
        line: u32,
        directive: impl Into<String>,
    ) -> Self {
        Reference {
            kind,
            target: TargetSpec::Dynamic(expr.into()),
            line,
            directive: directive.into(),
        }
    }

    /// Get the directive kind.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// Get the target specification.
    pub fn target(&self) -> &TargetSpec {
        &self.target
    }

    /// Get the 1-based line number the directive starts on.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Get the directive text as written in the source.
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Check if the target is computed at runtime.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.target, TargetSpec::Dynamic(_))
    }

    /// Get the literal target path, if there is one.
    pub fn literal_path(&self) -> Option<&Path> {
        match &self.target {
            TargetSpec::Literal(path) => Some(path),
            TargetSpec::Dynamic(_) => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Show the directive exactly as written
        f.write_str(&self.directive)
    }
}
