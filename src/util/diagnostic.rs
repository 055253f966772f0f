//! User-friendly diagnostic messages.
//!
//! Every resolution failure must name the file (and line, when known) it
//! came from and suggest a way out; warnings from relaxed mode render
//! through the same type so output stays uniform.

use std::fmt;
use std::path::PathBuf;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a static reference cannot be resolved.
    pub const ADD_LIBRARY_ROOT: &str =
        "help: pass additional search roots with `--library <DIR>`";

    /// Suggestion to continue past unresolved references.
    pub const RELAXED_MODE: &str =
        "help: run with `--relaxed` to record unresolved references as warnings and continue";

    /// Suggestion when an import() target is computed at runtime.
    pub const DYNAMIC_IMPORT: &str =
        "help: runtime-computed import() targets cannot be resolved statically; \
         bundle the file explicitly with `--add <GLOB>`";

    /// Suggestion to ignore import() directives entirely.
    pub const SKIP_IMPORTS: &str =
        "help: run with `--skip-imports` to ignore import() directives";

    /// Suggestion when the output directory already exists.
    pub const OVERWRITE: &str =
        "help: pass `--overwrite` to replace the existing output directory";

    /// Suggestion when two files claim the same destination.
    pub const RENAME_COLLISION: &str =
        "help: rename one of the colliding files, or give each library its own root";

    /// Suggestion to inspect a resolution without copying anything.
    pub const DRY_RUN: &str =
        "help: run `scadpack check <FILE>` to inspect the resolution without copying";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path, optional 1-based line)
    pub location: Option<(PathBuf, Option<u32>)>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some((path.into(), None));
        self
    }

    /// Add a file location with a 1-based line number.
    pub fn with_location_line(mut self, path: impl Into<PathBuf>, line: u32) -> Self {
        self.location = Some((path.into(), Some(line)));
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        // Severity prefix with optional color
        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        // Main message
        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        // Location if present
        match &self.location {
            Some((path, Some(line))) => {
                output.push_str(&format!("  --> {}:{}\n", path.display(), line));
            }
            Some((path, None)) => {
                output.push_str(&format!("  --> {}\n", path.display()));
            }
            None => {}
        }

        // Context lines
        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        // Suggestions
        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
