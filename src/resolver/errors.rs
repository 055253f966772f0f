//! Resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::reference::RefKind;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while scanning a single source text.
///
/// Scan errors carry the 1-based line they were detected on; the walker
/// wraps them with the file they came from.
#[derive(Debug, Clone, Error, MietteDiagnostic, PartialEq, Eq)]
pub enum ScanError {
    #[error("`{kind}` path opened on line {line} is never closed")]
    #[diagnostic(code(scadpack::scan::unterminated_path))]
    UnterminatedPath { kind: RefKind, line: u32 },

    #[error("`import(` on line {line} is never closed")]
    #[diagnostic(code(scadpack::scan::unterminated_import))]
    UnterminatedImport { line: u32 },

    #[error("string opened on line {line} is never closed")]
    #[diagnostic(code(scadpack::scan::unterminated_string))]
    UnterminatedString { line: u32 },
}

impl ScanError {
    /// The 1-based line the error was detected on.
    pub fn line(&self) -> u32 {
        match self {
            ScanError::UnterminatedPath { line, .. }
            | ScanError::UnterminatedImport { line }
            | ScanError::UnterminatedString { line } => *line,
        }
    }
}

/// Error during dependency resolution or manifest assembly.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ResolveError {
    #[error("entry file not found: {}", .path.display())]
    #[diagnostic(code(scadpack::resolve::missing_entry))]
    MissingEntryFile { path: PathBuf },

    #[error("entry path is not a file: {}", .path.display())]
    #[diagnostic(code(scadpack::resolve::bad_entry))]
    BadEntryFile { path: PathBuf },

    #[error("failed to read {}: {source}", .file.display())]
    #[diagnostic(code(scadpack::resolve::read))]
    Read {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan {}: {source}", .file.display())]
    #[diagnostic(code(scadpack::resolve::scan))]
    Scan {
        file: PathBuf,
        #[source]
        source: ScanError,
    },

    #[error("could not resolve `{directive}` in {}", .file.display())]
    #[diagnostic(code(scadpack::resolve::unresolved))]
    UnresolvedReference {
        file: PathBuf,
        directive: String,
        line: u32,
        searched: Vec<PathBuf>,
    },

    #[error("import target in {} is computed at runtime", .file.display())]
    #[diagnostic(code(scadpack::resolve::dynamic_import))]
    DynamicImport {
        file: PathBuf,
        directive: String,
        line: u32,
    },

    #[error("two files map to the same bundle path `{}`", .destination.display())]
    #[diagnostic(code(scadpack::assemble::collision))]
    DestinationCollision {
        destination: PathBuf,
        first_source: PathBuf,
        second_source: PathBuf,
    },

    #[error("`{directive}` in {} escapes the bundle root", .file.display())]
    #[diagnostic(code(scadpack::assemble::escape))]
    DestinationEscape {
        file: PathBuf,
        directive: String,
        destination: PathBuf,
    },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::MissingEntryFile { path } => {
                Diagnostic::error(format!("entry file not found: {}", path.display()))
                    .with_suggestion("Check that the path is spelled correctly".to_string())
            }

            ResolveError::BadEntryFile { path } => {
                Diagnostic::error(format!("entry path is not a file: {}", path.display()))
                    .with_context("the entry must be a single .scad design file".to_string())
            }

            ResolveError::Read { file, source } => {
                Diagnostic::error(format!("failed to read {}: {}", file.display(), source))
                    .with_location(file.clone())
            }

            ResolveError::Scan { file, source } => {
                Diagnostic::error(format!("malformed directive: {}", source))
                    .with_location_line(file.clone(), source.line())
            }

            ResolveError::UnresolvedReference {
                file,
                directive,
                line,
                searched,
            } => {
                let mut diag =
                    Diagnostic::error(format!("could not resolve `{}`", directive))
                        .with_location_line(file.clone(), *line);

                if searched.is_empty() {
                    diag = diag.with_context(
                        "no library roots configured; only the file's own directory was searched"
                            .to_string(),
                    );
                } else {
                    diag = diag.with_context(format!(
                        "searched {} library root{}",
                        searched.len(),
                        if searched.len() == 1 { "" } else { "s" }
                    ));
                    for root in searched {
                        diag = diag.with_context(format!("  {}", root.display()));
                    }
                }

                diag.with_suggestion(suggestions::ADD_LIBRARY_ROOT.to_string())
                    .with_suggestion(suggestions::RELAXED_MODE.to_string())
            }

            ResolveError::DynamicImport {
                file,
                directive,
                line,
            } => Diagnostic::error(format!(
                "import target is computed at runtime: `{}`",
                directive
            ))
            .with_location_line(file.clone(), *line)
            .with_suggestion(suggestions::DYNAMIC_IMPORT.to_string())
            .with_suggestion(suggestions::SKIP_IMPORTS.to_string())
            .with_suggestion(suggestions::RELAXED_MODE.to_string()),

            ResolveError::DestinationCollision {
                destination,
                first_source,
                second_source,
            } => Diagnostic::error(format!(
                "two files map to the same bundle path `{}`",
                destination.display()
            ))
            .with_context(format!("first:  {}", first_source.display()))
            .with_context(format!("second: {}", second_source.display()))
            .with_suggestion(suggestions::RENAME_COLLISION.to_string()),

            ResolveError::DestinationEscape {
                file,
                directive,
                destination,
            } => Diagnostic::error(format!(
                "`{}` would land outside the bundle at `{}`",
                directive,
                destination.display()
            ))
            .with_location(file.clone())
            .with_context(
                "relative references may not climb above the bundle root".to_string(),
            )
            .with_suggestion(
                "Move the referenced file under the entry file's directory, or \
                 reach it through a library root"
                    .to_string(),
            ),
        }
    }
}
