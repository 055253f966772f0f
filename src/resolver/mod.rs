//! Dependency resolution.
//!
//! This module turns an entry file into a resolved file graph and a copy
//! manifest: scan source text for directives, resolve each literal target
//! against the search roots, walk the result into a DependencyGraph, and
//! assemble bundle destinations. Everything except the walk itself is
//! pure; all filesystem reads happen inside `resolve`.

pub mod assemble;
pub mod errors;
pub mod paths;
pub mod scanner;
pub mod walker;

pub use assemble::assemble;
pub use errors::{ResolveError, ScanError};
pub use paths::{FileProbe, FsProbe, Resolved};
pub use scanner::scan;
pub use walker::{resolve, Resolution, ResolveOptions, SkipReason, SkippedReference};
