//! Core data structures for scadpack.
//!
//! This module contains the foundational types used throughout scadpack:
//! - References extracted from source (kind, target, location)
//! - Search roots and their platform defaults
//! - The resolved dependency graph
//! - The copy manifest

pub mod graph;
pub mod manifest;
pub mod reference;
pub mod search;

pub use graph::{AncillaryFile, DependencyGraph, FileId, FileKind, FileNode, Origin};
pub use manifest::{CopyManifest, EntryRole, InsertOutcome, ManifestEntry};
pub use reference::{RefKind, Reference, TargetSpec};
pub use search::{SearchPath, DEFAULT_ANCILLARY_PATTERNS, OPENSCADPATH};
