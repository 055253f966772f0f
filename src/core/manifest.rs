//! The copy manifest.
//!
//! A CopyManifest is the assembler's output: an ordered list of
//! (destination, source) pairs with no filesystem side effects of its own.
//! Destination uniqueness is an invariant of the structure; `insert`
//! reports the collision instead of silently overwriting.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::hash::Fingerprint;

/// Why an entry is in the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRole {
    /// The entry file itself
    Entry,
    /// Scannable source reached via include/use
    Source,
    /// Geometry/data file reached via import()
    Asset,
    /// License/readme file found beside a library file
    Ancillary,
    /// Extra file matched by an --add glob
    Added,
}

impl EntryRole {
    /// Stable name used in plan output and digests.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryRole::Entry => "entry",
            EntryRole::Source => "source",
            EntryRole::Asset => "asset",
            EntryRole::Ancillary => "ancillary",
            EntryRole::Added => "added",
        }
    }
}

impl fmt::Display for EntryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file to copy into the bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Bundle-relative destination path
    pub destination: PathBuf,

    /// Absolute source path
    pub source: PathBuf,

    /// Why it is in the bundle
    pub role: EntryRole,
}

/// Outcome of inserting an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// New destination claimed.
    Inserted,
    /// Same destination and source already present; nothing added.
    Duplicate,
    /// Same destination already claimed by a different source.
    Collision {
        /// The entry that got there first
        existing: ManifestEntry,
    },
}

/// Ordered mapping of bundle destinations to sources.
#[derive(Debug, Clone, Default)]
pub struct CopyManifest {
    /// Entries in assembly order
    entries: Vec<ManifestEntry>,

    /// Destination to entry index, for collision detection
    by_destination: HashMap<PathBuf, usize>,
}

impl CopyManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        CopyManifest::default()
    }

    /// Insert an entry, enforcing destination uniqueness.
    pub fn insert(&mut self, entry: ManifestEntry) -> InsertOutcome {
        if let Some(&index) = self.by_destination.get(&entry.destination) {
            let existing = &self.entries[index];
            if existing.source == entry.source {
                return InsertOutcome::Duplicate;
            }
            return InsertOutcome::Collision {
                existing: existing.clone(),
            };
        }

        self.by_destination
            .insert(entry.destination.clone(), self.entries.len());
        self.entries.push(entry);
        InsertOutcome::Inserted
    }

    /// Look up the entry claiming a destination.
    pub fn get(&self, destination: &Path) -> Option<&ManifestEntry> {
        self.by_destination
            .get(destination)
            .map(|&index| &self.entries[index])
    }

    /// Check if a destination is claimed.
    pub fn contains_destination(&self, destination: &Path) -> bool {
        self.by_destination.contains_key(destination)
    }

    /// Get the entries in assembly order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// SHA-256 digest over the ordered (destination, source, role) entries.
    /// Equal trees resolved the same way produce equal digests.
    pub fn digest(&self) -> String {
        let mut fp = Fingerprint::new();
        for entry in &self.entries {
            fp.update_str(&entry.destination.to_string_lossy());
            fp.update_str(&entry.source.to_string_lossy());
            fp.update_str(entry.role.as_str());
        }
        fp.finish()
    }
}
