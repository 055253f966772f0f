//! Candidate path resolution.
//!
//! Resolves a literal target spec to an existing file: the referencing
//! file's own directory is tried first, then the configured library roots
//! in order. The first hit wins and later roots are never consulted.
//! Dynamic targets never reach this module.

use std::path::{Path, PathBuf};

use crate::core::graph::Origin;
use crate::core::search::SearchPath;

/// Filesystem existence probe, injectable so resolution order is testable
/// without touching disk.
pub trait FileProbe {
    fn is_file(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Default)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// A successful resolution: the joined path (not yet canonicalized) plus
/// how it matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Resolve a literal target against the referencing file's directory and
/// the search roots.
///
/// Absolute targets are honored as written if the file exists; when one
/// sits under a configured root it counts as a library match so the
/// assembler can place it root-relative.
pub fn resolve_target(
    probe: &dyn FileProbe,
    target: &Path,
    referrer_dir: &Path,
    search: &SearchPath,
) -> Option<Resolved> {
    if target.is_absolute() {
        if probe.is_file(target) {
            let origin = search
                .roots()
                .iter()
                .find(|root| target.starts_with(root))
                .map(|root| Origin::Library(root.clone()))
                .unwrap_or(Origin::Relative);
            tracing::debug!("resolved absolute {} ({:?})", target.display(), origin);
            return Some(Resolved {
                path: target.to_path_buf(),
                origin,
            });
        }
        return None;
    }

    let candidate = referrer_dir.join(target);
    if probe.is_file(&candidate) {
        tracing::debug!("resolved {} beside referrer", target.display());
        return Some(Resolved {
            path: candidate,
            origin: Origin::Relative,
        });
    }

    for root in search.roots() {
        let candidate = root.join(target);
        tracing::debug!("probing {}", candidate.display());
        if probe.is_file(&candidate) {
            return Some(Resolved {
                path: candidate,
                origin: Origin::Library(root.clone()),
            });
        }
    }

    None
}
