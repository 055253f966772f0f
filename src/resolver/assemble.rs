//! Manifest assembly.
//!
//! Turns a finished DependencyGraph into a CopyManifest. No filesystem
//! mutation happens here; the pack operation copies afterwards.
//!
//! Destination scheme:
//! - the entry file keeps its file name at the bundle root;
//! - a file matched via library root R with target spec T lands at
//!   `<lib_dir>/T` (an absolute T is first stripped of R);
//! - a file matched beside its referrer lands at the referrer's
//!   destination directory joined with T, lexically normalized;
//! - ancillary files land in the destination directory of their
//!   library file.
//!
//! Files are visited in discovery order, so a referrer's destination is
//! always assigned before its discoveree needs it, and the first claim
//! on a destination wins. A second distinct source claiming the same
//! destination is fatal, as is a normalized destination outside the
//! bundle root.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::graph::{DependencyGraph, FileId, FileKind, Origin};
use crate::core::manifest::{CopyManifest, EntryRole, InsertOutcome, ManifestEntry};
use crate::util::fs::{escapes_base, normalize_lexical};

use super::errors::ResolveError;

/// Compute bundle destinations for every file in the graph.
pub fn assemble(
    graph: &DependencyGraph,
    lib_dir: &Path,
) -> Result<CopyManifest, ResolveError> {
    let mut manifest = CopyManifest::new();
    let mut destinations: HashMap<FileId, PathBuf> = HashMap::new();

    for (id, node) in graph.files() {
        if id == graph.entry() {
            let name = node
                .path()
                .file_name()
                .ok_or_else(|| ResolveError::BadEntryFile {
                    path: node.path().to_path_buf(),
                })?;
            let destination = PathBuf::from(name);
            claim(
                &mut manifest,
                ManifestEntry {
                    destination: destination.clone(),
                    source: node.path().to_path_buf(),
                    role: EntryRole::Entry,
                },
            )?;
            destinations.insert(id, destination);
            continue;
        }

        // Non-entry nodes always record the reference that found them.
        let Some((referrer, ref_idx)) = node.discovered_via() else {
            continue;
        };
        let reference = &graph.file(referrer).references()[ref_idx];
        let Some(target) = reference.literal_path() else {
            continue;
        };

        let raw = match node.origin() {
            Origin::Entry => continue,
            Origin::Library(root) => {
                let spec = if target.is_absolute() {
                    target.strip_prefix(root).unwrap_or(target)
                } else {
                    target
                };
                lib_dir.join(spec)
            }
            Origin::Relative => {
                let base = destinations
                    .get(&referrer)
                    .and_then(|d| d.parent())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                base.join(target)
            }
        };

        let destination = normalize_lexical(&raw);
        if destination.as_os_str().is_empty()
            || destination.is_absolute()
            || escapes_base(&destination)
        {
            return Err(ResolveError::DestinationEscape {
                file: graph.file(referrer).path().to_path_buf(),
                directive: reference.directive().to_string(),
                destination,
            });
        }

        let role = match node.kind() {
            FileKind::Source => EntryRole::Source,
            FileKind::Asset => EntryRole::Asset,
        };
        claim(
            &mut manifest,
            ManifestEntry {
                destination: destination.clone(),
                source: node.path().to_path_buf(),
                role,
            },
        )?;
        destinations.insert(id, destination);
    }

    for ancillary in graph.ancillary() {
        let Some(library_dest) = destinations.get(&ancillary.library()) else {
            continue;
        };
        let Some(name) = ancillary.path().file_name() else {
            continue;
        };
        let dir = library_dest.parent().unwrap_or(Path::new(""));
        claim(
            &mut manifest,
            ManifestEntry {
                destination: dir.join(name),
                source: ancillary.path().to_path_buf(),
                role: EntryRole::Ancillary,
            },
        )?;
    }

    Ok(manifest)
}

fn claim(manifest: &mut CopyManifest, entry: ManifestEntry) -> Result<(), ResolveError> {
    let destination = entry.destination.clone();
    let source = entry.source.clone();
    match manifest.insert(entry) {
        InsertOutcome::Inserted | InsertOutcome::Duplicate => Ok(()),
        InsertOutcome::Collision { existing } => Err(ResolveError::DestinationCollision {
            destination,
            first_source: existing.source,
            second_source: source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::FileNode;
    use crate::core::reference::{RefKind, Reference};

    fn entry_graph() -> DependencyGraph {
        DependencyGraph::new(FileNode::new(
            "/work/main.scad",
            FileKind::Source,
            Origin::Entry,
            None,
        ))
    }

    fn lib() -> PathBuf {
        PathBuf::from("lib")
    }

    #[test]
    fn test_entry_relative_and_library_placement() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![
                Reference::literal(RefKind::Include, "sub/a.scad", 1, "include <sub/a.scad>"),
                Reference::literal(RefKind::Use, "BOSL2/std.scad", 2, "use <BOSL2/std.scad>"),
                Reference::literal(RefKind::Import, "motor.stl", 3, "import(\"motor.stl\")"),
            ],
        );
        graph.add_file(FileNode::new(
            "/work/sub/a.scad",
            FileKind::Source,
            Origin::Relative,
            Some((FileId::ENTRY, 0)),
        ));
        graph.add_file(FileNode::new(
            "/libs/BOSL2/std.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/libs")),
            Some((FileId::ENTRY, 1)),
        ));
        graph.add_file(FileNode::new(
            "/work/motor.stl",
            FileKind::Asset,
            Origin::Relative,
            Some((FileId::ENTRY, 2)),
        ));

        let manifest = assemble(&graph, &lib()).unwrap();
        let entries = manifest.entries();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].destination, PathBuf::from("main.scad"));
        assert_eq!(entries[0].role, EntryRole::Entry);
        assert_eq!(entries[1].destination, PathBuf::from("sub/a.scad"));
        assert_eq!(entries[1].role, EntryRole::Source);
        assert_eq!(entries[2].destination, PathBuf::from("lib/BOSL2/std.scad"));
        assert_eq!(entries[3].destination, PathBuf::from("motor.stl"));
        assert_eq!(entries[3].role, EntryRole::Asset);
    }

    #[test]
    fn test_relative_hit_lands_beside_referrer() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Include,
                "sub/a.scad",
                1,
                "include <sub/a.scad>",
            )],
        );
        let a = graph.add_file(FileNode::new(
            "/work/sub/a.scad",
            FileKind::Source,
            Origin::Relative,
            Some((FileId::ENTRY, 0)),
        ));
        graph.set_references(
            a,
            vec![Reference::literal(
                RefKind::Include,
                "../shared.scad",
                1,
                "include <../shared.scad>",
            )],
        );
        graph.add_file(FileNode::new(
            "/work/shared.scad",
            FileKind::Source,
            Origin::Relative,
            Some((a, 0)),
        ));

        let manifest = assemble(&graph, &lib()).unwrap();

        assert_eq!(
            manifest.entries()[2].destination,
            PathBuf::from("shared.scad")
        );
    }

    #[test]
    fn test_escape_above_bundle_root_is_fatal() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Include,
                "../outside.scad",
                4,
                "include <../outside.scad>",
            )],
        );
        graph.add_file(FileNode::new(
            "/outside.scad",
            FileKind::Source,
            Origin::Relative,
            Some((FileId::ENTRY, 0)),
        ));

        let err = assemble(&graph, &lib()).unwrap_err();
        match err {
            ResolveError::DestinationEscape {
                file, destination, ..
            } => {
                assert_eq!(file, PathBuf::from("/work/main.scad"));
                assert_eq!(destination, PathBuf::from("../outside.scad"));
            }
            other => panic!("expected DestinationEscape, got {other:?}"),
        }
    }

    #[test]
    fn test_absolute_target_without_root_is_fatal() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Include,
                "/elsewhere/part.scad",
                2,
                "include </elsewhere/part.scad>",
            )],
        );
        graph.add_file(FileNode::new(
            "/elsewhere/part.scad",
            FileKind::Source,
            Origin::Relative,
            Some((FileId::ENTRY, 0)),
        ));

        let err = assemble(&graph, &lib()).unwrap_err();
        assert!(matches!(err, ResolveError::DestinationEscape { .. }));
    }

    #[test]
    fn test_same_spec_under_two_roots_collides() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![
                Reference::literal(RefKind::Include, "util.scad", 1, "include <util.scad>"),
                Reference::literal(RefKind::Use, "util.scad", 9, "use <util.scad>"),
            ],
        );
        graph.add_file(FileNode::new(
            "/roots/a/util.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/roots/a")),
            Some((FileId::ENTRY, 0)),
        ));
        graph.add_file(FileNode::new(
            "/roots/b/util.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/roots/b")),
            Some((FileId::ENTRY, 1)),
        ));

        let err = assemble(&graph, &lib()).unwrap_err();
        match err {
            ResolveError::DestinationCollision {
                destination,
                first_source,
                second_source,
            } => {
                assert_eq!(destination, PathBuf::from("lib/util.scad"));
                assert_eq!(first_source, PathBuf::from("/roots/a/util.scad"));
                assert_eq!(second_source, PathBuf::from("/roots/b/util.scad"));
            }
            other => panic!("expected DestinationCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_lib_dir_dot_places_libraries_at_root() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Use,
                "BOSL2/std.scad",
                1,
                "use <BOSL2/std.scad>",
            )],
        );
        graph.add_file(FileNode::new(
            "/libs/BOSL2/std.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/libs")),
            Some((FileId::ENTRY, 0)),
        ));

        let manifest = assemble(&graph, Path::new(".")).unwrap();

        assert_eq!(
            manifest.entries()[1].destination,
            PathBuf::from("BOSL2/std.scad")
        );
    }

    #[test]
    fn test_absolute_target_stripped_of_matching_root() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Include,
                "/libs/BOSL2/std.scad",
                1,
                "include </libs/BOSL2/std.scad>",
            )],
        );
        graph.add_file(FileNode::new(
            "/libs/BOSL2/std.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/libs")),
            Some((FileId::ENTRY, 0)),
        ));

        let manifest = assemble(&graph, &lib()).unwrap();

        assert_eq!(
            manifest.entries()[1].destination,
            PathBuf::from("lib/BOSL2/std.scad")
        );
    }

    #[test]
    fn test_ancillary_lands_beside_its_library() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![Reference::literal(
                RefKind::Include,
                "foo/foo.scad",
                1,
                "include <foo/foo.scad>",
            )],
        );
        let foo = graph.add_file(FileNode::new(
            "/libs/foo/foo.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/libs")),
            Some((FileId::ENTRY, 0)),
        ));
        graph.add_ancillary("/libs/foo/LICENSE", foo);

        let manifest = assemble(&graph, &lib()).unwrap();
        let entries = manifest.entries();

        assert_eq!(entries[2].destination, PathBuf::from("lib/foo/LICENSE"));
        assert_eq!(entries[2].role, EntryRole::Ancillary);
        assert_eq!(entries[2].source, PathBuf::from("/libs/foo/LICENSE"));
    }

    #[test]
    fn test_ancillary_collision_is_fatal() {
        let mut graph = entry_graph();
        graph.set_references(
            graph.entry(),
            vec![
                Reference::literal(RefKind::Include, "foo.scad", 1, "include <foo.scad>"),
                Reference::literal(RefKind::Use, "bar.scad", 2, "use <bar.scad>"),
            ],
        );
        let foo = graph.add_file(FileNode::new(
            "/roots/a/foo.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/roots/a")),
            Some((FileId::ENTRY, 0)),
        ));
        let bar = graph.add_file(FileNode::new(
            "/roots/b/bar.scad",
            FileKind::Source,
            Origin::Library(PathBuf::from("/roots/b")),
            Some((FileId::ENTRY, 1)),
        ));
        // both libraries land at lib/, both ship a README
        graph.add_ancillary("/roots/a/README.md", foo);
        graph.add_ancillary("/roots/b/README.md", bar);

        let err = assemble(&graph, &lib()).unwrap_err();
        assert!(matches!(err, ResolveError::DestinationCollision { .. }));
    }

    #[test]
    fn test_digest_stable_across_assemblies() {
        let build = || {
            let mut graph = entry_graph();
            graph.set_references(
                graph.entry(),
                vec![Reference::literal(
                    RefKind::Include,
                    "a.scad",
                    1,
                    "include <a.scad>",
                )],
            );
            graph.add_file(FileNode::new(
                "/work/a.scad",
                FileKind::Source,
                Origin::Relative,
                Some((FileId::ENTRY, 0)),
            ));
            assemble(&graph, &lib()).unwrap()
        };

        assert_eq!(build().digest(), build().digest());
    }
}
