//! The resolved dependency graph.
//!
//! A DependencyGraph is the output of the resolution walk: one node per
//! distinct file (identity is the canonicalized path), edges labelled with
//! the directive kind that connects them, plus the ancillary files picked
//! up beside library files. The walker is the only mutator; everything
//! downstream reads it through `&` accessors.
//!
//! Nodes live in a table ordered by discovery, which is what makes the
//! assembled manifest deterministic for a given input tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::core::reference::{RefKind, Reference};

/// Index of a file in the graph's discovery-ordered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(usize);

impl FileId {
    /// The entry file always has index 0.
    pub const ENTRY: FileId = FileId(0);

    fn index(self) -> usize {
        self.0
    }
}

/// Whether a file is scannable source or an opaque asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// OpenSCAD source, scanned for further references
    Source,
    /// Geometry/data file reached via `import()`, never scanned
    Asset,
}

/// How the path resolver matched a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The entry file itself
    Entry,
    /// Found relative to the referencing file's directory
    Relative,
    /// Found under this library root
    Library(PathBuf),
}

/// One resolved file in the graph.
#[derive(Debug, Clone)]
pub struct FileNode {
    /// Canonicalized absolute path (node identity)
    path: PathBuf,

    /// Source or asset
    kind: FileKind,

    /// How the resolver matched it
    origin: Origin,

    /// The reference that first discovered it: (referrer, index into the
    /// referrer's references). None for the entry file.
    discovered_via: Option<(FileId, usize)>,

    /// References found by scanning (empty for assets)
    references: Vec<Reference>,
}

impl FileNode {
    /// Create a node for a newly resolved file.
    pub fn new(
        path: impl Into<PathBuf>,
        kind: FileKind,
        origin: Origin,
        discovered_via: Option<(FileId, usize)>,
    ) -> Self {
        FileNode {
            path: path.into(),
            kind,
            origin,
            discovered_via,
            references: Vec::new(),
        }
    }

    /// Get the canonicalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file kind.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// Get how the resolver matched this file.
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Get the discovering reference, if any.
    pub fn discovered_via(&self) -> Option<(FileId, usize)> {
        self.discovered_via
    }

    /// Get the references found in this file, in source order.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }
}

/// An ancillary file (license, readme, ...) found beside a library file.
#[derive(Debug, Clone)]
pub struct AncillaryFile {
    /// Absolute path of the ancillary file
    path: PathBuf,

    /// The library file whose directory it was found in
    library: FileId,
}

impl AncillaryFile {
    /// Get the ancillary file's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the library file it belongs to.
    pub fn library(&self) -> FileId {
        self.library
    }
}

/// The resolved file graph for one entry file.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Edges labelled with the directive kind
    graph: DiGraph<FileId, RefKind>,

    /// Map from FileId to graph node
    id_to_node: HashMap<FileId, NodeIndex>,

    /// Visited set: canonical path to file id
    path_to_id: HashMap<PathBuf, FileId>,

    /// Files in discovery order; FileId indexes into this
    files: Vec<FileNode>,

    /// Ancillary files in discovery order
    ancillary: Vec<AncillaryFile>,
}

impl DependencyGraph {
    /// Create a graph containing just the entry file.
    pub fn new(entry: FileNode) -> Self {
        let mut graph = DependencyGraph {
            graph: DiGraph::new(),
            id_to_node: HashMap::new(),
            path_to_id: HashMap::new(),
            files: Vec::new(),
            ancillary: Vec::new(),
        };
        let id = graph.add_file(entry);
        debug_assert_eq!(id, FileId::ENTRY);
        graph
    }

    /// Get the entry file's id.
    pub fn entry(&self) -> FileId {
        FileId::ENTRY
    }

    /// Add a file to the graph. The caller is responsible for checking
    /// `lookup` first; adding the same path twice creates a second node.
    pub fn add_file(&mut self, node: FileNode) -> FileId {
        let id = FileId(self.files.len());
        let graph_node = self.graph.add_node(id);
        self.id_to_node.insert(id, graph_node);
        self.path_to_id.insert(node.path.clone(), id);
        self.files.push(node);
        id
    }

    /// Add a reference edge between files. Duplicate edges of the same kind
    /// are kept once.
    pub fn add_edge(&mut self, from: FileId, to: FileId, kind: RefKind) {
        if let (Some(&from_node), Some(&to_node)) =
            (self.id_to_node.get(&from), self.id_to_node.get(&to))
        {
            let exists = self
                .graph
                .edges_connecting(from_node, to_node)
                .any(|e| *e.weight() == kind);
            if !exists {
                self.graph.add_edge(from_node, to_node, kind);
            }
        }
    }

    /// Look up a file by its canonicalized path.
    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.path_to_id.get(path).copied()
    }

    /// Check if a path is already in the graph.
    pub fn contains(&self, path: &Path) -> bool {
        self.path_to_id.contains_key(path)
    }

    /// Get a file node.
    pub fn file(&self, id: FileId) -> &FileNode {
        &self.files[id.index()]
    }

    /// Record the scan results for a file.
    pub fn set_references(&mut self, id: FileId, references: Vec<Reference>) {
        self.files[id.index()].references = references;
    }

    /// Promote an asset node to scannable source. Applies when a file first
    /// reached via `import()` is later included or used directly.
    pub fn promote_to_source(&mut self, id: FileId) {
        self.files[id.index()].kind = FileKind::Source;
    }

    /// Iterate files in discovery order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &FileNode)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Number of files in the graph.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// A graph always holds at least the entry file.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Get a file's outgoing references as (kind, child) pairs, in the
    /// order the directives appear in the source. Petgraph iterates
    /// neighbors most-recent-first, so the collected list is reversed.
    pub fn children(&self, id: FileId) -> Vec<(RefKind, FileId)> {
        let Some(&node) = self.id_to_node.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<(RefKind, FileId)> = self
            .graph
            .edges(node)
            .map(|e| (*e.weight(), self.graph[e.target()]))
            .collect();
        children.reverse();
        children
    }

    /// Number of reference edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Record an ancillary file found beside a library file. Duplicate
    /// paths are kept once.
    pub fn add_ancillary(&mut self, path: impl Into<PathBuf>, library: FileId) {
        let path = path.into();
        if self.ancillary.iter().any(|a| a.path == path) {
            return;
        }
        self.ancillary.push(AncillaryFile { path, library });
    }

    /// Get the ancillary files in discovery order.
    pub fn ancillary(&self) -> &[AncillaryFile] {
        &self.ancillary
    }
}
