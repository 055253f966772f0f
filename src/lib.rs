//! scadpack - A packager for OpenSCAD designs
//!
//! This crate provides the core library functionality for scadpack:
//! scanning `.scad` files for include/use/import directives, resolving them
//! against ordered library search roots, walking the transitive dependency
//! graph, and assembling the copy manifest that turns a design into a
//! self-contained bundle.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use crate::core::{
    graph::DependencyGraph, manifest::CopyManifest, reference::Reference,
    search::SearchPath,
};

pub use crate::resolver::Resolution;
pub use crate::util::shell::Shell;
