//! High-level operations.
//!
//! This module contains the implementation of scadpack commands.

pub mod pack;

pub use pack::{pack, PackOptions, PackResult, DEFAULT_LIBRARY_DIR};
