//! Configuration file support for scadpack.
//!
//! scadpack supports two configuration file locations:
//! - Global: `<config dir>/scadpack/config.toml` - User-wide defaults
//! - Project: `.scadpack.toml` beside the entry file - Design-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// scadpack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Library search settings
    pub search: SearchConfig,

    /// Ancillary file discovery settings
    pub ancillary: AncillaryConfig,

    /// Bundle layout settings
    pub output: OutputConfig,
}

/// Library search configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Extra library roots, searched after roots given on the command line
    pub libraries: Vec<PathBuf>,

    /// Whether OPENSCADPATH and the platform default library location are
    /// appended to the search roots (defaults to true)
    pub use_default_libraries: Option<bool>,
}

/// Ancillary file discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AncillaryConfig {
    /// Case-insensitive filename globs collected beside library files.
    /// Empty means the built-in set (license*, readme*, ...).
    pub patterns: Vec<String>,
}

/// Bundle layout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Bundle subdirectory receiving files resolved via library roots
    /// (defaults to "lib"; "." means the bundle root)
    pub library_dir: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Search settings
        if !other.search.libraries.is_empty() {
            self.search.libraries = other.search.libraries;
        }
        if other.search.use_default_libraries.is_some() {
            self.search.use_default_libraries = other.search.use_default_libraries;
        }

        // Ancillary settings
        if !other.ancillary.patterns.is_empty() {
            self.ancillary.patterns = other.ancillary.patterns;
        }

        // Output settings
        if other.output.library_dir.is_some() {
            self.output.library_dir = other.output.library_dir;
        }
    }

    /// Whether default library locations should be searched.
    pub fn use_default_libraries(&self) -> bool {
        self.search.use_default_libraries.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.scadpack.toml beside the entry file)
/// 2. Global config (<config dir>/scadpack/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global config path (<config dir>/scadpack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "scadpack")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the project config path (.scadpack.toml beside the entry file).
pub fn project_config_path(entry_dir: &Path) -> PathBuf {
    entry_dir.join(".scadpack.toml")
}
