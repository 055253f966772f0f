//! Filesystem utilities.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy a single file, creating parent directories as needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst).with_context(|| {
        format!("failed to copy {} to {}", src.display(), dst.display())
    })
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Resolve `.` and `..` components lexically, without touching the
/// filesystem. Leading `..` components that cannot be resolved are kept, so
/// callers can detect paths escaping their base.
pub fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if popped {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if a normalized relative path points outside its base directory.
pub fn escapes_base(normalized: &Path) -> bool {
    normalized
        .components()
        .next()
        .is_some_and(|c| matches!(c, Component::ParentDir))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_glob_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("parts");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("gear.scad"), "module gear() {}").unwrap();
        fs::write(src.join("axle.scad"), "module axle() {}").unwrap();
        fs::write(src.join("notes.txt"), "notes").unwrap();

        let files = glob_files(tmp.path(), &["parts/**/*.scad".to_string()]).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.scad");
        fs::write(&src, "cube(1);").unwrap();

        let dst = tmp.path().join("out/deep/a.scad");
        copy_file(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "cube(1);");
    }

    #[test]
    fn test_normalize_lexical() {
        let n = |s: &str| normalize_lexical(Path::new(s));
        assert_eq!(n("a/./b.scad"), PathBuf::from("a/b.scad"));
        assert_eq!(n("a/../b.scad"), PathBuf::from("b.scad"));
        assert_eq!(n("shapes/../common/x.scad"), PathBuf::from("common/x.scad"));
        assert_eq!(n("../outside.scad"), PathBuf::from("../outside.scad"));
        assert_eq!(n("a/b/../../../c.scad"), PathBuf::from("../c.scad"));
    }

    #[test]
    fn test_escapes_base() {
        assert!(escapes_base(Path::new("../x.scad")));
        assert!(!escapes_base(Path::new("lib/x.scad")));
        assert!(!escapes_base(Path::new("x.scad")));
    }
}
