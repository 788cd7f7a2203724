//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `resolve_import` - resolve an import string against the importing file
//! - `watch_key` - stable key for paths that may no longer exist

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve an import string relative to the file that declares it.
///
/// - `~` is expanded to the home directory
/// - Absolute imports are used as-is
/// - Everything else is joined onto the importing file's directory
///
/// The result is normalized but not required to exist.
pub fn resolve_import(import: &str, importer: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(import);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        return normalize_path(path);
    }

    let base = importer.parent().unwrap_or_else(|| Path::new("."));
    normalize_path(&base.join(path))
}

/// Key used to match filesystem events against watched files.
///
/// Removed or renamed files cannot be canonicalized, so only the parent
/// directory is resolved and the file name is appended verbatim.
pub fn watch_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            normalize_path(parent).join(name)
        }
        _ => normalize_path(path),
    }
}
