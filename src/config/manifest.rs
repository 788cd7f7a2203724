//! Config manifest: `name = relative/path` lines mapping names to configs.
//!
//! ```text
//! # comments and blank lines are skipped
//! bar  = bar
//! work = setups/work/shell.toml
//! ```
//!
//! Paths are relative to the manifest's directory.

use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;
use crate::utils::path::normalize_path;

/// Look `name` up in the manifest at `manifest`.
///
/// `Ok(None)` means the name is not listed.
pub fn lookup(manifest: &Path, name: &str) -> Result<Option<PathBuf>, ConfigError> {
    let content =
        fs::read_to_string(manifest).map_err(|e| ConfigError::Manifest(manifest.to_path_buf(), e))?;

    let Some(relative) = find_entry(&content, name).map_err(|line| ConfigError::ManifestLine {
        manifest: manifest.to_path_buf(),
        line,
    })?
    else {
        return Ok(None);
    };

    let dir = normalize_path(manifest)
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf);
    Ok(Some(dir.join(relative)))
}

/// Find the path listed for `name`. `Err` carries the first malformed line.
///
/// Lines are checked up to the matching one, so a malformed line after it
/// goes unnoticed.
fn find_entry<'a>(content: &'a str, name: &str) -> Result<Option<&'a str>, String> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut parts = line.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(line.to_string());
        };

        if key.trim() == name {
            return Ok(Some(value.trim()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = "\
# configs
bar = bar

work = setups/work/shell.toml
";

    #[test]
    fn test_find_entry() {
        assert_eq!(find_entry(MANIFEST, "bar"), Ok(Some("bar")));
        assert_eq!(find_entry(MANIFEST, "work"), Ok(Some("setups/work/shell.toml")));
        assert_eq!(find_entry(MANIFEST, "missing"), Ok(None));
    }

    #[test]
    fn test_malformed_line() {
        assert_eq!(
            find_entry("bar = bar\nnonsense\n", "work"),
            Err("nonsense".to_string())
        );
        assert!(find_entry("a = b = c\n", "a").is_err());
    }

    #[test]
    fn test_lookup_relative_to_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("manifest.conf");
        fs::write(&manifest, MANIFEST).unwrap();

        let path = lookup(&manifest, "work").unwrap().unwrap();
        assert_eq!(path, normalize_path(temp.path()).join("setups/work/shell.toml"));
        assert!(lookup(&manifest, "missing").unwrap().is_none());
    }

    #[test]
    fn test_lookup_unreadable_manifest() {
        let temp = TempDir::new().unwrap();
        let err = lookup(&temp.path().join("manifest.conf"), "bar").unwrap_err();
        assert!(matches!(err, ConfigError::Manifest(..)));
    }
}
