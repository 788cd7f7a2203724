//! Static dependency scanning for reloads.
//!
//! Computes the set of files an entry file depends on, without compiling it:
//!
//! ```text
//! shell.toml ── imports ──▶ bar.toml ── imports ──▶ widgets/ ──▶ widgets/a.toml
//!                                                            └─▶ widgets/b.toml
//!
//! scan(shell.toml) = {shell.toml, bar.toml, widgets/a.toml, widgets/b.toml}
//! ```
//!
//! # Invariants
//! - The entry file is always in the result, even when it does not exist
//! - Every file and directory is visited at most once (cycles terminate)
//! - Unresolvable imports are skipped, never an error

use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

use crate::compiler::ImportSource;
use crate::utils::path::{normalize_path, resolve_import, watch_key};

/// A set of absolute file paths.
pub type PathSet = FxHashSet<PathBuf>;

/// Scan `entry` and everything it transitively imports.
pub fn scan<S: ImportSource>(source: &S, entry: &Path) -> PathSet {
    let mut scanner = Scanner {
        source,
        files: PathSet::default(),
        dirs: FxHashSet::default(),
        pending: Vec::new(),
    };

    scanner.visit_file(file_key(entry));
    while let Some(file) = scanner.pending.pop() {
        scanner.follow_imports(&file);
    }

    crate::debug!("scan"; "{} depends on {} file(s)", entry.display(), scanner.files.len());
    scanner.files
}

struct Scanner<'a, S> {
    source: &'a S,
    files: PathSet,
    dirs: FxHashSet<PathBuf>,
    /// Files whose imports have not been read yet.
    pending: Vec<PathBuf>,
}

impl<S: ImportSource> Scanner<'_, S> {
    fn visit_file(&mut self, file: PathBuf) {
        if self.files.insert(file.clone()) {
            self.pending.push(file);
        }
    }

    fn visit_dir(&mut self, dir: PathBuf) {
        if !self.dirs.insert(dir.clone()) {
            return;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                crate::debug!("scan"; "cannot read directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(S::EXTENSION)
            })
            .collect();
        files.sort();

        for file in files {
            self.visit_file(normalize_path(&file));
        }
    }

    fn follow_imports(&mut self, file: &Path) {
        let imports = match self.source.imports(file) {
            Ok(imports) => imports,
            Err(e) => {
                crate::debug!("scan"; "{}", e);
                return;
            }
        };

        for import in imports {
            let target = resolve_import(&import, file);
            if target.is_dir() {
                self.visit_dir(target);
            } else if target.is_file() {
                self.visit_file(target);
            } else {
                crate::debug!("scan"; "unresolved import `{}` in {}", import, file.display());
            }
        }
    }
}

/// Canonical path for existing files, event-matching key for missing ones.
fn file_key(path: &Path) -> PathBuf {
    if path.exists() {
        normalize_path(path)
    } else {
        watch_key(path)
    }
}

// =============================================================================
// Tests
// =============================================================================
