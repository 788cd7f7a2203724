use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use crate::scan::PathSet;
use crate::utils::path::watch_key;

/// Directory subscriptions backing one watch set.
///
/// Files are observed through their parent directory so that atomic saves
/// (write a temp file, rename over the original) keep being seen. Events are
/// then filtered down to the watched files.
///
/// Responsibility:
/// - Replace every subscription when the watch set changes
/// - Attach directories that did not exist yet once they appear
pub(super) struct Subscription {
    files: PathSet,
    desired: FxHashSet<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl Subscription {
    pub(super) fn new() -> Self {
        Self {
            files: PathSet::default(),
            desired: FxHashSet::default(),
            attached: FxHashSet::default(),
        }
    }

    #[cfg(test)]
    pub(super) fn with_files(files: PathSet) -> Self {
        Self {
            desired: parent_dirs(&files),
            files,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn files(&self) -> &PathSet {
        &self.files
    }

    /// Drop every subscription, then subscribe to the directories of `files`.
    pub(super) fn replace<W: Watcher>(&mut self, watcher: &mut W, files: &PathSet) {
        for dir in self.attached.drain() {
            if let Err(e) = watcher.unwatch(&dir) {
                crate::debug!("watch"; "unwatch {}: {}", dir.display(), e);
            }
        }

        self.files = files.clone();
        self.desired = parent_dirs(files);

        for dir in &self.desired {
            if !dir.is_dir() {
                crate::debug!("watch"; "waiting for {} to appear", dir.display());
                continue;
            }
            match watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    self.attached.insert(dir.clone());
                }
                Err(e) => crate::log!("watch"; "cannot watch {}: {}", dir.display(), e),
            }
        }

        crate::debug!(
            "watch"; "watching {} file(s) in {} dir(s)",
            self.files.len(),
            self.attached.len()
        );
    }

    /// Re-attach directories that were missing or removed.
    ///
    /// Returns `true` when a newly attached directory already holds a watched
    /// file, since its creation happened before the subscription existed.
    pub(super) fn maintain<W: Watcher>(&mut self, watcher: &mut W) -> bool {
        self.attached.retain(|dir| dir.is_dir());

        let mut appeared = false;
        for dir in &self.desired {
            if self.attached.contains(dir) || !dir.is_dir() {
                continue;
            }
            if watcher.watch(dir, RecursiveMode::NonRecursive).is_ok() {
                self.attached.insert(dir.clone());
                crate::debug!("watch"; "re-attached watch: {}", dir.display());
                appeared |= self
                    .files
                    .iter()
                    .any(|file| file.parent() == Some(dir.as_path()) && file.exists());
            }
        }
        appeared
    }

    /// Whether some desired directory is not subscribed yet.
    pub(super) fn is_incomplete(&self) -> bool {
        self.attached.len() < self.desired.len()
    }

    /// Whether an event path names a watched file.
    pub(super) fn matches(&self, path: &Path) -> bool {
        self.files.contains(path) || self.files.contains(&watch_key(path))
    }
}

fn parent_dirs(files: &PathSet) -> FxHashSet<PathBuf> {
    files
        .iter()
        .filter_map(|file| file.parent())
        .map(Path::to_path_buf)
        .collect()
}
