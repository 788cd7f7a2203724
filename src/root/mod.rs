//! Root Wrapper: owns the current generation and runs the reload protocol.
//!
//! ```text
//! reload(kind)
//!   construct(next id) ──fail──▶ keep current, adopt attempted watch set
//!        │ ok
//!        ▼
//!   new.on_reload(old)      (Soft only, exactly once, old still alive)
//!   current = new           (old generation dropped right after)
//!   watcher ← current watch set (full replace, re-armed)
//! ```


use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compiler::{GraphCompiler, Reloadable};
use crate::generation::{
    ConstructionFailure, FailedGeneration, Generation, GenerationId, construct,
};
use crate::logger::{status_error, status_success};
use crate::scan::PathSet;
use crate::watch::PathWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Start from scratch: no predecessor state is offered.
    Hard,
    /// Offer the current root to its successor.
    Soft,
}

#[derive(Debug)]
pub enum ReloadOutcome {
    Swapped(GenerationId),
    /// Construction failed; `current` is still live.
    Kept {
        current: GenerationId,
        failure: ConstructionFailure,
    },
}

impl ReloadOutcome {
    pub fn is_swapped(&self) -> bool {
        matches!(self, Self::Swapped(_))
    }
}

#[derive(Debug, Error)]
pub enum RootError {
    #[error("cannot determine working directory")]
    WorkingDirectory(#[source] io::Error),

    #[error("failed to load `{}`: {failure}", entry.display())]
    InitialLoad {
        entry: PathBuf,
        failure: ConstructionFailure,
    },
}

pub struct RootWrapper<C: GraphCompiler, W: PathWatcher> {
    entry: PathBuf,
    working_dir: PathBuf,
    compiler: C,
    watcher: W,
    current: Generation<C>,
    next_id: GenerationId,
}

impl<C: GraphCompiler, W: PathWatcher> RootWrapper<C, W> {
    /// Capture the working directory and perform the initial hard load.
    pub fn new(entry: PathBuf, compiler: C, mut watcher: W) -> Result<Self, RootError> {
        let working_dir = std::env::current_dir().map_err(RootError::WorkingDirectory)?;
        let id = GenerationId::FIRST;

        let mut generation = match construct(&compiler, id, &entry, &working_dir) {
            Ok(generation) => generation,
            Err(failed) => {
                status_error("failed to load configuration", &failed.failure.to_string());
                return Err(RootError::InitialLoad {
                    entry,
                    failure: failed.failure,
                });
            }
        };
        generation.root_mut().on_reload(None);

        watcher.set_watched_paths(&watched(&generation));
        crate::log!("reload"; "configuration loaded ({})", entry.display());
        status_success(&format!("configuration loaded ({id})"));

        Ok(Self {
            entry,
            working_dir,
            compiler,
            watcher,
            current: generation,
            next_id: id.next(),
        })
    }

    /// Build a new generation and swap it in, or keep the current one.
    ///
    /// Construction errors never escape: they are logged and returned as
    /// [`ReloadOutcome::Kept`].
    pub fn reload(&mut self, kind: ReloadKind) -> ReloadOutcome {
        let id = self.next_id;
        self.next_id = id.next();
        crate::debug!("reload"; "{:?} reload, constructing generation {}", kind, id);

        match construct(&self.compiler, id, &self.entry, &self.working_dir) {
            Ok(mut generation) => {
                let previous = match kind {
                    ReloadKind::Hard => None,
                    ReloadKind::Soft => Some(self.current.root()),
                };
                generation.root_mut().on_reload(previous);

                let old = std::mem::replace(&mut self.current, generation);
                drop(old);

                self.sync_watcher();
                status_success(&format!("configuration reloaded ({id})"));
                ReloadOutcome::Swapped(id)
            }
            Err(failed) => {
                let current = self.current.id();
                self.current.set_watch_set(failed.watch_set.clone());
                self.sync_watcher();

                status_error(
                    &kept_summary(&failed, current),
                    &failed.failure.to_string(),
                );
                ReloadOutcome::Kept {
                    current,
                    failure: failed.failure,
                }
            }
        }
    }

    pub fn current(&self) -> &Generation<C> {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut Generation<C> {
        &mut self.current
    }

    pub fn entry(&self) -> &Path {
        &self.entry
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    pub fn watcher_mut(&mut self) -> &mut W {
        &mut self.watcher
    }

    fn sync_watcher(&mut self) {
        self.watcher.set_watched_paths(&watched(&self.current));
    }
}

fn kept_summary(failed: &FailedGeneration, current: GenerationId) -> String {
    format!(
        "generation {}: {} failed, keeping generation {current}",
        failed.id,
        failed.failure.kind()
    )
}

/// What the watcher should observe for a generation.
fn watched<C: GraphCompiler>(generation: &Generation<C>) -> PathSet {
    if generation.root().watch_files() {
        generation.watch_set().clone()
    } else {
        crate::debug!("watch"; "file watching disabled by configuration");
        PathSet::default()
    }
}
