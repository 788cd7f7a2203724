//! Graph compiler boundary and the reference TOML compiler.
//!
//! The generation manager only talks to a compiler through [`GraphCompiler`]
//! and to its import syntax through [`ImportSource`]. Everything else in this
//! module is the reference implementation for `.toml` shell files:
//!
//! ```text
//! document.rs     serde model of one shell file
//! engine.rs       per-generation compilation context (component registry)
//! instantiate.rs  template → object tree (component expansion)
//! binding.rs      finalize: id uniqueness + deferred `@id.prop` bindings
//! object.rs       object tree, ShellRoot, state transfer
//! reference.rs    TomlCompiler, wiring the pieces to the traits
//! ```

mod binding;
mod document;
mod engine;
mod instantiate;
mod object;
mod reference;

use owo_colors::OwoColorize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use reference::TomlCompiler;

// ============================================================================
// Boundary traits
// ============================================================================

/// Static view of a source language's imports.
///
/// Used by the dependency scanner, which must never execute the config.
pub trait ImportSource {
    /// Extension of source files pulled in by a directory import.
    const EXTENSION: &'static str;

    /// Raw import strings declared by `file`, in declaration order.
    fn imports(&self, file: &Path) -> Result<Vec<String>, ScanError>;
}

/// Compiles a shell file into a template and instantiates it.
///
/// The call order for one generation is fixed:
/// `create_engine` → `compile` → `begin_create` → `into_root` → `complete_create`.
pub trait GraphCompiler: ImportSource {
    /// Compilation context, exclusively owned by one generation.
    type Engine;
    type Template;
    /// Object produced by `begin_create`, before its root type is checked.
    type Object;
    type Root: Reloadable;

    fn create_engine(&self, working_dir: &Path) -> Self::Engine;

    fn compile(&self, engine: &mut Self::Engine, entry: &Path)
    -> Result<Self::Template, Diagnostic>;

    /// Instantiate the template. `Err` carries the reason no object was produced.
    fn begin_create(
        &self,
        engine: &mut Self::Engine,
        template: &Self::Template,
    ) -> Result<Self::Object, String>;

    /// Check the object is a root object. `Err` carries the type actually found;
    /// the object is torn down before returning.
    fn into_root(&self, object: Self::Object) -> Result<Self::Root, String>;

    /// Finalize deferred bindings. The root is live only after this succeeds.
    fn complete_create(&self, engine: &mut Self::Engine, root: &mut Self::Root)
    -> Result<(), Diagnostic>;
}

/// Root object hooks used across a reload.
pub trait Reloadable {
    /// Offered exactly once per generation, before the predecessor is dropped.
    /// `None` on a hard reload.
    fn on_reload(&mut self, previous: Option<&Self>);

    /// Whether the config asked for its files to be watched.
    fn watch_files(&self) -> bool {
        true
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Soft failure while reading a file's imports.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot read `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("cannot read imports of `{}`: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// A compiler diagnostic, optionally tied to a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            file: None,
            message: message.into(),
        }
    }

    pub fn in_file(mut self, file: &Path) -> Self {
        self.file = Some(file.to_path_buf());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display().cyan(), self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}
