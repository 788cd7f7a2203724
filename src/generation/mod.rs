//! Generations: one complete, live instantiation of the configuration.
//!
//! ```text
//! construct(entry)
//!   1. scan          → watch set (recorded even if later steps fail)
//!   2. restore cwd
//!   3. compile       → CompileFailure
//!   4. begin_create  → InstantiationFailure / RootTypeMismatch
//!   5. complete_create → InstantiationFailure
//!   ⇒ Generation { id, watch_set, root, engine }
//! ```
//!
//! A `Generation` always holds a finalized root. A construction that stops
//! early yields a [`FailedGeneration`] instead, which keeps only the watch set
//! and the reason.

mod error;

use std::fmt;
use std::path::Path;

use crate::compiler::GraphCompiler;
use crate::scan::{PathSet, scan};

pub use error::ConstructionFailure;

/// Monotonically increasing generation number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(pub u64);

impl GenerationId {
    pub const FIRST: Self = Self(1);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A successfully constructed generation.
///
/// Field order is drop order: the root object graph is torn down before the
/// engine that created it.
pub struct Generation<C: GraphCompiler> {
    id: GenerationId,
    watch_set: PathSet,
    root: C::Root,
    engine: C::Engine,
}

impl<C: GraphCompiler> Generation<C> {
    pub fn id(&self) -> GenerationId {
        self.id
    }

    pub fn root(&self) -> &C::Root {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut C::Root {
        &mut self.root
    }

    #[cfg(test)]
    pub fn engine(&self) -> &C::Engine {
        &self.engine
    }

    pub fn watch_set(&self) -> &PathSet {
        &self.watch_set
    }

    /// Replace the watch set without replacing the generation.
    pub(crate) fn set_watch_set(&mut self, watch_set: PathSet) {
        self.watch_set = watch_set;
    }
}

impl<C: GraphCompiler> Drop for Generation<C> {
    fn drop(&mut self) {
        crate::debug!("reload"; "tearing down generation {}", self.id);
    }
}

impl<C: GraphCompiler> fmt::Debug for Generation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("watch_set", &self.watch_set.len())
            .finish_non_exhaustive()
    }
}

/// What is left of a construction that did not produce a root.
#[derive(Debug)]
pub struct FailedGeneration {
    pub id: GenerationId,
    pub watch_set: PathSet,
    pub failure: ConstructionFailure,
}

/// Build a generation for `entry`.
pub fn construct<C: GraphCompiler>(
    compiler: &C,
    id: GenerationId,
    entry: &Path,
    working_dir: &Path,
) -> Result<Generation<C>, FailedGeneration> {
    let watch_set = scan(compiler, entry);
    restore_working_dir(working_dir);

    let fail = |watch_set: PathSet, failure: ConstructionFailure| FailedGeneration {
        id,
        watch_set,
        failure,
    };

    let mut engine = compiler.create_engine(working_dir);

    let template = match compiler.compile(&mut engine, entry) {
        Ok(template) => template,
        Err(diagnostic) => return Err(fail(watch_set, ConstructionFailure::Compile(diagnostic))),
    };

    let object = match compiler.begin_create(&mut engine, &template) {
        Ok(object) => object,
        Err(message) => {
            return Err(fail(watch_set, ConstructionFailure::Instantiation(message)));
        }
    };

    let mut root = match compiler.into_root(object) {
        Ok(root) => root,
        Err(found) => {
            return Err(fail(watch_set, ConstructionFailure::RootTypeMismatch { found }));
        }
    };

    if let Err(diagnostic) = compiler.complete_create(&mut engine, &mut root) {
        drop(root);
        return Err(fail(
            watch_set,
            ConstructionFailure::Instantiation(diagnostic.to_string()),
        ));
    }

    crate::debug!("reload"; "generation {} constructed, watching {} file(s)", id, watch_set.len());

    Ok(Generation {
        id,
        watch_set,
        root,
        engine,
    })
}

/// Imports resolved by the compiler may depend on the working directory, and
/// the config itself may have changed it.
fn restore_working_dir(working_dir: &Path) {
    if std::env::current_dir().is_ok_and(|cwd| cwd == working_dir) {
        return;
    }
    if let Err(e) = std::env::set_current_dir(working_dir) {
        crate::log!("reload"; "cannot restore working directory {}: {}", working_dir.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::TomlCompiler;
    use crate::utils::path::normalize_path;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn build(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(temp.path().join(name), content).unwrap();
        }
        let entry = normalize_path(&temp.path().join("shell.toml"));
        (temp, entry)
    }

    fn cwd() -> PathBuf {
        std::env::current_dir().unwrap()
    }

    #[test]
    fn test_generation_id_display() {
        assert_eq!(GenerationId::FIRST.to_string(), "#1");
        assert_eq!(GenerationId(4).next(), GenerationId(5));
    }

    #[test]
    fn test_construct_success() {
        let (_temp, entry) = build(&[
            ("shell.toml", "imports = [\"bar.toml\"]\n[root]\ntype = \"ShellRoot\"\n"),
            ("bar.toml", "[components.Bar]\ntype = \"PanelWindow\"\n"),
        ]);

        let generation = construct(&TomlCompiler::new(), GenerationId(3), &entry, &cwd()).unwrap();

        assert_eq!(generation.id(), GenerationId(3));
        assert_eq!(generation.watch_set().len(), 2);
        assert!(generation.engine().component("Bar").is_some());
    }

    #[test]
    fn test_compile_failure_keeps_watch_set() {
        let (temp, entry) = build(&[
            ("shell.toml", "imports = [\"bar.toml\"]\n[root]\ntype = \"ShellRoot\"\n"),
            ("bar.toml", "[components.Bar\n"),
        ]);

        let failed = construct(&TomlCompiler::new(), GenerationId(2), &entry, &cwd()).unwrap_err();

        assert!(matches!(failed.failure, ConstructionFailure::Compile(_)));
        assert!(failed.watch_set.contains(&entry));
        assert!(failed.watch_set.contains(&normalize_path(&temp.path().join("bar.toml"))));
    }

    #[test]
    fn test_missing_entry_is_compile_failure() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("shell.toml");

        let failed = construct(&TomlCompiler::new(), GenerationId(1), &entry, &cwd()).unwrap_err();

        assert!(matches!(failed.failure, ConstructionFailure::Compile(_)));
        assert_eq!(failed.watch_set.len(), 1);
    }

    #[test]
    fn test_wrong_root_type() {
        let (_temp, entry) = build(&[("shell.toml", "[root]\ntype = \"FloatingWindow\"\n")]);

        let failed = construct(&TomlCompiler::new(), GenerationId(1), &entry, &cwd()).unwrap_err();

        match failed.failure {
            ConstructionFailure::RootTypeMismatch { found } => assert_eq!(found, "FloatingWindow"),
            other => panic!("unexpected failure: {other}"),
        }
    }

    #[test]
    fn test_unknown_type_is_instantiation_failure() {
        let (_temp, entry) = build(&[(
            "shell.toml",
            "[root]\ntype = \"ShellRoot\"\n[[root.children]]\ntype = \"Nope\"\n",
        )]);

        let failed = construct(&TomlCompiler::new(), GenerationId(1), &entry, &cwd()).unwrap_err();
        assert!(matches!(failed.failure, ConstructionFailure::Instantiation(_)));
    }

    #[test]
    fn test_finalize_failure_is_instantiation_failure() {
        let (_temp, entry) = build(&[(
            "shell.toml",
            "[root]\ntype = \"ShellRoot\"\n[[root.children]]\ntype = \"Text\"\nprops = { size = \"@bar.height\" }\n",
        )]);

        let failed = construct(&TomlCompiler::new(), GenerationId(1), &entry, &cwd()).unwrap_err();

        match failed.failure {
            ConstructionFailure::Instantiation(message) => assert!(message.contains("unknown id")),
            other => panic!("unexpected failure: {other}"),
        }
    }
}
