//! Per-generation compilation context.
//!
//! An `Engine` is created fresh for every reload attempt and owned by the
//! generation it produced, so component definitions never leak between
//! generations.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};

use super::document::{Document, EXTENSION, NodeDecl};
use super::object::Builtin;
use super::Diagnostic;
use crate::utils::path::{normalize_path, resolve_import};

/// A component definition and the file that declared it.
#[derive(Debug, Clone)]
pub struct Component {
    pub decl: NodeDecl,
    pub origin: PathBuf,
}

#[derive(Debug)]
pub struct Engine {
    working_dir: PathBuf,
    components: FxHashMap<String, Component>,
    /// Files loaded into this engine, in load order.
    sources: Vec<PathBuf>,
}

impl Engine {
    pub fn new(working_dir: &Path) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            components: FxHashMap::default(),
            sources: Vec::new(),
        }
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Load `entry` and everything it imports, registering components.
    ///
    /// Unlike the dependency scanner this is strict: an import that does not
    /// resolve is a diagnostic. A relative `entry` is taken from the working
    /// directory the engine was created for, not the process one.
    pub(super) fn load(&mut self, entry: &Path) -> Result<Document, Diagnostic> {
        let entry = normalize_path(&self.working_dir.join(entry));
        let mut visited = FxHashSet::default();
        visited.insert(entry.clone());

        let document = Document::load(&entry)?;
        self.register(&entry, &document)?;

        let mut pending: Vec<(PathBuf, String)> = document
            .imports
            .iter()
            .map(|import| (entry.clone(), import.clone()))
            .collect();

        while let Some((importer, import)) = pending.pop() {
            for file in expand_import(&importer, &import)? {
                if !visited.insert(file.clone()) {
                    continue;
                }
                let imported = Document::load(&file)?;
                self.register(&file, &imported)?;
                pending.extend(
                    imported
                        .imports
                        .iter()
                        .map(|next| (file.clone(), next.clone())),
                );
            }
        }

        Ok(document)
    }

    fn register(&mut self, file: &Path, document: &Document) -> Result<(), Diagnostic> {
        self.sources.push(file.to_path_buf());

        for (name, decl) in &document.components {
            if Builtin::from_name(name).is_some() {
                return Err(
                    Diagnostic::new(format!("component `{name}` shadows a builtin type"))
                        .in_file(file),
                );
            }
            if let Some(existing) = self.components.get(name) {
                return Err(Diagnostic::new(format!(
                    "component `{name}` is already defined in `{}`",
                    existing.origin.display()
                ))
                .in_file(file));
            }
            self.components.insert(
                name.clone(),
                Component {
                    decl: decl.clone(),
                    origin: file.to_path_buf(),
                },
            );
        }
        Ok(())
    }
}

/// Files named by one import: the file itself, or every source file of a directory.
fn expand_import(importer: &Path, import: &str) -> Result<Vec<PathBuf>, Diagnostic> {
    let target = resolve_import(import, importer);

    if target.is_file() {
        return Ok(vec![target]);
    }

    if target.is_dir() {
        let entries = std::fs::read_dir(&target).map_err(|e| {
            Diagnostic::new(format!("cannot read import `{import}`: {e}")).in_file(importer)
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some(EXTENSION)
            })
            .map(|path| normalize_path(&path))
            .collect();
        files.sort();
        return Ok(files);
    }

    Err(Diagnostic::new(format!("cannot resolve import `{import}`")).in_file(importer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_registers_imported_components() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "shell.toml",
            "imports = [\"bar.toml\"]\n[root]\ntype = \"ShellRoot\"\n",
        );
        write(
            temp.path(),
            "bar.toml",
            "[components.Bar]\ntype = \"PanelWindow\"\n",
        );

        let mut engine = Engine::new(temp.path());
        let doc = engine.load(&entry).unwrap();

        assert!(doc.root.is_some());
        assert_eq!(engine.component("Bar").unwrap().decl.kind, "PanelWindow");
        assert_eq!(engine.sources().len(), 2);
    }

    #[test]
    fn test_relative_entry_uses_engine_working_dir() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "shell.toml", "imports = [\"bar.toml\"]\n");
        write(temp.path(), "bar.toml", "[components.Bar]\ntype = \"Item\"\n");

        let mut engine = Engine::new(temp.path());
        engine.load(Path::new("shell.toml")).unwrap();

        assert!(engine.component("Bar").is_some());
        assert_eq!(engine.sources()[0], normalize_path(&temp.path().join("shell.toml")));
    }

    #[test]
    fn test_load_directory_import() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "shell.toml", "imports = [\"widgets\"]\n");
        write(temp.path(), "widgets/a.toml", "[components.A]\ntype = \"Text\"\n");
        write(temp.path(), "widgets/b.toml", "[components.B]\ntype = \"Timer\"\n");
        write(temp.path(), "widgets/notes.txt", "not a shell file");

        let mut engine = Engine::new(temp.path());
        engine.load(&entry).unwrap();

        assert!(engine.component("A").is_some());
        assert!(engine.component("B").is_some());
        assert_eq!(engine.sources().len(), 3);
    }

    #[test]
    fn test_load_import_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "shell.toml", "imports = [\"a.toml\"]\n");
        write(temp.path(), "a.toml", "imports = [\"shell.toml\"]\n");

        let mut engine = Engine::new(temp.path());
        engine.load(&entry).unwrap();
        assert_eq!(engine.sources().len(), 2);
    }

    #[test]
    fn test_unresolved_import_is_diagnostic() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "shell.toml", "imports = [\"missing.toml\"]\n");

        let err = Engine::new(temp.path()).load(&entry).unwrap_err();
        assert!(err.message.contains("missing.toml"));
        assert_eq!(err.file, Some(normalize_path(&entry)));
    }

    #[test]
    fn test_duplicate_component_is_diagnostic() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "shell.toml",
            "imports = [\"a.toml\"]\n[components.Bar]\ntype = \"Item\"\n",
        );
        write(temp.path(), "a.toml", "[components.Bar]\ntype = \"Text\"\n");

        let err = Engine::new(temp.path()).load(&entry).unwrap_err();
        assert!(err.message.contains("already defined"));
    }

    #[test]
    fn test_builtin_shadowing_is_diagnostic() {
        let temp = TempDir::new().unwrap();
        let entry = write(
            temp.path(),
            "shell.toml",
            "[components.Text]\ntype = \"Item\"\n",
        );

        let err = Engine::new(temp.path()).load(&entry).unwrap_err();
        assert!(err.message.contains("shadows"));
    }

    #[test]
    fn test_syntax_error_in_import_names_the_file() {
        let temp = TempDir::new().unwrap();
        let entry = write(temp.path(), "shell.toml", "imports = [\"bad.toml\"]\n");
        let bad = write(temp.path(), "bad.toml", "[components.Bar\n");

        let err = Engine::new(temp.path()).load(&entry).unwrap_err();
        assert_eq!(err.file, Some(normalize_path(&bad)));
    }
}
