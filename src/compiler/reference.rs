//! `TomlCompiler`: the reference compiler for `.toml` shell files.

use std::path::{Path, PathBuf};

use super::binding::finalize;
use super::document::{self, NodeDecl};
use super::engine::Engine;
use super::instantiate::instantiate;
use super::object::{Object, ShellRoot};
use super::{Diagnostic, GraphCompiler, ImportSource, ScanError};

/// Compiled entry file, ready to instantiate.
#[derive(Debug, Clone)]
pub struct Template {
    pub entry: PathBuf,
    pub root: Option<NodeDecl>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TomlCompiler;

impl TomlCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl ImportSource for TomlCompiler {
    const EXTENSION: &'static str = document::EXTENSION;

    fn imports(&self, file: &Path) -> Result<Vec<String>, ScanError> {
        document::read_imports(file)
    }
}

impl GraphCompiler for TomlCompiler {
    type Engine = Engine;
    type Template = Template;
    type Object = Object;
    type Root = ShellRoot;

    fn create_engine(&self, working_dir: &Path) -> Engine {
        Engine::new(working_dir)
    }

    fn compile(&self, engine: &mut Engine, entry: &Path) -> Result<Template, Diagnostic> {
        let document = engine.load(entry)?;
        crate::debug!("compile"; "{} file(s) loaded for {}", engine.sources().len(), entry.display());
        Ok(Template {
            entry: entry.to_path_buf(),
            root: document.root,
        })
    }

    fn begin_create(&self, engine: &mut Engine, template: &Template) -> Result<Object, String> {
        let Some(decl) = &template.root else {
            return Err(format!(
                "`{}` declares no root object",
                template.entry.display()
            ));
        };
        instantiate(engine, decl)
    }

    fn into_root(&self, object: Object) -> Result<ShellRoot, String> {
        ShellRoot::try_from_object(object)
    }

    fn complete_create(&self, _engine: &mut Engine, root: &mut ShellRoot) -> Result<(), Diagnostic> {
        finalize(root.object_mut())?;
        root.apply_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::object::Builtin;
    use std::fs;
    use tempfile::TempDir;

    fn build(source: &str) -> Result<ShellRoot, String> {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("shell.toml");
        fs::write(&entry, source).unwrap();

        let compiler = TomlCompiler::new();
        let mut engine = compiler.create_engine(temp.path());
        let template = compiler
            .compile(&mut engine, &entry)
            .map_err(|d| d.to_string())?;
        let object = compiler.begin_create(&mut engine, &template)?;
        let mut root = compiler.into_root(object)?;
        compiler
            .complete_create(&mut engine, &mut root)
            .map_err(|d| d.to_string())?;
        Ok(root)
    }

    #[test]
    fn test_full_pipeline() {
        let root = build(
            r#"
            [components.Bar]
            type = "PanelWindow"
            props = { height = 30 }

            [root]
            type = "ShellRoot"
            props = { settings = { watch_files = false } }

            [[root.children]]
            type = "Bar"
            id = "bar"

            [[root.children]]
            type = "Text"
            props = { size = "@bar.height" }
            "#,
        )
        .unwrap();

        assert!(!root.settings().watch_files);
        assert_eq!(root.find("bar").unwrap().builtin, Builtin::PanelWindow);
        assert_eq!(
            root.object().children[1].prop("size"),
            Some(&toml::Value::Integer(30))
        );
    }

    #[test]
    fn test_missing_root() {
        let err = build("[components.Bar]\ntype = \"Item\"\n").unwrap_err();
        assert!(err.contains("declares no root object"));
    }

    #[test]
    fn test_root_of_wrong_type() {
        let err = build("[root]\ntype = \"PanelWindow\"\n").unwrap_err();
        assert_eq!(err, "PanelWindow");
    }

    #[test]
    fn test_syntax_error() {
        let err = build("[root\ntype = \"ShellRoot\"\n").unwrap_err();
        assert!(err.contains("shell.toml"));
    }

    #[test]
    fn test_imports_are_read_statically() {
        let temp = TempDir::new().unwrap();
        let entry = temp.path().join("shell.toml");
        fs::write(&entry, "imports = [\"a.toml\", \"dir\"\n").unwrap();
        assert!(TomlCompiler::new().imports(&entry).is_err());

        fs::write(&entry, "imports = [\"a.toml\", \"dir\"]\n[root]\ntype = \"Anything\"").unwrap();
        assert_eq!(
            TomlCompiler::new().imports(&entry).unwrap(),
            vec!["a.toml", "dir"]
        );

        fs::write(&entry, "imports = [\"a.toml\", \"dir\"]\n[root]\ntype = \"Broken").unwrap();
        assert_eq!(
            TomlCompiler::new().imports(&entry).unwrap(),
            vec!["a.toml", "dir"]
        );
    }
}
