//! Serde model of one shell file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{Diagnostic, ScanError};

/// Extension of shell files.
pub const EXTENSION: &str = "toml";

/// A parsed shell file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Files or directories this file depends on.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Named components made available to every file of the generation.
    #[serde(default)]
    pub components: BTreeMap<String, NodeDecl>,
    /// Root declaration. Only meaningful in the entry file.
    pub root: Option<NodeDecl>,
}

/// One declared object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeDecl {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub props: toml::Table,
    #[serde(default)]
    pub children: Vec<NodeDecl>,
}

/// Only the `imports` key; every other key is ignored.
#[derive(Debug, Default, Deserialize)]
struct ImportHeader {
    #[serde(default)]
    imports: Vec<String>,
}

impl Document {
    /// Parse a shell file, reporting errors against `path`.
    pub fn load(path: &Path) -> Result<Self, Diagnostic> {
        let content = fs::read_to_string(path)
            .map_err(|e| Diagnostic::new(format!("cannot read file: {e}")).in_file(path))?;
        Self::parse(&content).map_err(|message| Diagnostic::new(message).in_file(path))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }
}

/// Read the imports of a file without interpreting anything else in it.
///
/// A syntax error after the top-level keys does not hide the imports: the
/// header before the first table is parsed on its own as a fallback.
pub fn read_imports(path: &Path) -> Result<Vec<String>, ScanError> {
    let content = fs::read_to_string(path).map_err(|e| ScanError::Io(path.to_path_buf(), e))?;

    let header = match toml::from_str::<ImportHeader>(&content) {
        Ok(header) => header,
        Err(e) => toml::from_str::<ImportHeader>(top_level(&content)).map_err(|_| {
            ScanError::Malformed {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            }
        })?,
    };
    Ok(header.imports)
}

/// Everything before the first table header.
fn top_level(content: &str) -> &str {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.trim_start().starts_with('[') {
            break;
        }
        offset += line.len();
    }
    &content[..offset]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let doc = Document::parse(
            r#"
            imports = ["bar.toml", "widgets"]

            [components.Clock]
            type = "Text"
            props = { format = "%H:%M" }

            [root]
            type = "ShellRoot"

            [[root.children]]
            type = "Clock"
            id = "clock"
            "#,
        )
        .unwrap();

        assert_eq!(doc.imports, vec!["bar.toml", "widgets"]);
        assert_eq!(doc.components["Clock"].kind, "Text");
        let root = doc.root.unwrap();
        assert_eq!(root.kind, "ShellRoot");
        assert_eq!(root.children[0].id.as_deref(), Some("clock"));
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = Document::parse("colour = 1").unwrap_err();
        assert!(err.contains("colour"));
    }

    #[test]
    fn test_read_imports_ignores_other_keys() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("shell.toml");
        fs::write(
            &file,
            "imports = [\"a.toml\"]\nanything = 1\n[root]\ntype = \"Nope\"\nextra = true\n",
        )
        .unwrap();

        assert_eq!(read_imports(&file).unwrap(), vec!["a.toml"]);
    }

    #[test]
    fn test_read_imports_syntax_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("shell.toml");
        fs::write(&file, "imports = [\"a.toml\"\n").unwrap();

        assert!(matches!(read_imports(&file), Err(ScanError::Malformed { .. })));
    }

    #[test]
    fn test_read_imports_survives_broken_tables() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("shell.toml");
        fs::write(&file, "imports = [\"a.toml\"]\n[root\ntype = \"ShellRoot\"\n").unwrap();

        assert_eq!(read_imports(&file).unwrap(), vec!["a.toml"]);
    }

    #[test]
    fn test_top_level() {
        assert_eq!(top_level("a = 1\n\n[root]\nb = 2\n"), "a = 1\n\n");
        assert_eq!(top_level("[root]\n"), "");
        assert_eq!(top_level("a = 1"), "a = 1");
    }

    #[test]
    fn test_read_imports_missing_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("missing.toml");
        assert!(matches!(read_imports(&missing), Err(ScanError::Io(..))));
    }
}
