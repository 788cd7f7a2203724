//! Launch pragmas: leading `#@ pragma ...` comments of the entry file.
//!
//! ```toml
//! #@ pragma Env QT_SCALE_FACTOR = 1.5
//! imports = ["bar.toml"]
//! ```
//!
//! Scanning stops at the first line that is neither blank nor a comment.

use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use super::ConfigError;

/// `#@ pragma <Name> <arguments>`
static PRAGMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#@\s*pragma\s+(\S+)\s*(.*)$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pragma {
    /// Set an environment variable before the shell starts.
    Env { var: String, value: String },
}

/// Read the pragmas of `file`.
pub fn read(file: &Path) -> Result<Vec<Pragma>, ConfigError> {
    let content = fs::read_to_string(file).map_err(|e| ConfigError::Io(file.to_path_buf(), e))?;
    parse(&content).map_err(|(line, message)| ConfigError::Pragma {
        file: file.to_path_buf(),
        line,
        message,
    })
}

/// Parse leading pragmas. `Err` carries the 1-based line and the reason.
pub fn parse(content: &str) -> Result<Vec<Pragma>, (usize, String)> {
    let mut pragmas = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.starts_with('#') {
            break;
        }
        let Some(captures) = PRAGMA.captures(line) else {
            continue;
        };

        let name = &captures[1];
        let args = captures[2].trim();
        match name {
            "Env" => {
                let Some((var, value)) = args.split_once('=') else {
                    return Err((index + 1, format!("Env pragma `{args}` not in the form `VAR = VALUE`")));
                };
                let var = var.trim();
                if var.is_empty() {
                    return Err((index + 1, "Env pragma is missing a variable name".to_string()));
                }
                pragmas.push(Pragma::Env {
                    var: var.to_string(),
                    value: value.trim().to_string(),
                });
            }
            other => return Err((index + 1, format!("unrecognized pragma `{other}`"))),
        }
    }

    Ok(pragmas)
}

/// Apply pragmas to the current process.
///
/// Must run before any other thread reads the environment: call it before the
/// watcher and the runtime are created.
pub fn apply(pragmas: &[Pragma]) {
    for pragma in pragmas {
        match pragma {
            Pragma::Env { var, value } => {
                crate::debug!("pragma"; "{}={}", var, value);
                // SAFETY: startup is still single threaded apart from the
                // Ctrl+C handler, which does not read the environment.
                unsafe { std::env::set_var(var, value) };
            }
        }
    }
}
