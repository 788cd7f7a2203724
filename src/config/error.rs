//! Entry resolution error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while locating the entry file or reading its pragmas.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pass only one of --path or --config")]
    ConflictingSelection,

    #[error("cannot open config manifest `{}`", .0.display())]
    Manifest(PathBuf, #[source] std::io::Error),

    #[error("manifest line not in expected format `name = relative/path`: `{line}`")]
    ManifestLine { manifest: PathBuf, line: String },

    #[error("configuration `{name}` not found in manifest `{}`", manifest.display())]
    NotInManifest { name: String, manifest: PathBuf },

    #[error("base path `{}` does not exist or is not a directory", .0.display())]
    BasePath(PathBuf),

    #[error("no directory named `{name}` found in base path `{}`", base.display())]
    NotInBase { name: String, base: PathBuf },

    #[error("config path does not exist: `{}`", .0.display())]
    Missing(PathBuf),

    #[error("config path is not a regular file: `{}`", .0.display())]
    NotAFile(PathBuf),

    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{}:{line}: {message}", file.display())]
    Pragma {
        file: PathBuf,
        line: usize,
        message: String,
    },
}
