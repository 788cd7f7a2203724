//! Locating the entry file.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── candidate.rs   # Candidate lists, first match wins
//! ├── manifest.rs    # `name = relative/path` manifest lookup
//! ├── pragma.rs      # `#@ pragma` lines of the entry file
//! ├── error.rs       # ConfigError
//! └── mod.rs         # Resolution (this file)
//! ```
//!
//! # Settings
//!
//! | Setting       | Candidates (precedence order)                             |
//! |---------------|-----------------------------------------------------------|
//! | base path     | `HUSK_BASE_PATH`, `$XDG_CONFIG_HOME/husk`                 |
//! | config path   | `--path` (0), `HUSK_CONFIG_PATH` (1)                      |
//! | manifest      | `--manifest` (0), `HUSK_MANIFEST` (1), `<base>/manifest.conf` (2) |
//! | config name   | `--config` (0), `HUSK_CONFIG_NAME` (1)                    |
//!
//! A config path wins over a config name of the same or a weaker level.

mod candidate;
mod error;
pub mod manifest;
pub mod pragma;

use std::path::{Path, PathBuf};

pub use candidate::{Candidate, Setting, Source};
pub use error::ConfigError;

use crate::cli::Cli;

/// Entry file looked up inside a config directory.
pub const ENTRY_FILE: &str = "shell.toml";
/// Manifest looked up inside the base path.
pub const MANIFEST_FILE: &str = "manifest.conf";

const ENV_BASE_PATH: &str = "HUSK_BASE_PATH";
const ENV_CONFIG_PATH: &str = "HUSK_CONFIG_PATH";
const ENV_MANIFEST: &str = "HUSK_MANIFEST";
const ENV_CONFIG_NAME: &str = "HUSK_CONFIG_NAME";

/// Raw values every candidate is built from.
#[derive(Debug, Clone, Default)]
pub struct ResolveInputs {
    pub path_option: Option<String>,
    pub config_option: Option<String>,
    pub manifest_option: Option<String>,
    pub base_env: Option<String>,
    pub path_env: Option<String>,
    pub manifest_env: Option<String>,
    pub name_env: Option<String>,
    pub default_base: Option<String>,
}

impl ResolveInputs {
    /// Read the command line and the process environment.
    pub fn from_env(cli: &Cli) -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            path_option: cli.path.clone(),
            config_option: cli.config.clone(),
            manifest_option: cli.manifest.clone(),
            base_env: var(ENV_BASE_PATH),
            path_env: var(ENV_CONFIG_PATH),
            manifest_env: var(ENV_MANIFEST),
            name_env: var(ENV_CONFIG_NAME),
            default_base: default_base(var("XDG_CONFIG_HOME")),
        }
    }
}

/// `$XDG_CONFIG_HOME/husk`, falling back to `~/.config/husk`.
fn default_base(xdg_config_home: Option<String>) -> Option<String> {
    let config_home = match xdg_config_home {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(shellexpand::tilde("~/.config").as_ref()),
    };
    Some(config_home.join("husk").to_string_lossy().into_owned())
}

/// Every setting with its candidates.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub base: Setting,
    pub path: Setting,
    pub manifest: Setting,
    pub name: Setting,
}

impl Resolution {
    pub fn new(inputs: ResolveInputs) -> Self {
        let base = Setting::new(
            "Base path",
            vec![
                Candidate::new(Source::Environment(ENV_BASE_PATH), 0, inputs.base_env),
                Candidate::new(Source::Default, 0, inputs.default_base),
            ],
        );

        let default_manifest = base
            .value()
            .map(|base| expand(base).join(MANIFEST_FILE).to_string_lossy().into_owned());

        let path = Setting::new(
            "Config path",
            vec![
                Candidate::new(Source::Option("--path"), 0, inputs.path_option),
                Candidate::new(Source::Environment(ENV_CONFIG_PATH), 1, inputs.path_env),
            ],
        );

        let manifest = Setting::new(
            "Manifest path",
            vec![
                Candidate::new(Source::Option("--manifest"), 0, inputs.manifest_option),
                Candidate::new(Source::Environment(ENV_MANIFEST), 1, inputs.manifest_env),
                Candidate::new(Source::Default, 2, default_manifest),
            ],
        );

        let name = Setting::new(
            "Config name",
            vec![
                Candidate::new(Source::Option("--config"), 0, inputs.config_option),
                Candidate::new(Source::Environment(ENV_CONFIG_NAME), 1, inputs.name_env),
            ],
        );

        Self {
            base,
            path,
            manifest,
            name,
        }
    }

    /// Every setting and candidate, for `--current`.
    pub fn report(&self) -> String {
        [&self.base, &self.path, &self.manifest, &self.name]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Canonical path of the entry file.
    pub fn resolve(&self) -> Result<PathBuf, ConfigError> {
        if self.path.level() == 0 && self.name.level() == 0 {
            return Err(ConfigError::ConflictingSelection);
        }

        let selected = match (self.path.value(), self.name.value()) {
            (Some(path), _) if self.path.level() <= self.name.level() => expand(path),
            (_, Some(name)) => self.find_named(name)?,
            _ => self.base_dir()?,
        };

        entry_file(&selected)
    }

    fn find_named(&self, name: &str) -> Result<PathBuf, ConfigError> {
        if let Some(manifest) = self.manifest.value() {
            let manifest = expand(manifest);
            match manifest::lookup(&manifest, name) {
                Ok(Some(path)) => return Ok(path),
                Ok(None) => {
                    return Err(ConfigError::NotInManifest {
                        name: name.to_string(),
                        manifest,
                    });
                }
                // Only the default manifest is optional.
                Err(ConfigError::Manifest(..)) if self.manifest.level() >= 2 => {
                    crate::debug!("config"; "no manifest at {}", manifest.display());
                }
                Err(e) => return Err(e),
            }
        }

        let base = self.base_dir()?;
        let dir = base.join(name);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(ConfigError::NotInBase {
                name: name.to_string(),
                base,
            })
        }
    }

    fn base_dir(&self) -> Result<PathBuf, ConfigError> {
        let base = self.base.value().map(expand).unwrap_or_default();
        if base.is_dir() {
            Ok(base)
        } else {
            Err(ConfigError::BasePath(base))
        }
    }
}

/// A directory resolves to its `shell.toml`; the result must be a regular file.
fn entry_file(path: &Path) -> Result<PathBuf, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing(path.to_path_buf()));
    }

    let file = if path.is_dir() {
        path.join(ENTRY_FILE)
    } else {
        path.to_path_buf()
    };
    if !file.exists() {
        return Err(ConfigError::Missing(file));
    }

    let file = file.canonicalize().map_err(|e| ConfigError::Io(file.clone(), e))?;
    if !file.is_file() {
        return Err(ConfigError::NotAFile(file));
    }
    Ok(file)
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Base directory with `default/shell.toml` and `bar/shell.toml`.
    fn base() -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in ["default", "bar"] {
            fs::create_dir_all(temp.path().join(name)).unwrap();
            fs::write(temp.path().join(name).join(ENTRY_FILE), "").unwrap();
        }
        fs::write(temp.path().join(ENTRY_FILE), "").unwrap();
        temp
    }

    fn inputs(base: &TempDir) -> ResolveInputs {
        ResolveInputs {
            default_base: Some(base.path().to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    fn canonical(path: PathBuf) -> PathBuf {
        path.canonicalize().unwrap()
    }

    #[test]
    fn test_default_base() {
        assert_eq!(
            default_base(Some("/xdg".to_string())),
            Some("/xdg/husk".to_string())
        );
        assert!(default_base(None).unwrap().ends_with(".config/husk"));
    }

    #[test]
    fn test_neither_path_nor_name_uses_base() {
        let base = base();
        let resolved = Resolution::new(inputs(&base)).resolve().unwrap();
        assert_eq!(resolved, canonical(base.path().join(ENTRY_FILE)));
    }

    #[test]
    fn test_path_option_directory() {
        let base = base();
        let resolved = Resolution::new(ResolveInputs {
            path_option: Some(base.path().join("bar").to_string_lossy().into_owned()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap();
        assert_eq!(resolved, canonical(base.path().join("bar/shell.toml")));
    }

    #[test]
    fn test_path_and_config_options_conflict() {
        let base = base();
        let err = Resolution::new(ResolveInputs {
            path_option: Some("/somewhere".to_string()),
            config_option: Some("bar".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingSelection));
    }

    #[test]
    fn test_config_option_beats_path_env() {
        let base = base();
        let resolved = Resolution::new(ResolveInputs {
            path_env: Some(base.path().join("default").to_string_lossy().into_owned()),
            config_option: Some("bar".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap();
        assert_eq!(resolved, canonical(base.path().join("bar/shell.toml")));
    }

    #[test]
    fn test_path_env_beats_name_env() {
        let base = base();
        let resolved = Resolution::new(ResolveInputs {
            path_env: Some(base.path().join("default").to_string_lossy().into_owned()),
            name_env: Some("bar".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap();
        assert_eq!(resolved, canonical(base.path().join("default/shell.toml")));
    }

    #[test]
    fn test_name_found_in_manifest() {
        let base = base();
        fs::create_dir_all(base.path().join("setups/work")).unwrap();
        fs::write(base.path().join("setups/work/main.toml"), "").unwrap();
        fs::write(
            base.path().join(MANIFEST_FILE),
            "# manifest\nwork = setups/work/main.toml\n",
        )
        .unwrap();

        let resolved = Resolution::new(ResolveInputs {
            config_option: Some("work".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap();
        assert_eq!(resolved, canonical(base.path().join("setups/work/main.toml")));
    }

    #[test]
    fn test_name_missing_from_manifest() {
        let base = base();
        fs::write(base.path().join(MANIFEST_FILE), "work = work\n").unwrap();

        let err = Resolution::new(ResolveInputs {
            config_option: Some("bar".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotInManifest { .. }));
    }

    #[test]
    fn test_missing_default_manifest_falls_back_to_base_dir() {
        let base = base();
        let resolved = Resolution::new(ResolveInputs {
            name_env: Some("bar".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap();
        assert_eq!(resolved, canonical(base.path().join("bar/shell.toml")));
    }

    #[test]
    fn test_missing_explicit_manifest_is_error() {
        let base = base();
        let err = Resolution::new(ResolveInputs {
            config_option: Some("bar".to_string()),
            manifest_env: Some(base.path().join("nope.conf").to_string_lossy().into_owned()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Manifest(..)));
    }

    #[test]
    fn test_unknown_name_in_base() {
        let base = base();
        let err = Resolution::new(ResolveInputs {
            config_option: Some("nope".to_string()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotInBase { .. }));
    }

    #[test]
    fn test_directory_without_entry_file() {
        let base = base();
        fs::create_dir_all(base.path().join("empty")).unwrap();
        let err = Resolution::new(ResolveInputs {
            path_option: Some(base.path().join("empty").to_string_lossy().into_owned()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(p) if p.ends_with("empty/shell.toml")));
    }

    #[test]
    fn test_entry_file_that_is_a_directory() {
        let base = base();
        fs::create_dir_all(base.path().join("odd/shell.toml")).unwrap();
        let err = Resolution::new(ResolveInputs {
            path_option: Some(base.path().join("odd").to_string_lossy().into_owned()),
            ..inputs(&base)
        })
        .resolve()
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile(_)));
    }

    #[test]
    fn test_report_names_every_setting() {
        let base = base();
        let report = Resolution::new(inputs(&base)).report();
        for name in ["Base path", "Config path", "Manifest path", "Config name"] {
            assert!(report.contains(name));
        }
        assert!(report.contains(MANIFEST_FILE));
    }
}
