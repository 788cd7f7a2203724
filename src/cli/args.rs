//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::watch::WatchConfig;

/// Live-reloading desktop shell
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Path to a shell file, or a directory containing `shell.toml`
    #[arg(short, long, value_hint = clap::ValueHint::AnyPath)]
    pub path: Option<String>,

    /// Name of a configuration in the manifest
    #[arg(short, long)]
    pub config: Option<String>,

    /// Path to a configuration manifest
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<String>,

    /// Initial working directory
    #[arg(short = 'd', long, value_hint = clap::ValueHint::DirPath)]
    pub workdir: Option<PathBuf>,

    /// Print where the configuration is looked up, then exit
    #[arg(long)]
    pub current: bool,

    /// Quiet period before a file change triggers a reload, in milliseconds
    #[arg(long, value_name = "MS")]
    pub debounce: Option<u64>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Watch timing with command line overrides applied.
    pub fn watch_config(&self) -> WatchConfig {
        let mut config = WatchConfig::default();
        if let Some(ms) = self.debounce {
            config.debounce = Duration::from_millis(ms);
        }
        config
    }
}
