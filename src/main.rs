//! Husk - a live-reloading desktop shell.

mod cli;
mod compiler;
mod config;
mod core;
mod generation;
mod logger;
mod root;
mod runtime;
mod scan;
mod utils;
mod watch;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use compiler::TomlCompiler;
use config::{Resolution, ResolveInputs, pragma};
use root::{RootError, RootWrapper};
use watch::WatchBridge;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let resolution = Resolution::new(ResolveInputs::from_env(&cli));
    if cli.current {
        println!("{}", resolution.report());
    }
    let entry = resolution.resolve()?;
    crate::log!("config"; "config file path: {}", entry.display());
    if cli.current {
        return Ok(());
    }

    pragma::apply(&pragma::read(&entry)?);

    if let Some(workdir) = &cli.workdir {
        std::env::set_current_dir(workdir)
            .with_context(|| format!("cannot enter working directory `{}`", workdir.display()))?;
    }

    let bridge = WatchBridge::new(cli.watch_config()).context("failed to start file watcher")?;

    let mut root = match RootWrapper::new(entry, TomlCompiler::new(), bridge) {
        Ok(root) => root,
        Err(RootError::InitialLoad { .. }) => std::process::exit(1),
        Err(e) => return Err(e.into()),
    };

    let shutdown = core::register_shutdown().context("runtime loop already registered")?;
    runtime::run_blocking(&mut root, shutdown).context("failed to start runtime")?;

    if core::is_shutdown() {
        crate::debug!("shell"; "shutdown requested, tearing down generation {}", root.current().id());
    }
    Ok(())
}
