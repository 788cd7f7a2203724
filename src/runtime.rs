//! Single-threaded event loop.
//!
//! ```text
//! loop {
//!     shutdown signal  → return
//!     bridge.changed() → soft reload, run to completion
//! }
//! ```
//!
//! A reload blocks the loop. Filesystem events keep queueing in the bridge's
//! channel meanwhile and collapse into at most one further reload.

use tokio::sync::mpsc;

use crate::compiler::GraphCompiler;
use crate::root::{ReloadKind, RootWrapper};
use crate::watch::WatchBridge;

enum Wake {
    Shutdown,
    Changed,
}

/// Reload on every detected change until shutdown is signalled.
pub async fn run<C: GraphCompiler>(
    root: &mut RootWrapper<C, WatchBridge>,
    mut shutdown: mpsc::UnboundedReceiver<()>,
) {
    loop {
        let wake = tokio::select! {
            biased;
            _ = shutdown.recv() => Wake::Shutdown,
            () = root.watcher_mut().changed() => Wake::Changed,
        };

        match wake {
            Wake::Shutdown => break,
            Wake::Changed => {
                crate::debug!("reload"; "change detected in {}", root.entry().display());
                root.reload(ReloadKind::Soft);
                crate::debug!("watch"; "{} file(s) watched", root.watcher().watched().len());
            }
        }
    }
    crate::debug!("reload"; "runtime loop stopped at generation {}", root.current().id());
}

/// Drive [`run`] on a current-thread runtime.
pub fn run_blocking<C: GraphCompiler>(
    root: &mut RootWrapper<C, WatchBridge>,
    shutdown: mpsc::UnboundedReceiver<()>,
) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(run(root, shutdown));
    Ok(())
}
