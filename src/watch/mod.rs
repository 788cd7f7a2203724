//! File Watch Bridge
//!
//! Turns raw filesystem events for the current watch set into a single,
//! payload-free "something changed" notification.
//!
//! ```text
//! notify thread ──▶ unbounded channel ──▶ filter (watched files, relevant kinds)
//!                                            │
//!                                            ▼
//!                     Debouncer (one pending flag, debounce + cooldown)
//!                                            │
//!                                 armed? ──▶ changed()
//! ```
//!
//! After firing the bridge is disarmed. It stays disarmed until the next
//! `set_watched_paths`, which the root wrapper issues after every reload
//! attempt. Events keep being recorded meanwhile, so a change made during a
//! reload produces exactly one further notification.

mod debouncer;
mod subscription;


use std::time::Duration;

use notify::{Event, RecommendedWatcher};
use tokio::sync::mpsc;

use crate::scan::PathSet;
use debouncer::{Debouncer, IDLE, is_relevant};
use subscription::Subscription;

/// How often missing directories are retried.
const MAINTAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Receives the watch set of every reload attempt.
pub trait PathWatcher {
    /// Watch exactly `paths` from now on, and re-arm change notification.
    fn set_watched_paths(&mut self, paths: &PathSet);
}

/// Detection timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchConfig {
    /// Quiet period required after the last event.
    pub debounce: Duration,
    /// Minimum time between two notifications.
    pub cooldown: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            cooldown: Duration::from_millis(300),
        }
    }
}

/// notify-backed [`PathWatcher`].
pub struct WatchBridge {
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Raw events, sent from notify's own thread
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    state: BridgeState,
}

impl WatchBridge {
    pub fn new(config: WatchConfig) -> notify::Result<Self> {
        let (tx, events) = mpsc::unbounded_channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        Ok(Self {
            watcher,
            events,
            state: BridgeState::new(config),
        })
    }

    pub fn watched(&self) -> &PathSet {
        self.state.subscription.files()
    }

    /// Wait until a watched file changed.
    ///
    /// Only resolves while armed; cancel-safe.
    pub async fn changed(&mut self) {
        loop {
            if self.poll_change() {
                return;
            }

            let wait = self.state.sleep_duration();
            let wake = tokio::select! {
                received = self.events.recv() => Wake::Event(received),
                () = tokio::time::sleep(wait) => Wake::Timer,
            };

            match wake {
                Wake::Event(Some(result)) => self.receive(result),
                // The sender lives in the watcher we own.
                Wake::Event(None) => std::future::pending::<()>().await,
                Wake::Timer => {}
            }
        }
    }

    /// Non-blocking: take a ready change notification, if any.
    pub fn poll_change(&mut self) -> bool {
        self.drain();
        if self.state.subscription.maintain(&mut self.watcher) {
            self.state.debouncer.record();
        }
        self.state.take_change()
    }

    fn drain(&mut self) {
        while let Ok(result) = self.events.try_recv() {
            self.receive(result);
        }
    }

    fn receive(&mut self, result: notify::Result<Event>) {
        match result {
            Ok(event) => self.state.ingest(&event),
            Err(e) => crate::log!("watch"; "notify error: {}", e),
        }
    }
}

enum Wake {
    Event(Option<notify::Result<Event>>),
    Timer,
}

impl PathWatcher for WatchBridge {
    fn set_watched_paths(&mut self, paths: &PathSet) {
        // Events already queued belong to the outgoing set.
        self.drain();
        self.state.subscription.replace(&mut self.watcher, paths);
        self.state.arm();
    }
}

/// Event filtering and arming, independent of the notify backend.
struct BridgeState {
    subscription: Subscription,
    debouncer: Debouncer,
    armed: bool,
}

impl BridgeState {
    fn new(config: WatchConfig) -> Self {
        Self {
            subscription: Subscription::new(),
            debouncer: Debouncer::new(config),
            armed: false,
        }
    }

    fn ingest(&mut self, event: &Event) {
        // Events were lost (e.g. inotify queue overflow); any file may have changed.
        if event.need_rescan() {
            crate::debug!("watch"; "backend requested a rescan");
            self.debouncer.record();
            return;
        }
        if !is_relevant(&event.kind) {
            return;
        }
        let Some(path) = event.paths.iter().find(|path| self.subscription.matches(path)) else {
            return;
        };
        crate::debug!("watch"; "{:?}: {}", event.kind, path.display());
        self.debouncer.record();
    }

    fn arm(&mut self) {
        self.armed = true;
    }

    fn take_change(&mut self) -> bool {
        if !self.armed || !self.debouncer.take_if_ready() {
            return false;
        }
        self.armed = false;
        true
    }

    fn sleep_duration(&self) -> Duration {
        let wait = if self.armed {
            self.debouncer.sleep_duration()
        } else {
            IDLE
        };
        if self.subscription.is_incomplete() {
            wait.min(MAINTAIN_INTERVAL)
        } else {
            wait
        }
    }
}
