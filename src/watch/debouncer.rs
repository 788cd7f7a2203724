use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;

use super::WatchConfig;

/// Sleep used when nothing is pending.
pub(super) const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: collapses any number of events into one pending change.
///
/// A change is ready once no event arrived for `debounce` and at least
/// `cooldown` has passed since the previous one was taken.
pub(super) struct Debouncer {
    config: WatchConfig,
    pub(super) pending: bool,
    pub(super) last_event: Option<Instant>,
    pub(super) last_fire: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(config: WatchConfig) -> Self {
        Self {
            config,
            pending: false,
            last_event: None,
            last_fire: None,
        }
    }

    pub(super) fn record(&mut self) {
        self.pending = true;
        self.last_event = Some(Instant::now());
    }

    /// Take the pending change if debounce and cooldown have elapsed.
    pub(super) fn take_if_ready(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.pending = false;
        self.last_event = None;
        self.last_fire = Some(Instant::now());
        true
    }

    pub(super) fn is_ready(&self) -> bool {
        if !self.pending {
            return false;
        }

        if let Some(last_event) = self.last_event
            && last_event.elapsed() < self.config.debounce
        {
            return false;
        }

        if let Some(last_fire) = self.last_fire
            && last_fire.elapsed() < self.config.cooldown
        {
            return false;
        }

        true
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        if !self.pending {
            return IDLE;
        }

        let debounce_remaining = self
            .last_event
            .map(|t| self.config.debounce.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        let cooldown_remaining = self
            .last_fire
            .map(|t| self.config.cooldown.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce_remaining
            .max(cooldown_remaining)
            .max(Duration::from_millis(1))
    }
}

/// Whether an event kind can mean the file contents changed.
///
/// Access and metadata-only events (mtime/atime/chmod noise) never are.
pub(super) fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}
