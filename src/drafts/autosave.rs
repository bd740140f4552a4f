use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTOSAVE_SECS: u64 = 30;
const MAX_AUTOSAVE_SECS: u64 = 365 * 24 * 60 * 60;

/// Cooperative autosave schedule, polled by whoever drives the event loop.
///
/// Inactive until started; cancelled on reset so no tick outlives its session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutosaveSchedule {
    interval_secs: u64,
    next_due: Option<DateTime<Utc>>,
    last_saved_revision: Option<u64>,
}

impl Default for AutosaveSchedule {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_SECS)
    }
}

impl AutosaveSchedule {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs,
            next_due: None,
            last_saved_revision: None,
        }
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn set_interval(&mut self, interval_secs: u64) {
        self.interval_secs = interval_secs;
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// (Re)arm the timer one interval from `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(now + self.interval());
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
        self.last_saved_revision = None;
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    pub fn needs_save(&self, revision: u64) -> bool {
        self.last_saved_revision != Some(revision)
    }

    pub fn mark_saved(&mut self, revision: u64, now: DateTime<Utc>) {
        self.last_saved_revision = Some(revision);
        self.start(now);
    }

    /// Keep the unsaved revision and try again next interval.
    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.start(now);
    }

    fn interval(&self) -> Duration {
        Duration::seconds(self.interval_secs.min(MAX_AUTOSAVE_SECS) as i64)
    }
}
