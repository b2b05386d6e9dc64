//! Countdown to the next auto-save

/// Seconds left until the next trigger. Never persisted.
///
/// A countdown becomes *stale* when the controller's memory was rebuilt after
/// a host suspension: it reads zero until the next tick reconciles it against
/// the trigger alarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining_seconds: u64,
    stale: bool,
}

impl Countdown {
    /// Create a stopped countdown
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Restart from the full interval
    pub fn reset(&mut self, full_seconds: u64) {
        self.remaining_seconds = full_seconds;
        self.stale = false;
    }

    pub fn stop(&mut self) {
        self.remaining_seconds = 0;
        self.stale = false;
    }

    /// Decrement by one second. Returns false when already at zero; the
    /// countdown then waits at zero for the next trigger or settings change.
    pub fn tick(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        true
    }

    /// Drop to the zero shape used right after a resume
    pub fn mark_stale(&mut self) {
        self.remaining_seconds = 0;
        self.stale = true;
    }

    /// Replace a stale value with one derived from the trigger's due time
    pub fn reconcile(&mut self, remaining_seconds: u64, full_seconds: u64) {
        self.remaining_seconds = remaining_seconds.min(full_seconds);
        self.stale = false;
    }
}
