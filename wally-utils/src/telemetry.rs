//! Scoped timing logs for the expensive pipeline stages.
//!
//! A [`TimingGuard`] records when it was created and logs the elapsed time on drop, on the
//! `wally::telemetry` target. Guards are inert unless telemetry was switched on through
//! [`configure`] and the logger accepts the requested level.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Instant,
};

use log::{Level, LevelFilter, log, log_enabled};

const TARGET: &str = "wally::telemetry";

static ENABLED: AtomicBool = AtomicBool::new(false);
static MAX_LEVEL: AtomicUsize = AtomicUsize::new(0);

/// Logs how long a scope took when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    /// Returns `true` when the guard will emit a log entry on drop.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Start timing a scope labelled `label`, reported at `level`.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    let active = telemetry_allows(level) && log_enabled!(target: TARGET, level);
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active,
    }
}

/// Switch timing logs on or off and cap their verbosity.
pub fn configure(enabled: bool, level: LevelFilter) {
    ENABLED.store(enabled, Ordering::Relaxed);
    MAX_LEVEL.store(level as usize, Ordering::Relaxed);
}

/// Returns whether timing logs are switched on.
pub fn telemetry_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Returns `true` when telemetry is on and `level` is within the configured cap.
pub fn telemetry_allows(level: Level) -> bool {
    telemetry_enabled() && (level as usize) <= MAX_LEVEL.load(Ordering::Relaxed)
}
