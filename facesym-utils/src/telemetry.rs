//! Scoped timing guards for the analysis pipeline.
//!
//! A [`TimingGuard`] records when a pipeline stage (model loading, detection, landmark
//! regression, scoring) started and logs the elapsed time under the `facesym::telemetry`
//! target when it goes out of scope. Guards only become active when telemetry has been
//! switched on through [`configure`] and the requested level passes both the configured
//! threshold and the global log filter.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicU8, Ordering},
    time::Instant,
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target of every timing entry.
pub const TELEMETRY_TARGET: &str = "facesym::telemetry";

/// Highest level telemetry may emit; `0` means telemetry is switched off.
static THRESHOLD: AtomicU8 = AtomicU8::new(0);

/// Logs the lifetime of a pipeline stage when dropped.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if self.active {
            log!(
                target: TELEMETRY_TARGET,
                self.level,
                "{} completed in {:.2?}",
                self.label,
                self.start.elapsed()
            );
        }
    }
}

/// Create a guard for `label` that logs at `level`.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active: telemetry_allows(level) && log_enabled!(target: TELEMETRY_TARGET, level),
    }
}

/// Switch telemetry on or off and set the most verbose level it may emit.
pub fn configure(enabled: bool, level: LevelFilter) {
    let threshold = if enabled { level as usize as u8 } else { 0 };
    THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Returns `true` when telemetry is enabled and `level` is within the threshold.
fn telemetry_allows(level: Level) -> bool {
    let threshold = THRESHOLD.load(Ordering::Relaxed);
    threshold > 0 && (level as usize as u8) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    // Telemetry state is process-global, so every assertion lives in one test.
    #[test]
    fn configuration_controls_threshold() {
        configure(false, LevelFilter::Trace);
        assert_eq!(THRESHOLD.load(Ordering::Relaxed), 0);
        assert!(!telemetry_allows(Level::Error));
        assert!(!timing_guard("disabled", Level::Error).active);

        configure(true, LevelFilter::Info);
        assert!(telemetry_allows(Level::Warn));
        assert!(telemetry_allows(Level::Info));
        assert!(!telemetry_allows(Level::Debug));

        configure(false, LevelFilter::Info);
        assert!(!telemetry_allows(Level::Error));
    }
}
