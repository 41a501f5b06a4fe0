//! Global atomic counters for onboarding engine observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a demo run).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters. No allocations or locking.
pub struct Metrics {
    assignments_created: AtomicU64,
    submissions_completed: AtomicU64,
    cascade_steps_failed: AtomicU64,
    action_plans_created: AtomicU64,
    results_recorded: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub assignments_created: u64,
    pub submissions_completed: u64,
    pub cascade_steps_failed: u64,
    pub action_plans_created: u64,
    pub results_recorded: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            assignments_created: AtomicU64::new(0),
            submissions_completed: AtomicU64::new(0),
            cascade_steps_failed: AtomicU64::new(0),
            action_plans_created: AtomicU64::new(0),
            results_recorded: AtomicU64::new(0),
        }
    }

    pub fn inc_assignments_created(&self, count: u64) {
        self.assignments_created.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "assignments_created", count, "counter incremented");
    }

    pub fn inc_submissions_completed(&self) {
        self.submissions_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "submissions_completed", "counter incremented");
    }

    pub fn inc_cascade_steps_failed(&self) {
        self.cascade_steps_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cascade_steps_failed", "counter incremented");
    }

    pub fn inc_action_plans_created(&self) {
        self.action_plans_created.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "action_plans_created", "counter incremented");
    }

    pub fn inc_results_recorded(&self) {
        self.results_recorded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "results_recorded", "counter incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            assignments_created: self.assignments_created.load(Ordering::Relaxed),
            submissions_completed: self.submissions_completed.load(Ordering::Relaxed),
            cascade_steps_failed: self.cascade_steps_failed.load(Ordering::Relaxed),
            action_plans_created: self.action_plans_created.load(Ordering::Relaxed),
            results_recorded: self.results_recorded.load(Ordering::Relaxed),
        }
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries rather than on every increment.
    pub fn flush(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            metric = "flush",
            assignments_created = snapshot.assignments_created,
            submissions_completed = snapshot.submissions_completed,
            cascade_steps_failed = snapshot.cascade_steps_failed,
            action_plans_created = snapshot.action_plans_created,
            results_recorded = snapshot.results_recorded,
        );
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.assignments_created.store(0, Ordering::Relaxed);
        self.submissions_completed.store(0, Ordering::Relaxed);
        self.cascade_steps_failed.store(0, Ordering::Relaxed);
        self.action_plans_created.store(0, Ordering::Relaxed);
        self.results_recorded.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());

        m.inc_assignments_created(2);
        m.inc_submissions_completed();
        m.inc_cascade_steps_failed();
        m.inc_action_plans_created();
        m.inc_results_recorded();
        m.inc_results_recorded();

        let snapshot = m.snapshot();
        assert_eq!(snapshot.assignments_created, 2);
        assert_eq!(snapshot.submissions_completed, 1);
        assert_eq!(snapshot.cascade_steps_failed, 1);
        assert_eq!(snapshot.action_plans_created, 1);
        assert_eq!(snapshot.results_recorded, 2);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_assignments_created(3);
        m.inc_submissions_completed();
        m.reset();
        assert_eq!(m.snapshot(), MetricsSnapshot::default());
    }
}
