//! Sweep metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe counters shared by both sweeps
#[derive(Debug)]
pub struct SweepMetrics {
    start_time: Instant,
    alert_ticks: AtomicU64,
    signal_ticks: AtomicU64,
    users_processed: AtomicU64,
    users_skipped: AtomicU64,
    users_failed: AtomicU64,
    events_sent: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`SweepMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub alert_ticks: u64,
    pub signal_ticks: u64,
    pub users_processed: u64,
    pub users_skipped: u64,
    pub users_failed: u64,
    pub events_sent: u64,
    pub send_failures: u64,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            alert_ticks: AtomicU64::new(0),
            signal_ticks: AtomicU64::new(0),
            users_processed: AtomicU64::new(0),
            users_skipped: AtomicU64::new(0),
            users_failed: AtomicU64::new(0),
            events_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
        }
    }

    pub fn increment_alert_ticks(&self) {
        self.alert_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signal_ticks(&self) {
        self.signal_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_processed(&self) {
        self.users_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.users_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.users_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_events_sent(&self, count: u64) {
        self.events_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_send_failures(&self, count: u64) {
        self.send_failures.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            alert_ticks: self.alert_ticks.load(Ordering::Relaxed),
            signal_ticks: self.signal_ticks.load(Ordering::Relaxed),
            users_processed: self.users_processed.load(Ordering::Relaxed),
            users_skipped: self.users_skipped.load(Ordering::Relaxed),
            users_failed: self.users_failed.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for SweepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = SweepMetrics::new();
        metrics.increment_alert_ticks();
        metrics.increment_processed();
        metrics.increment_processed();
        metrics.add_events_sent(3);
        metrics.add_send_failures(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.alert_ticks, 1);
        assert_eq!(snapshot.users_processed, 2);
        assert_eq!(snapshot.events_sent, 3);
        assert_eq!(snapshot.send_failures, 1);
        assert_eq!(snapshot.signal_ticks, 0);
    }
}
