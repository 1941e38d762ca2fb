//! Rolling-window request quota

use chrono::{DateTime, Duration as TimeDelta, Utc};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use crate::core::models::QuotaStatus;

/// Per-session request quota over a rolling window.
///
/// Each recorded request expires on its own `window` after it happened, so
/// allowance comes back one request at a time instead of all at once.
/// Expired entries are purged lazily at the start of every operation.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    limit: u32,
    window: TimeDelta,
    timestamps: VecDeque<DateTime<Utc>>,
}

impl QuotaTracker {
    /// Create a tracker allowing `limit` requests per `window_hours`
    pub fn new(limit: u32, window_hours: u32) -> Self {
        Self {
            limit,
            window: TimeDelta::hours(i64::from(window_hours)),
            timestamps: VecDeque::new(),
        }
    }

    /// Configured ceiling
    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn purge(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        let before = self.timestamps.len();
        self.timestamps.retain(|t| now - *t < window);
        let evicted = before - self.timestamps.len();
        if evicted > 0 {
            debug!("Evicted {} expired quota entries", evicted);
        }
    }

    /// Requests left in the window. Goes negative if `record` was called past the limit.
    pub fn remaining(&mut self, now: DateTime<Utc>) -> i64 {
        self.purge(now);
        i64::from(self.limit) - self.timestamps.len() as i64
    }

    /// Time until the oldest entry expires, zero when nothing is recorded
    pub fn time_until_reset(&mut self, now: DateTime<Utc>) -> Duration {
        self.purge(now);
        self.timestamps
            .iter()
            .min()
            // Duration arithmetic only; `oldest + window` can overflow DateTime
            .map(|oldest| (self.window - (now - *oldest)).to_std().unwrap_or(Duration::ZERO))
            .unwrap_or(Duration::ZERO)
    }

    /// Count one successful translation at `now`
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.purge(now);
        self.timestamps.push_back(now);
        debug!(
            "Recorded request, {} of {} used in window",
            self.timestamps.len(),
            self.limit
        );
    }

    /// Display snapshot with the remaining count clamped at zero
    pub fn status(&mut self, now: DateTime<Utc>) -> QuotaStatus {
        let remaining = self.remaining(now).clamp(0, i64::from(self.limit)) as u32;
        QuotaStatus {
            remaining,
            limit: self.limit,
            reset_in: self.time_until_reset(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_hours(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::hours(h)
    }

    fn at_minutes(m: i64) -> DateTime<Utc> {
        at_hours(0) + TimeDelta::minutes(m)
    }

    #[test]
    fn test_rolling_window_recovers_per_entry() {
        let mut tracker = QuotaTracker::new(2, 24);
        tracker.record(at_hours(0));
        tracker.record(at_hours(1));

        assert_eq!(tracker.remaining(at_hours(2)), 0);
        assert_eq!(tracker.remaining(at_hours(25)), 1);
        assert_eq!(tracker.remaining(at_hours(26)), 2);
    }

    #[test]
    fn test_remaining_matches_entries_inside_window() {
        let mut tracker = QuotaTracker::new(20, 24);
        let recorded: Vec<i64> = vec![0, 90, 300, 600, 1400, 1439, 1500, 2000];
        for m in &recorded {
            tracker.record(at_minutes(*m));
        }

        // Checks start at the last record; earlier instants were purged by it
        for now in [2000, 2500, 3000, 3439, 3440, 3441, 5000] {
            let expected = recorded
                .iter()
                .filter(|m| now - **m < 24 * 60)
                .count() as i64;
            let mut snapshot = tracker.clone();
            assert_eq!(snapshot.remaining(at_minutes(now)), 20 - expected, "now = {now}");
        }
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let mut tracker = QuotaTracker::new(1, 24);
        tracker.record(at_hours(0));
        tracker.record(at_hours(0));
        tracker.record(at_hours(0));

        assert_eq!(tracker.remaining(at_hours(1)), -2);
        assert_eq!(tracker.status(at_hours(1)).remaining, 0);
    }

    #[test]
    fn test_time_until_reset_empty_is_zero() {
        let mut tracker = QuotaTracker::new(5, 24);
        assert_eq!(tracker.time_until_reset(at_hours(3)), Duration::ZERO);
    }

    #[test]
    fn test_time_until_reset_counts_down_to_oldest_expiry() {
        let mut tracker = QuotaTracker::new(5, 24);
        tracker.record(at_hours(0));
        tracker.record(at_hours(5));

        let mut previous = tracker.time_until_reset(at_hours(0));
        assert_eq!(previous, Duration::from_secs(24 * 3600));

        for m in (30..24 * 60).step_by(30) {
            let current = tracker.time_until_reset(at_minutes(m));
            assert!(current <= previous);
            assert!(current > Duration::ZERO);
            previous = current;
        }

        // Oldest expires exactly at 24h; the 5h entry now drives the ETA
        assert_eq!(
            tracker.time_until_reset(at_hours(24)),
            Duration::from_secs(5 * 3600)
        );
        assert_eq!(tracker.time_until_reset(at_hours(29)), Duration::ZERO);
    }

    #[test]
    fn test_huge_window_does_not_overflow() {
        let mut tracker = QuotaTracker::new(20, u32::MAX);
        tracker.record(at_hours(0));

        let status = tracker.status(at_hours(1));
        assert_eq!(status.remaining, 19);
        assert_eq!(
            status.reset_in,
            Duration::from_secs((u64::from(u32::MAX) - 1) * 3600)
        );
    }

    #[test]
    fn test_status_snapshot() {
        let mut tracker = QuotaTracker::new(20, 24);
        tracker.record(at_hours(0));

        let status = tracker.status(at_hours(4));
        assert_eq!(status.remaining, 19);
        assert_eq!(status.limit, 20);
        assert_eq!(status.reset_in, Duration::from_secs(20 * 3600));
    }
}
