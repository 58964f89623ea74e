//! Scheduler trigger lookups.
//!
//! The schedulers themselves run elsewhere; admission only needs the last
//! instant at which each scheduled transaction type was due.

use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

/// Transaction kinds bound to a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledKind {
    /// Daily rotation of the network shared secrets.
    NodeSharedSecrets,
    /// Periodic oracle data point.
    Oracle,
    /// Daily node rewards distribution.
    NodeRewards,
    /// Daily reward minting.
    MintRewards,
}

/// Last-trigger lookups for the scheduled transaction types.
pub trait SchedulerRegistry: Send + Sync {
    /// The largest scheduled instant ≤ `now` for `kind`.
    fn last_trigger_at(&self, kind: ScheduledKind, now: DateTime<Utc>) -> DateTime<Utc>;
}

/// Fixed-interval schedules anchored at the Unix epoch.
pub struct IntervalSchedulers {
    intervals: HashMap<ScheduledKind, i64>,
}

impl IntervalSchedulers {
    /// Production cadence: daily secrets/rewards, 10-minute oracle.
    pub fn new() -> Self {
        let mut intervals = HashMap::new();
        intervals.insert(ScheduledKind::NodeSharedSecrets, 86_400);
        intervals.insert(ScheduledKind::Oracle, 600);
        intervals.insert(ScheduledKind::NodeRewards, 86_400);
        intervals.insert(ScheduledKind::MintRewards, 86_400);
        Self { intervals }
    }

    /// Override the interval of one kind, in seconds.
    pub fn with_interval(mut self, kind: ScheduledKind, seconds: i64) -> Self {
        self.intervals.insert(kind, seconds);
        self
    }
}

impl Default for IntervalSchedulers {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerRegistry for IntervalSchedulers {
    fn last_trigger_at(&self, kind: ScheduledKind, now: DateTime<Utc>) -> DateTime<Utc> {
        let interval = self.intervals.get(&kind).copied().unwrap_or(86_400);
        let last = now.timestamp().div_euclid(interval) * interval;
        Utc.timestamp_opt(last, 0).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_ten_minute_window() {
        let schedulers = IntervalSchedulers::new();
        // 2022-01-01T00:10:03Z → the last 10-minute boundary is 00:10:00.
        let now = Utc.timestamp_opt(1_640_995_803, 0).unwrap();
        let last = schedulers.last_trigger_at(ScheduledKind::Oracle, now);
        assert_eq!(last, Utc.timestamp_opt(1_640_995_800, 0).unwrap());
    }

    #[test]
    fn test_daily_window() {
        let schedulers = IntervalSchedulers::new();
        let now = Utc.timestamp_opt(1_640_995_803, 0).unwrap();
        let last = schedulers.last_trigger_at(ScheduledKind::MintRewards, now);
        assert_eq!(last, Utc.timestamp_opt(1_640_995_200, 0).unwrap());
    }

    #[test]
    fn test_exact_boundary_is_its_own_trigger() {
        let schedulers = IntervalSchedulers::new();
        let boundary = Utc.timestamp_opt(1_640_995_800, 0).unwrap();
        assert_eq!(
            schedulers.last_trigger_at(ScheduledKind::Oracle, boundary),
            boundary
        );
    }
}
