//! Wall-clock aligned fire times for the signal sweep
//!
//! Each horizon fires on its candle-close boundary in UTC:
//!
//! | Horizon | Fires at |
//! |---|---|
//! | 2h | every even hour |
//! | 4h | 00, 04, 08, 12, 16, 20 |
//! | 1d | 00:00 |
//!
//! Boundaries that coincide (every 00:00 hits all three) are popped together so the
//! sweep runs once for the whole set.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use trendline_types::Horizon;

/// First boundary for `horizon` strictly after `after`
pub fn next_boundary(horizon: Horizon, after: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = after.date_naive().and_time(NaiveTime::MIN).and_utc();
    let period = Duration::hours(i64::from(horizon.period_hours()));
    let elapsed = (after - midnight).num_seconds();
    let periods = elapsed / period.num_seconds() + 1;
    midnight + period * periods as i32
}

/// Min-heap of upcoming (fire time, horizon) entries
#[derive(Debug, Clone, Default)]
pub struct HorizonSchedule {
    queue: BinaryHeap<Reverse<(DateTime<Utc>, Horizon)>>,
}

impl HorizonSchedule {
    /// Schedule each distinct horizon at its first boundary after `now`
    pub fn new(horizons: &[Horizon], now: DateTime<Utc>) -> Self {
        let mut distinct = horizons.to_vec();
        distinct.sort();
        distinct.dedup();

        let queue = distinct
            .into_iter()
            .map(|horizon| Reverse((next_boundary(horizon, now), horizon)))
            .collect();
        Self { queue }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest pending fire time
    pub fn peek_next(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|Reverse((at, _))| *at)
    }

    /// Pop every horizon due at the earliest instant and reschedule each one
    pub fn pop_due(&mut self) -> Option<(DateTime<Utc>, Vec<Horizon>)> {
        let Reverse((at, first)) = self.queue.pop()?;
        let mut due = vec![first];
        while let Some(Reverse((next_at, _))) = self.queue.peek() {
            if *next_at != at {
                break;
            }
            if let Some(Reverse((_, horizon))) = self.queue.pop() {
                due.push(horizon);
            }
        }

        for horizon in &due {
            self.queue
                .push(Reverse((next_boundary(*horizon, at), *horizon)));
        }
        Some((at, due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_next_boundary_alignment() {
        let now = at(10, 1, 30);
        assert_eq!(next_boundary(Horizon::H2, now), at(10, 2, 0));
        assert_eq!(next_boundary(Horizon::H4, now), at(10, 4, 0));
        assert_eq!(next_boundary(Horizon::D1, now), at(11, 0, 0));
    }

    #[test]
    fn test_next_boundary_is_strictly_after() {
        assert_eq!(next_boundary(Horizon::H2, at(10, 2, 0)), at(10, 4, 0));
        assert_eq!(next_boundary(Horizon::H4, at(10, 20, 0)), at(11, 0, 0));
        assert_eq!(next_boundary(Horizon::D1, at(10, 0, 0)), at(11, 0, 0));
        assert_eq!(next_boundary(Horizon::H2, at(10, 23, 59)), at(11, 0, 0));
    }

    #[test]
    fn test_pop_due_batches_coincident_horizons() {
        let mut schedule = HorizonSchedule::new(&Horizon::ALL, at(10, 21, 0));

        let (first, horizons) = schedule.pop_due().unwrap();
        assert_eq!(first, at(10, 22, 0));
        assert_eq!(horizons, vec![Horizon::H2]);

        let (midnight, mut horizons) = schedule.pop_due().unwrap();
        horizons.sort();
        assert_eq!(midnight, at(11, 0, 0));
        assert_eq!(horizons, vec![Horizon::H2, Horizon::H4, Horizon::D1]);

        let (next, horizons) = schedule.pop_due().unwrap();
        assert_eq!(next, at(11, 2, 0));
        assert_eq!(horizons, vec![Horizon::H2]);
    }

    #[test]
    fn test_duplicate_horizons_scheduled_once() {
        let mut schedule = HorizonSchedule::new(&[Horizon::H4, Horizon::H4], at(10, 1, 0));
        let (_, horizons) = schedule.pop_due().unwrap();
        assert_eq!(horizons, vec![Horizon::H4]);
        assert_eq!(schedule.peek_next(), Some(at(10, 8, 0)));
    }
}
