//! Per-counsellor, per-weekday availability entry.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Interval, Timestamp, UserId, Weekday};

/// The open intervals a counsellor declared for one weekday.
///
/// Editing a day replaces the whole list; stored intervals are trusted
/// counsellor input and deliberately not checked for overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    counsellor: UserId,
    weekday: Weekday,
    intervals: Vec<Interval>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl DayAvailability {
    /// Creates a day entry with the given intervals.
    pub fn new(counsellor: UserId, weekday: Weekday, intervals: Vec<Interval>) -> Self {
        let now = Timestamp::now();
        Self {
            counsellor,
            weekday,
            intervals,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a day entry from persistence.
    pub fn reconstitute(
        counsellor: UserId,
        weekday: Weekday,
        intervals: Vec<Interval>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            counsellor,
            weekday,
            intervals,
            created_at,
            updated_at,
        }
    }

    pub fn counsellor(&self) -> &UserId {
        &self.counsellor
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Replaces the whole interval list.
    pub fn replace_intervals(&mut self, intervals: Vec<Interval>) {
        self.intervals = intervals;
        self.updated_at = Timestamp::now();
    }

    /// Removes a single interval by value match.
    ///
    /// Returns true if an interval was removed; removing an absent
    /// interval is a no-op.
    pub fn remove_interval(&mut self, interval: &Interval) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|stored| stored != interval);
        let removed = self.intervals.len() != before;
        if removed {
            self.updated_at = Timestamp::now();
        }
        removed
    }

    /// Returns the stored intervals minus those already claimed.
    ///
    /// A stored interval is claimed when its start time equals the start
    /// of a booked session interval.
    pub fn open_intervals(&self, claimed_starts: &[NaiveTime]) -> Vec<Interval> {
        self.intervals
            .iter()
            .filter(|interval| !claimed_starts.iter().any(|start| interval.starts_at(*start)))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counsellor() -> UserId {
        UserId::new("counsellor-1").unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn interval(start_h: u32, end_h: u32) -> Interval {
        Interval::new(t(start_h, 0), t(end_h, 0)).unwrap()
    }

    fn monday() -> DayAvailability {
        DayAvailability::new(
            counsellor(),
            Weekday::Monday,
            vec![interval(9, 10), interval(10, 11), interval(14, 15)],
        )
    }

    #[test]
    fn replace_intervals_swaps_the_whole_list() {
        let mut day = monday();
        day.replace_intervals(vec![interval(16, 17)]);
        assert_eq!(day.intervals(), &[interval(16, 17)]);
    }

    #[test]
    fn remove_interval_matches_by_value() {
        let mut day = monday();
        assert!(day.remove_interval(&interval(10, 11)));
        assert_eq!(day.intervals().len(), 2);
        assert!(!day.intervals().contains(&interval(10, 11)));
    }

    #[test]
    fn remove_absent_interval_is_a_no_op() {
        let mut day = monday();
        assert!(!day.remove_interval(&interval(12, 13)));
        assert_eq!(day.intervals().len(), 3);
    }

    #[test]
    fn open_intervals_subtracts_by_start_time_equality() {
        let day = monday();
        let open = day.open_intervals(&[t(10, 0)]);
        assert_eq!(open, vec![interval(9, 10), interval(14, 15)]);
    }

    #[test]
    fn open_intervals_with_no_claims_returns_everything() {
        let day = monday();
        assert_eq!(day.open_intervals(&[]).len(), 3);
    }

    #[test]
    fn overlapping_intervals_are_stored_as_given() {
        // Trusted counsellor input: no overlap validation on purpose.
        let day = DayAvailability::new(
            counsellor(),
            Weekday::Friday,
            vec![interval(9, 11), interval(10, 12)],
        );
        assert_eq!(day.intervals().len(), 2);
    }
}
