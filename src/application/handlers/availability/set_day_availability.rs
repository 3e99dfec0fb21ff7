//! SetDayAvailabilityHandler - replace a counsellor's day schedule.

use std::sync::Arc;

use crate::domain::availability::DayAvailability;
use crate::domain::foundation::{DomainError, Interval, UserId, Weekday};
use crate::ports::AvailabilityRepository;

/// Command replacing all intervals of one weekday.
///
/// An empty interval list deletes the day entry.
#[derive(Debug, Clone)]
pub struct SetDayAvailabilityCommand {
    pub counsellor: UserId,
    pub weekday: Weekday,
    pub intervals: Vec<Interval>,
}

/// Handler for editing day availability.
pub struct SetDayAvailabilityHandler {
    availability: Arc<dyn AvailabilityRepository>,
}

impl SetDayAvailabilityHandler {
    pub fn new(availability: Arc<dyn AvailabilityRepository>) -> Self {
        Self { availability }
    }

    pub async fn handle(
        &self,
        cmd: SetDayAvailabilityCommand,
    ) -> Result<Option<DayAvailability>, DomainError> {
        if cmd.intervals.is_empty() {
            self.availability
                .delete_day(&cmd.counsellor, cmd.weekday)
                .await?;
            return Ok(None);
        }

        // Replace-all semantics; stored intervals are trusted
        // counsellor input and not checked against each other.
        let day = DayAvailability::new(cmd.counsellor, cmd.weekday, cmd.intervals);
        self.availability.upsert_day(&day).await?;
        Ok(Some(day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use chrono::NaiveTime;

    fn counsellor() -> UserId {
        UserId::new("counsellor-1").unwrap()
    }

    fn interval(start_h: u32, end_h: u32) -> Interval {
        Interval::new(
            NaiveTime::from_hms_opt(start_h, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(end_h, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn stores_and_replaces_the_whole_day() {
        let store = MemoryStore::new();
        let handler = SetDayAvailabilityHandler::new(Arc::new(store.availability()));

        handler
            .handle(SetDayAvailabilityCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                intervals: vec![interval(9, 10), interval(10, 11)],
            })
            .await
            .unwrap();

        let replaced = handler
            .handle(SetDayAvailabilityCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                intervals: vec![interval(14, 15)],
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.intervals(), &[interval(14, 15)]);

        let stored = store
            .availability()
            .find_day(&counsellor(), Weekday::Monday)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.intervals(), &[interval(14, 15)]);
    }

    #[tokio::test]
    async fn empty_interval_list_deletes_the_day() {
        let store = MemoryStore::new();
        let handler = SetDayAvailabilityHandler::new(Arc::new(store.availability()));

        handler
            .handle(SetDayAvailabilityCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                intervals: vec![interval(9, 10)],
            })
            .await
            .unwrap();

        let result = handler
            .handle(SetDayAvailabilityCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                intervals: vec![],
            })
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store
            .availability()
            .find_day(&counsellor(), Weekday::Monday)
            .await
            .unwrap()
            .is_none());
    }
}
