//! RemoveIntervalHandler - delete one interval from a day schedule.

use std::sync::Arc;

use crate::domain::availability::DayAvailability;
use crate::domain::foundation::{DomainError, ErrorCode, Interval, UserId, Weekday};
use crate::ports::AvailabilityRepository;

/// Command removing a single interval by value match.
#[derive(Debug, Clone)]
pub struct RemoveIntervalCommand {
    pub counsellor: UserId,
    pub weekday: Weekday,
    pub interval: Interval,
}

/// Handler for removing one availability interval.
pub struct RemoveIntervalHandler {
    availability: Arc<dyn AvailabilityRepository>,
}

impl RemoveIntervalHandler {
    pub fn new(availability: Arc<dyn AvailabilityRepository>) -> Self {
        Self { availability }
    }

    pub async fn handle(
        &self,
        cmd: RemoveIntervalCommand,
    ) -> Result<Option<DayAvailability>, DomainError> {
        let mut day = self
            .availability
            .find_day(&cmd.counsellor, cmd.weekday)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AvailabilityNotFound,
                    format!("No availability for {} on {}", cmd.counsellor, cmd.weekday),
                )
            })?;

        // Removing an absent interval is a silent no-op.
        day.remove_interval(&cmd.interval);

        if day.is_empty() {
            self.availability
                .delete_day(&cmd.counsellor, cmd.weekday)
                .await?;
            return Ok(None);
        }

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

    async fn seeded_store(intervals: Vec<Interval>) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .availability()
            .upsert_day(&DayAvailability::new(
                counsellor(),
                Weekday::Monday,
                intervals,
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn removes_matching_interval() {
        let store = seeded_store(vec![interval(9, 10), interval(10, 11)]).await;
        let handler = RemoveIntervalHandler::new(Arc::new(store.availability()));

        let day = handler
            .handle(RemoveIntervalCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                interval: interval(9, 10),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.intervals(), &[interval(10, 11)]);
    }

    #[tokio::test]
    async fn removing_the_last_interval_deletes_the_day() {
        let store = seeded_store(vec![interval(9, 10)]).await;
        let handler = RemoveIntervalHandler::new(Arc::new(store.availability()));

        let result = handler
            .handle(RemoveIntervalCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                interval: interval(9, 10),
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

    #[tokio::test]
    async fn absent_interval_is_a_silent_no_op() {
        let store = seeded_store(vec![interval(9, 10)]).await;
        let handler = RemoveIntervalHandler::new(Arc::new(store.availability()));

        let day = handler
            .handle(RemoveIntervalCommand {
                counsellor: counsellor(),
                weekday: Weekday::Monday,
                interval: interval(14, 15),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(day.intervals(), &[interval(9, 10)]);
    }

    #[tokio::test]
    async fn missing_day_is_not_found() {
        let store = MemoryStore::new();
        let handler = RemoveIntervalHandler::new(Arc::new(store.availability()));

        let err = handler
            .handle(RemoveIntervalCommand {
                counsellor: counsellor(),
                weekday: Weekday::Friday,
                interval: interval(9, 10),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AvailabilityNotFound);
    }
}
