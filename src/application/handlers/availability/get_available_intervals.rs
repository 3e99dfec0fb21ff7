//! GetAvailableIntervalsHandler - what a student can still book.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::foundation::{DomainError, ErrorCode, Interval, UserId, Weekday};
use crate::ports::{AvailabilityRepository, SessionRepository};

/// Query for the bookable intervals of a counsellor on a given date.
#[derive(Debug, Clone)]
pub struct GetAvailableIntervalsQuery {
    pub counsellor: UserId,
    pub weekday: Weekday,
    pub date: NaiveDate,
}

/// Handler returning stored intervals minus those already claimed by an
/// active session on the date. Claim matching is by start-time equality.
pub struct GetAvailableIntervalsHandler {
    availability: Arc<dyn AvailabilityRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl GetAvailableIntervalsHandler {
    pub fn new(
        availability: Arc<dyn AvailabilityRepository>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            availability,
            sessions,
        }
    }

    pub async fn handle(
        &self,
        query: GetAvailableIntervalsQuery,
    ) -> Result<Vec<Interval>, DomainError> {
        let day = self
            .availability
            .find_day(&query.counsellor, query.weekday)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AvailabilityNotFound,
                    format!(
                        "No availability for {} on {}",
                        query.counsellor, query.weekday
                    ),
                )
            })?;

        let active = self
            .sessions
            .find_active_by_counsellor_on_date(&query.counsellor, query.date)
            .await?;
        let claimed_starts: Vec<_> = active.iter().map(|s| s.interval().start()).collect();

        Ok(day.open_intervals(&claimed_starts))
    }
}
