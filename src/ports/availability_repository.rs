//! Availability repository port.

use async_trait::async_trait;

use crate::domain::availability::DayAvailability;
use crate::domain::foundation::{DomainError, UserId, Weekday};

/// Repository port for per-weekday availability entries.
///
/// One entry per (counsellor, weekday); writes replace the entry as a
/// whole.
#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    /// Insert or fully replace the entry for (counsellor, weekday).
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn upsert_day(&self, day: &DayAvailability) -> Result<(), DomainError>;

    /// Find the entry for (counsellor, weekday). Returns `None` if the
    /// counsellor declared nothing for that day.
    async fn find_day(
        &self,
        counsellor: &UserId,
        weekday: Weekday,
    ) -> Result<Option<DayAvailability>, DomainError>;

    /// Find all day entries of a counsellor, in calendar order.
    async fn find_by_counsellor(
        &self,
        counsellor: &UserId,
    ) -> Result<Vec<DayAvailability>, DomainError>;

    /// Delete the entry for (counsellor, weekday). Deleting an absent
    /// entry is a no-op.
    async fn delete_day(&self, counsellor: &UserId, weekday: Weekday) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn AvailabilityRepository) {}
    }
}
