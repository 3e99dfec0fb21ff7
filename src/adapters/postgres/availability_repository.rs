//! PostgreSQL implementation of AvailabilityRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::db_error;
use crate::domain::availability::DayAvailability;
use crate::domain::foundation::{DomainError, Interval, Timestamp, UserId, Weekday};
use crate::ports::AvailabilityRepository;

/// PostgreSQL implementation of AvailabilityRepository.
///
/// One row per (counsellor, weekday); the interval list is stored as a
/// jsonb document and replaced wholesale on every edit.
#[derive(Clone)]
pub struct PostgresAvailabilityRepository {
    pool: PgPool,
}

impl PostgresAvailabilityRepository {
    /// Creates a new PostgresAvailabilityRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for PostgresAvailabilityRepository {
    async fn upsert_day(&self, day: &DayAvailability) -> Result<(), DomainError> {
        let intervals = serde_json::to_value(day.intervals())
            .map_err(|e| db_error("encode intervals", e))?;

        sqlx::query(
            r#"
            INSERT INTO availability (counsellor, weekday, intervals, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (counsellor, weekday)
            DO UPDATE SET intervals = EXCLUDED.intervals, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(day.counsellor().as_str())
        .bind(day.weekday().as_str())
        .bind(intervals)
        .bind(day.created_at().as_datetime())
        .bind(day.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("upsert availability", e))?;

        Ok(())
    }

    async fn find_day(
        &self,
        counsellor: &UserId,
        weekday: Weekday,
    ) -> Result<Option<DayAvailability>, DomainError> {
        let row =
            sqlx::query("SELECT * FROM availability WHERE counsellor = $1 AND weekday = $2")
                .bind(counsellor.as_str())
                .bind(weekday.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch availability", e))?;

        row.map(row_to_day).transpose()
    }

    async fn find_by_counsellor(
        &self,
        counsellor: &UserId,
    ) -> Result<Vec<DayAvailability>, DomainError> {
        let rows = sqlx::query("SELECT * FROM availability WHERE counsellor = $1")
            .bind(counsellor.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("fetch availability by counsellor", e))?;

        let mut days: Vec<DayAvailability> = rows
            .into_iter()
            .map(row_to_day)
            .collect::<Result<_, _>>()?;
        days.sort_by_key(|d| Weekday::all().iter().position(|w| *w == d.weekday()));
        Ok(days)
    }

    async fn delete_day(&self, counsellor: &UserId, weekday: Weekday) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM availability WHERE counsellor = $1 AND weekday = $2")
            .bind(counsellor.as_str())
            .bind(weekday.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete availability", e))?;

        Ok(())
    }
}

fn row_to_day(row: sqlx::postgres::PgRow) -> Result<DayAvailability, DomainError> {
    let counsellor: String = row
        .try_get("counsellor")
        .map_err(|e| db_error("get counsellor", e))?;
    let weekday: String = row
        .try_get("weekday")
        .map_err(|e| db_error("get weekday", e))?;
    let intervals: serde_json::Value = row
        .try_get("intervals")
        .map_err(|e| db_error("get intervals", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| db_error("get created_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| db_error("get updated_at", e))?;

    let intervals: Vec<Interval> =
        serde_json::from_value(intervals).map_err(|e| db_error("decode intervals", e))?;
    let weekday = weekday
        .parse::<Weekday>()
        .map_err(|e| db_error("decode weekday", e))?;

    Ok(DayAvailability::reconstitute(
        UserId::new(counsellor).map_err(|e| db_error("decode counsellor", e))?,
        weekday,
        intervals,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
