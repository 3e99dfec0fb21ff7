//! PostgreSQL implementation of SessionRepository.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, Row};

use super::db_error;
use crate::domain::foundation::{
    CaseId, DomainError, ErrorCode, Interval, SessionCode, SessionId, SessionStatus, Timestamp,
    UserId,
};
use crate::domain::session::{Remark, Session};
use crate::ports::SessionRepository;

/// PostgreSQL implementation of SessionRepository.
///
/// `update_guarded` compiles to a conditional `UPDATE ... WHERE id = $1
/// AND status = $2`; the row-level atomicity of that statement is the
/// whole concurrency story.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new PostgresSessionRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write(&self, session: &Session, guard: Option<SessionStatus>) -> Result<u64, DomainError> {
        let query = match guard {
            None => {
                r#"
                UPDATE sessions SET
                    code = $2, case_id = $3, session_date = $4, start_time = $5,
                    end_time = $6, kind = $7, description = $8, status = $9,
                    platform = $10, meeting_link = $11, reschedule_remark = $12,
                    cancel_remark = $13, interaction_notes = $14, case_summary = $15,
                    updated_at = $16
                WHERE id = $1
                "#
            }
            Some(_) => {
                r#"
                UPDATE sessions SET
                    code = $2, case_id = $3, session_date = $4, start_time = $5,
                    end_time = $6, kind = $7, description = $8, status = $9,
                    platform = $10, meeting_link = $11, reschedule_remark = $12,
                    cancel_remark = $13, interaction_notes = $14, case_summary = $15,
                    updated_at = $16
                WHERE id = $1 AND status = $17
                "#
            }
        };

        let mut q = sqlx::query(query)
            .bind(session.id().as_uuid())
            .bind(session.code().map(|c| c.as_str()))
            .bind(session.case_id().map(|c| *c.as_uuid()))
            .bind(session.date())
            .bind(session.interval().start())
            .bind(session.interval().end())
            .bind(session.kind())
            .bind(session.description())
            .bind(session.status().as_str())
            .bind(session.platform())
            .bind(session.meeting_link())
            .bind(remark_to_json(session.reschedule_remark())?)
            .bind(remark_to_json(session.cancel_remark())?)
            .bind(session.interaction_notes())
            .bind(session.case_summary())
            .bind(session.updated_at().as_datetime());
        if let Some(expected) = guard {
            q = q.bind(expected.as_str());
        }

        let result = q
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update session", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, code, student, counsellor, case_id, session_date, start_time,
                end_time, kind, description, status, platform, meeting_link,
                reschedule_remark, cancel_remark, interaction_notes, case_summary,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19
            )
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.code().map(|c| c.as_str()))
        .bind(session.student().as_str())
        .bind(session.counsellor().as_str())
        .bind(session.case_id().map(|c| *c.as_uuid()))
        .bind(session.date())
        .bind(session.interval().start())
        .bind(session.interval().end())
        .bind(session.kind())
        .bind(session.description())
        .bind(session.status().as_str())
        .bind(session.platform())
        .bind(session.meeting_link())
        .bind(remark_to_json(session.reschedule_remark())?)
        .bind(remark_to_json(session.cancel_remark())?)
        .bind(session.interaction_notes())
        .bind(session.case_summary())
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert session", e))?;

        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        if self.write(session, None).await? == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }
        Ok(())
    }

    async fn update_guarded(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<(), DomainError> {
        if self.write(session, Some(expected)).await? > 0 {
            return Ok(());
        }

        // Zero rows: the session is gone, or another writer moved it.
        let stored: Option<(String,)> =
            sqlx::query_as("SELECT status FROM sessions WHERE id = $1")
                .bind(session.id().as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("fetch session status", e))?;

        match stored {
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )),
            Some((status,)) => {
                let status = parse_status(&status)?;
                Err(DomainError::invalid_transition(
                    status,
                    format!("Session {} is no longer {}", session.id(), expected),
                ))
            }
        }
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch session", e))?;

        row.map(row_to_session).transpose()
    }

    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Session>, DomainError> {
        let rows =
            sqlx::query("SELECT * FROM sessions WHERE student = $1 ORDER BY created_at DESC")
                .bind(student.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("fetch sessions by student", e))?;

        rows.into_iter().map(row_to_session).collect()
    }

    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Session>, DomainError> {
        let rows =
            sqlx::query("SELECT * FROM sessions WHERE counsellor = $1 ORDER BY created_at DESC")
                .bind(counsellor.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("fetch sessions by counsellor", e))?;

        rows.into_iter().map(row_to_session).collect()
    }

    async fn find_by_case(&self, case_id: &CaseId) -> Result<Vec<Session>, DomainError> {
        let rows = sqlx::query("SELECT * FROM sessions WHERE case_id = $1 ORDER BY created_at")
            .bind(case_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("fetch sessions by case", e))?;

        rows.into_iter().map(row_to_session).collect()
    }

    async fn find_active_by_counsellor_on_date(
        &self,
        counsellor: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Session>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sessions
            WHERE counsellor = $1 AND session_date = $2
              AND status IN ('pending', 'progress')
            "#,
        )
        .bind(counsellor.as_str())
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch active sessions", e))?;

        rows.into_iter().map(row_to_session).collect()
    }

    async fn delete(&self, id: &SessionId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete session", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", id),
            ));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn parse_status(s: &str) -> Result<SessionStatus, DomainError> {
    s.parse::<SessionStatus>()
        .map_err(|e| db_error("decode session status", e))
}

fn remark_to_json(remark: Option<&Remark>) -> Result<Option<serde_json::Value>, DomainError> {
    remark
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| db_error("encode remark", e))
}

fn json_to_remark(value: Option<serde_json::Value>) -> Result<Option<Remark>, DomainError> {
    value
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| db_error("decode remark", e))
}

fn row_to_session(row: sqlx::postgres::PgRow) -> Result<Session, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(|e| db_error("get id", e))?;
    let code: Option<String> = row.try_get("code").map_err(|e| db_error("get code", e))?;
    let student: String = row
        .try_get("student")
        .map_err(|e| db_error("get student", e))?;
    let counsellor: String = row
        .try_get("counsellor")
        .map_err(|e| db_error("get counsellor", e))?;
    let case_id: Option<uuid::Uuid> = row
        .try_get("case_id")
        .map_err(|e| db_error("get case_id", e))?;
    let date: NaiveDate = row
        .try_get("session_date")
        .map_err(|e| db_error("get session_date", e))?;
    let start_time: NaiveTime = row
        .try_get("start_time")
        .map_err(|e| db_error("get start_time", e))?;
    let end_time: NaiveTime = row
        .try_get("end_time")
        .map_err(|e| db_error("get end_time", e))?;
    let kind: String = row.try_get("kind").map_err(|e| db_error("get kind", e))?;
    let description: Option<String> = row
        .try_get("description")
        .map_err(|e| db_error("get description", e))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| db_error("get status", e))?;
    let platform: Option<String> = row
        .try_get("platform")
        .map_err(|e| db_error("get platform", e))?;
    let meeting_link: Option<String> = row
        .try_get("meeting_link")
        .map_err(|e| db_error("get meeting_link", e))?;
    let reschedule_remark: Option<serde_json::Value> = row
        .try_get("reschedule_remark")
        .map_err(|e| db_error("get reschedule_remark", e))?;
    let cancel_remark: Option<serde_json::Value> = row
        .try_get("cancel_remark")
        .map_err(|e| db_error("get cancel_remark", e))?;
    let interaction_notes: Option<String> = row
        .try_get("interaction_notes")
        .map_err(|e| db_error("get interaction_notes", e))?;
    let case_summary: Option<String> = row
        .try_get("case_summary")
        .map_err(|e| db_error("get case_summary", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| db_error("get created_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| db_error("get updated_at", e))?;

    let interval =
        Interval::new(start_time, end_time).map_err(|e| db_error("decode interval", e))?;

    Ok(Session::reconstitute(
        SessionId::from_uuid(id),
        code.map(SessionCode::from_raw),
        UserId::new(student).map_err(|e| db_error("decode student", e))?,
        UserId::new(counsellor).map_err(|e| db_error("decode counsellor", e))?,
        case_id.map(CaseId::from_uuid),
        date,
        interval,
        kind,
        description,
        parse_status(&status)?,
        platform,
        meeting_link,
        json_to_remark(reschedule_remark)?,
        json_to_remark(cancel_remark)?,
        interaction_notes,
        case_summary,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
