//! PostgreSQL implementation of CaseRepository.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

use super::db_error;
use crate::domain::case::{Case, ReferralEntry, ReferralRemark};
use crate::domain::foundation::{
    CaseCode, CaseId, CaseStatus, DomainError, ErrorCode, SessionId, Timestamp, UserId,
};
use crate::ports::CaseRepository;

/// PostgreSQL implementation of CaseRepository.
#[derive(Clone)]
pub struct PostgresCaseRepository {
    pool: PgPool,
}

impl PostgresCaseRepository {
    /// Creates a new PostgresCaseRepository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseRepository for PostgresCaseRepository {
    async fn save(&self, case: &Case) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cases (
                id, code, student, session_ids, status, concern_raised,
                referrals, referral_remarks, reason_for_closing, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(case.id().as_uuid())
        .bind(case.code().as_str())
        .bind(case.student().as_str())
        .bind(session_uuids(case))
        .bind(case.status().as_str())
        .bind(case.concern_raised())
        .bind(to_json("referrals", case.referrals())?)
        .bind(to_json("referral remarks", case.referral_remarks())?)
        .bind(case.reason_for_closing())
        .bind(case.created_at().as_datetime())
        .bind(case.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert case", e))?;

        Ok(())
    }

    async fn update(&self, case: &Case) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE cases SET
                session_ids = $2, status = $3, concern_raised = $4,
                referrals = $5, referral_remarks = $6, reason_for_closing = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(case.id().as_uuid())
        .bind(session_uuids(case))
        .bind(case.status().as_str())
        .bind(case.concern_raised())
        .bind(to_json("referrals", case.referrals())?)
        .bind(to_json("referral remarks", case.referral_remarks())?)
        .bind(case.reason_for_closing())
        .bind(case.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update case", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", case.id()),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, DomainError> {
        let row = sqlx::query("SELECT * FROM cases WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch case", e))?;

        row.map(row_to_case).transpose()
    }

    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Case>, DomainError> {
        let rows = sqlx::query("SELECT * FROM cases WHERE student = $1 ORDER BY created_at DESC")
            .bind(student.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("fetch cases by student", e))?;

        rows.into_iter().map(row_to_case).collect()
    }

    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Case>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT c.*
            FROM cases c
            JOIN sessions s ON s.id = ANY(c.session_ids)
            WHERE s.counsellor = $1
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(counsellor.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch cases by counsellor", e))?;

        rows.into_iter().map(row_to_case).collect()
    }

    async fn count_for_student(&self, student: &UserId) -> Result<u32, DomainError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cases WHERE student = $1")
            .bind(student.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count cases by student", e))?;

        Ok(result.0 as u32)
    }

    async fn count_for_counsellor(&self, counsellor: &UserId) -> Result<u32, DomainError> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT c.id)
            FROM cases c
            JOIN sessions s ON s.id = ANY(c.session_ids)
            WHERE s.counsellor = $1
            "#,
        )
        .bind(counsellor.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("count cases by counsellor", e))?;

        Ok(result.0 as u32)
    }

    async fn next_sequence_number(&self) -> Result<u32, DomainError> {
        let result: (i64,) = sqlx::query_as("SELECT nextval('case_code_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("advance case sequence", e))?;

        Ok(result.0 as u32)
    }

    async fn delete(&self, id: &CaseId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("delete case", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", id),
            ));
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn session_uuids(case: &Case) -> Vec<uuid::Uuid> {
    case.session_ids().iter().map(|id| *id.as_uuid()).collect()
}

fn to_json<T: serde::Serialize>(what: &str, value: T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| db_error(&format!("encode {}", what), e))
}

fn row_to_case(row: sqlx::postgres::PgRow) -> Result<Case, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(|e| db_error("get id", e))?;
    let code: String = row.try_get("code").map_err(|e| db_error("get code", e))?;
    let student: String = row
        .try_get("student")
        .map_err(|e| db_error("get student", e))?;
    let session_uuids: Vec<uuid::Uuid> = row
        .try_get("session_ids")
        .map_err(|e| db_error("get session_ids", e))?;
    let status: String = row
        .try_get("status")
        .map_err(|e| db_error("get status", e))?;
    let concern_raised: Option<NaiveDate> = row
        .try_get("concern_raised")
        .map_err(|e| db_error("get concern_raised", e))?;
    let referrals: serde_json::Value = row
        .try_get("referrals")
        .map_err(|e| db_error("get referrals", e))?;
    let referral_remarks: serde_json::Value = row
        .try_get("referral_remarks")
        .map_err(|e| db_error("get referral_remarks", e))?;
    let reason_for_closing: Option<String> = row
        .try_get("reason_for_closing")
        .map_err(|e| db_error("get reason_for_closing", e))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(|e| db_error("get created_at", e))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(|e| db_error("get updated_at", e))?;

    let referrals: Vec<ReferralEntry> =
        serde_json::from_value(referrals).map_err(|e| db_error("decode referrals", e))?;
    let referral_remarks: Vec<ReferralRemark> = serde_json::from_value(referral_remarks)
        .map_err(|e| db_error("decode referral remarks", e))?;
    let status = status
        .parse::<CaseStatus>()
        .map_err(|e| db_error("decode case status", e))?;

    Ok(Case::reconstitute(
        CaseId::from_uuid(id),
        CaseCode::from_raw(code),
        UserId::new(student).map_err(|e| db_error("decode student", e))?,
        session_uuids.into_iter().map(SessionId::from_uuid).collect(),
        status,
        concern_raised,
        referrals,
        referral_remarks,
        reason_for_closing,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
