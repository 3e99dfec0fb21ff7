//! PostgreSQL adapters.
//!
//! One `PgPool` backs every repository; the pool is created by the
//! embedding service from [`crate::config::DatabaseConfig`] and injected
//! here. `ensure_schema` bootstraps the tables and the case-code
//! sequence on startup.

mod availability_repository;
mod case_repository;
mod notification_repository;
mod session_repository;

pub use availability_repository::PostgresAvailabilityRepository;
pub use case_repository::PostgresCaseRepository;
pub use notification_repository::PostgresNotificationRepository;
pub use session_repository::PostgresSessionRepository;

use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Creates the tables and sequences this crate relies on.
///
/// Idempotent; intended for startup of development and test
/// deployments. Production schema management may run these same
/// statements through its own migration tooling.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY,
            code TEXT,
            student TEXT NOT NULL,
            counsellor TEXT NOT NULL,
            case_id UUID,
            session_date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            kind TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL,
            platform TEXT,
            meeting_link TEXT,
            reschedule_remark JSONB,
            cancel_remark JSONB,
            interaction_notes TEXT,
            case_summary TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS cases (
            id UUID PRIMARY KEY,
            code TEXT NOT NULL,
            student TEXT NOT NULL,
            session_ids UUID[] NOT NULL DEFAULT '{}',
            status TEXT NOT NULL,
            concern_raised DATE,
            referrals JSONB NOT NULL DEFAULT '[]',
            referral_remarks JSONB NOT NULL DEFAULT '[]',
            reason_for_closing TEXT,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id UUID PRIMARY KEY,
            recipient TEXT NOT NULL,
            case_id UUID NOT NULL,
            session_id UUID NOT NULL,
            details TEXT NOT NULL,
            is_read BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS availability (
            counsellor TEXT NOT NULL,
            weekday TEXT NOT NULL,
            intervals JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (counsellor, weekday)
        )
        "#,
        "CREATE SEQUENCE IF NOT EXISTS case_code_seq",
        "CREATE INDEX IF NOT EXISTS idx_sessions_counsellor_date ON sessions (counsellor, session_date)",
        "CREATE INDEX IF NOT EXISTS idx_sessions_student ON sessions (student)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications (recipient, is_read)",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| db_error("create schema", e))?;
    }

    Ok(())
}

/// Maps an infrastructure failure to the domain error taxonomy.
pub(crate) fn db_error(action: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {}: {}", action, err),
    )
}
