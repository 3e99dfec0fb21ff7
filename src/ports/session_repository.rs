//! Session repository port.
//!
//! Defines the contract for persisting and retrieving Session
//! aggregates. Implementations handle the actual database operations.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::foundation::{CaseId, DomainError, SessionId, SessionStatus, UserId};
use crate::domain::session::Session;

/// Repository port for Session aggregate persistence.
///
/// `update_guarded` is the system's only concurrency control: of two
/// racing writers, exactly one observes the expected status and wins.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Update an existing session unconditionally.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &Session) -> Result<(), DomainError>;

    /// Update an existing session only if its stored status still equals
    /// `expected`.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `InvalidStateTransition` (carrying the stored status) if another
    ///   writer got there first
    /// - `DatabaseError` on persistence failure
    async fn update_guarded(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<(), DomainError>;

    /// Find a session by its ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Find all sessions requested by a student, newest first.
    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Session>, DomainError>;

    /// Find all sessions assigned to a counsellor, newest first.
    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Session>, DomainError>;

    /// Find all sessions belonging to a case, oldest first.
    async fn find_by_case(&self, case_id: &CaseId) -> Result<Vec<Session>, DomainError>;

    /// Find the active (pending/progress) sessions of a counsellor on a
    /// calendar date, for slot-conflict checks and availability
    /// subtraction.
    async fn find_active_by_counsellor_on_date(
        &self,
        counsellor: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Session>, DomainError>;

    /// Delete a session (administrative only; sessions are otherwise
    /// never removed).
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if the session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &SessionId) -> Result<(), DomainError>;
}
