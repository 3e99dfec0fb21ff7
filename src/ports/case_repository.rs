//! Case repository port.

use async_trait::async_trait;

use crate::domain::case::Case;
use crate::domain::foundation::{CaseId, DomainError, UserId};

/// Repository port for Case aggregate persistence.
///
/// Also owns the sequence the human-readable `CS_###` codes are
/// allocated from.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Save a new case.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, case: &Case) -> Result<(), DomainError>;

    /// Update an existing case.
    ///
    /// # Errors
    ///
    /// - `CaseNotFound` if the case doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, case: &Case) -> Result<(), DomainError>;

    /// Find a case by its ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, DomainError>;

    /// Find all cases owned by a student, newest first.
    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Case>, DomainError>;

    /// Find all cases reachable from a counsellor through their
    /// sessions, newest first.
    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Case>, DomainError>;

    /// Count cases owned by a student.
    ///
    /// A case with zero sessions still belongs to its creating student.
    async fn count_for_student(&self, student: &UserId) -> Result<u32, DomainError>;

    /// Count cases reachable from a counsellor through their sessions.
    async fn count_for_counsellor(&self, counsellor: &UserId) -> Result<u32, DomainError>;

    /// Allocate the next number in the case-code sequence.
    async fn next_sequence_number(&self) -> Result<u32, DomainError>;

    /// Delete a case (administrative only).
    ///
    /// # Errors
    ///
    /// - `CaseNotFound` if the case doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn delete(&self, id: &CaseId) -> Result<(), DomainError>;
}
