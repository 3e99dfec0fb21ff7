//! CancelSessionHandler - either party cancels a session.

use std::sync::Arc;

use crate::application::NotificationCoordinator;
use crate::domain::case::Case;
use crate::domain::foundation::{Actor, DomainError, ErrorCode, SessionId};
use crate::domain::session::Session;
use crate::ports::{CaseRepository, SessionRepository};

/// Command to cancel a session.
#[derive(Debug, Clone)]
pub struct CancelSessionCommand {
    pub actor: Actor,
    pub session_id: SessionId,
    pub remark: String,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelSessionResult {
    pub session: Session,
    pub case: Case,
}

/// Handler for cancelling sessions.
pub struct CancelSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    cases: Arc<dyn CaseRepository>,
    coordinator: Arc<NotificationCoordinator>,
}

impl CancelSessionHandler {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        cases: Arc<dyn CaseRepository>,
        coordinator: Arc<NotificationCoordinator>,
    ) -> Self {
        Self {
            sessions,
            cases,
            coordinator,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelSessionCommand,
    ) -> Result<CancelSessionResult, DomainError> {
        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SessionNotFound,
                    format!("Session not found: {}", cmd.session_id),
                )
            })?;

        let expected = session.status();
        session.cancel(cmd.actor, cmd.remark)?;
        self.sessions.update_guarded(&session, expected).await?;

        let case_id = *session.case_id().ok_or_else(|| {
            DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Session {} has no case", session.id()),
            )
        })?;
        let mut case = self.cases.find_by_id(&case_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", case_id),
            )
        })?;

        const STEP: &str = "session cancelled, but case update failed";
        case.cancel().map_err(|err| {
            tracing::error!(session = %session.id(), case = %case_id, error = %err, "partial cancel-session write");
            err.with_step(STEP)
        })?;
        self.cases.update(&case).await.map_err(|err| {
            tracing::error!(session = %session.id(), case = %case_id, error = %err, "partial cancel-session write");
            err.with_step(STEP)
        })?;

        self.coordinator
            .session_cancelled(&case, &session, cmd.actor)
            .await;

        Ok(CancelSessionResult { session, case })
    }
}
