//! AcceptSessionHandler - a counsellor approves a pending session.

use std::sync::Arc;

use crate::application::NotificationCoordinator;
use crate::domain::case::Case;
use crate::domain::foundation::{DomainError, ErrorCode, SessionId, SessionStatus, UserId};
use crate::domain::session::Session;
use crate::ports::{CaseRepository, SessionRepository};

/// Command to accept a pending session.
#[derive(Debug, Clone)]
pub struct AcceptSessionCommand {
    pub counsellor: UserId,
    pub session_id: SessionId,
    pub platform: Option<String>,
    pub meeting_link: Option<String>,
}

/// Result of a successful acceptance.
#[derive(Debug, Clone)]
pub struct AcceptSessionResult {
    pub session: Session,
    pub case: Case,
}

/// Handler for accepting sessions.
///
/// Two concurrent accepts of the same session resolve through the
/// store's guarded update: exactly one caller wins, the other receives
/// `InvalidStateTransition` with the session's actual status.
pub struct AcceptSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    cases: Arc<dyn CaseRepository>,
    coordinator: Arc<NotificationCoordinator>,
}

impl AcceptSessionHandler {
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
        cmd: AcceptSessionCommand,
    ) -> Result<AcceptSessionResult, DomainError> {
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

        if session.counsellor() != &cmd.counsellor {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only the assigned counsellor can accept this session",
            ));
        }

        session.accept(cmd.platform, cmd.meeting_link)?;
        self.sessions
            .update_guarded(&session, SessionStatus::Pending)
            .await?;

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

        const STEP: &str = "session accepted, but case update failed";
        case.accept().map_err(|err| {
            tracing::error!(session = %session.id(), case = %case_id, error = %err, "partial accept-session write");
            err.with_step(STEP)
        })?;
        self.cases.update(&case).await.map_err(|err| {
            tracing::error!(session = %session.id(), case = %case_id, error = %err, "partial accept-session write");
            err.with_step(STEP)
        })?;

        self.coordinator.session_accepted(&case, &session).await;

        Ok(AcceptSessionResult { session, case })
    }
}
