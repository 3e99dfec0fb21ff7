//! RescheduleSessionHandler - move a session to a new slot.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::NotificationCoordinator;
use crate::domain::foundation::{Actor, DomainError, ErrorCode, Interval, SessionId};
use crate::domain::session::Session;
use crate::ports::{CaseRepository, SessionRepository};

/// Command to reschedule a session.
///
/// The reschedule policy depends on the actor: students may only move a
/// pending session (and the move awaits approval); counsellor moves are
/// self-approving.
#[derive(Debug, Clone)]
pub struct RescheduleSessionCommand {
    pub actor: Actor,
    pub session_id: SessionId,
    pub new_date: NaiveDate,
    pub new_interval: Interval,
    pub remark: String,
}

/// Result of a successful reschedule.
#[derive(Debug, Clone)]
pub struct RescheduleSessionResult {
    pub session: Session,
}

/// Handler for rescheduling sessions.
pub struct RescheduleSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    cases: Arc<dyn CaseRepository>,
    coordinator: Arc<NotificationCoordinator>,
}

impl RescheduleSessionHandler {
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
        cmd: RescheduleSessionCommand,
    ) -> Result<RescheduleSessionResult, DomainError> {
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

        let old_date = session.date();
        let old_interval = *session.interval();
        let expected = session.status();

        session.reschedule(cmd.actor, cmd.new_date, cmd.new_interval, cmd.remark)?;

        // A counsellor reschedule lands the session back in an active
        // status, so the new slot must honour the overlap invariant.
        if session.status().is_active() {
            let active = self
                .sessions
                .find_active_by_counsellor_on_date(session.counsellor(), cmd.new_date)
                .await?;
            let conflict = active
                .iter()
                .any(|s| s.id() != session.id() && s.interval().overlaps(&cmd.new_interval));
            if conflict {
                return Err(DomainError::new(
                    ErrorCode::SlotUnavailable,
                    format!(
                        "Counsellor already has a session overlapping {} on {}",
                        cmd.new_interval, cmd.new_date
                    ),
                ));
            }
        }

        self.sessions.update_guarded(&session, expected).await?;

        let case_id = *session.case_id().ok_or_else(|| {
            DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Session {} has no case", session.id()),
            )
        })?;
        let case = self.cases.find_by_id(&case_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", case_id),
            )
        })?;

        self.coordinator
            .session_rescheduled(&case, &session, old_date, old_interval, cmd.actor)
            .await;

        Ok(RescheduleSessionResult { session })
    }
}
