//! RequestSessionHandler - a student requests a new session.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::NotificationCoordinator;
use crate::domain::case::Case;
use crate::domain::foundation::{
    CaseCode, CaseId, DomainError, ErrorCode, Interval, SessionId, SessionStatus, UserId,
};
use crate::domain::session::Session;
use crate::ports::{CaseRepository, SessionRepository};

/// Command to request a new session with a counsellor.
#[derive(Debug, Clone)]
pub struct RequestSessionCommand {
    pub student: UserId,
    pub counsellor: UserId,
    pub date: NaiveDate,
    pub interval: Interval,
    pub kind: String,
    pub description: Option<String>,
}

/// Result of a successful request: the pending session and its fresh case.
#[derive(Debug, Clone)]
pub struct RequestSessionResult {
    pub session: Session,
    pub case: Case,
}

/// Handler for requesting sessions.
pub struct RequestSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    cases: Arc<dyn CaseRepository>,
    coordinator: Arc<NotificationCoordinator>,
}

impl RequestSessionHandler {
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
        cmd: RequestSessionCommand,
    ) -> Result<RequestSessionResult, DomainError> {
        // 1. Double-submit guard: an identical pending request from the
        //    same student is rejected.
        let existing = self.sessions.find_by_student(&cmd.student).await?;
        let duplicate = existing.iter().any(|s| {
            s.status() == SessionStatus::Pending
                && s.counsellor() == &cmd.counsellor
                && s.date() == cmd.date
                && s.interval() == &cmd.interval
        });
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateRequest,
                "An identical session request is already pending",
            ));
        }

        // 2. The counsellor's active sessions must not overlap the slot.
        let active = self
            .sessions
            .find_active_by_counsellor_on_date(&cmd.counsellor, cmd.date)
            .await?;
        if active.iter().any(|s| s.interval().overlaps(&cmd.interval)) {
            return Err(DomainError::new(
                ErrorCode::SlotUnavailable,
                format!(
                    "Counsellor already has a session overlapping {} on {}",
                    cmd.interval, cmd.date
                ),
            ));
        }

        // 3. Build the pending session and its case.
        let mut session = Session::request(
            SessionId::new(),
            cmd.student.clone(),
            cmd.counsellor.clone(),
            cmd.date,
            cmd.interval,
            cmd.kind,
            cmd.description,
        )?;
        let number = self.cases.next_sequence_number().await?;
        let mut case = Case::new(CaseId::new(), cmd.student, CaseCode::new(number));
        let code = case.append_session(*session.id())?;
        session.attach_to_case(*case.id(), code)?;

        // 4. Persist: session first, then the case (the original's order).
        self.sessions.save(&session).await?;
        if let Err(err) = self.cases.save(&case).await {
            tracing::error!(
                session = %session.id(),
                case = %case.id(),
                error = %err,
                "partial request-session write"
            );
            return Err(err.with_step("session saved, but case creation failed"));
        }

        // 5. Fan out; dispatch failures never fail the workflow.
        self.coordinator.session_requested(&case, &session).await;

        Ok(RequestSessionResult { session, case })
    }
}
