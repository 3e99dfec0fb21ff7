//! AddEntryHandler - a counsellor records the outcome of a session.
//!
//! Every add-entry call closes the referenced session first, then
//! branches: close the case, refer it (with or without handing over a
//! new session), or open a follow-up session under the same counsellor.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::application::NotificationCoordinator;
use crate::domain::case::{Case, ReferralRemark};
use crate::domain::foundation::{
    CaseCode, CaseId, DomainError, ErrorCode, Interval, SessionId, SessionStatus, UserId,
};
use crate::domain::session::Session;
use crate::ports::{CaseRepository, SessionRepository};

/// Payload of an add-entry call.
///
/// Branch selection: `close` wins over `refer`; `refer` with
/// `with_session` hands the whole case over, without it only feedback
/// is requested; when neither flag is set a follow-up session is
/// created from `date`/`interval`.
#[derive(Debug, Clone, Default)]
pub struct EntryPayload {
    /// The session being written up; always closed first.
    pub session_id: SessionId,
    /// Interaction notes for the closed session (and description of a
    /// follow-up session, when one is created).
    pub details: Option<String>,
    /// Case-summary text recorded on the closed session.
    pub case_summary: Option<String>,
    /// Close the whole case.
    pub close: bool,
    /// Counsellor to refer to (ownership transfer or peer feedback).
    pub refer: Option<UserId>,
    /// With `refer`: also hand over a fresh session and case.
    pub with_session: bool,
    /// Slot for the follow-up session (default branch only).
    pub date: Option<NaiveDate>,
    pub interval: Option<Interval>,
    /// Remark recorded against a referral.
    pub remarks: Option<String>,
    /// Date the concern was raised (close and refer branches).
    pub concern_raised: Option<NaiveDate>,
    /// Reason recorded when closing the case.
    pub reason_for_closing: Option<String>,
}

impl EntryPayload {
    fn session_id(session_id: SessionId) -> Self {
        Self {
            session_id,
            ..Self::default()
        }
    }

    /// Payload closing the whole case.
    pub fn close(session_id: SessionId, concern_raised: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            close: true,
            concern_raised: Some(concern_raised),
            reason_for_closing: Some(reason.into()),
            ..Self::session_id(session_id)
        }
    }

    /// Payload referring the case to a new owner.
    pub fn refer_with_session(
        session_id: SessionId,
        refer: UserId,
        concern_raised: NaiveDate,
    ) -> Self {
        Self {
            refer: Some(refer),
            with_session: true,
            concern_raised: Some(concern_raised),
            ..Self::session_id(session_id)
        }
    }

    /// Payload requesting peer feedback, keeping ownership.
    pub fn request_feedback(session_id: SessionId, refer: UserId) -> Self {
        Self {
            refer: Some(refer),
            ..Self::session_id(session_id)
        }
    }

    /// Payload continuing the case with a follow-up session.
    pub fn follow_up(session_id: SessionId, date: NaiveDate, interval: Interval) -> Self {
        Self {
            date: Some(date),
            interval: Some(interval),
            ..Self::session_id(session_id)
        }
    }
}

/// Command for one add-entry call.
#[derive(Debug, Clone)]
pub struct AddEntryCommand {
    pub counsellor: UserId,
    pub case_id: CaseId,
    pub payload: EntryPayload,
}

/// What an add-entry call produced, per branch.
#[derive(Debug, Clone)]
pub enum AddEntryOutcome {
    /// The case was closed; no new session exists.
    CaseClosed { case: Case, session: Session },
    /// The case was handed to a new counsellor; a fresh case and pending
    /// session were created for them.
    Referred {
        original_case: Case,
        closed_session: Session,
        new_case: Case,
        new_session: Session,
    },
    /// A peer was asked for feedback; case status and ownership are
    /// unchanged.
    FeedbackRequested { case: Case, session: Session },
    /// The case continues with a follow-up session under the same
    /// counsellor.
    FollowUpCreated {
        case: Case,
        closed_session: Session,
        new_session: Session,
    },
}

/// Handler for add-entry calls.
pub struct AddEntryHandler {
    sessions: Arc<dyn SessionRepository>,
    cases: Arc<dyn CaseRepository>,
    coordinator: Arc<NotificationCoordinator>,
}

impl AddEntryHandler {
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

    pub async fn handle(&self, cmd: AddEntryCommand) -> Result<AddEntryOutcome, DomainError> {
        let mut case = self.cases.find_by_id(&cmd.case_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", cmd.case_id),
            )
        })?;
        let mut session = self
            .sessions
            .find_by_id(&cmd.payload.session_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SessionNotFound,
                    format!("Session not found: {}", cmd.payload.session_id),
                )
            })?;

        if session.case_id() != Some(case.id()) {
            return Err(DomainError::validation(
                "session_id",
                format!(
                    "Session {} does not belong to case {}",
                    session.id(),
                    case.code()
                ),
            ));
        }
        if session.counsellor() != &cmd.counsellor {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only the assigned counsellor can write up this session",
            ));
        }

        // 1. Closing the current session is unconditional on every
        //    add-entry call, whatever branch follows.
        let expected = session.status();
        session.close(
            cmd.payload.details.clone(),
            cmd.payload.case_summary.clone(),
        )?;
        self.sessions.update_guarded(&session, expected).await?;

        // 2. Close the whole case.
        if cmd.payload.close {
            return self.close_case(case, session, &cmd.payload).await;
        }

        // 3./4. Referral branches.
        if let Some(referred_to) = cmd.payload.refer.clone() {
            if cmd.payload.with_session {
                return self
                    .refer_with_session(case, session, referred_to, &cmd.payload)
                    .await;
            }
            return self
                .request_feedback(case, session, referred_to, &cmd)
                .await;
        }

        // 5. Default: continue the case with a follow-up session.
        let date = cmd.payload.date.ok_or_else(|| {
            DomainError::validation("date", "A follow-up entry requires a date")
        })?;
        let interval = cmd.payload.interval.ok_or_else(|| {
            DomainError::validation("interval", "A follow-up entry requires an interval")
        })?;

        let mut follow_up = Session::follow_up(
            SessionId::new(),
            session.student().clone(),
            cmd.counsellor.clone(),
            date,
            interval,
            session.kind().to_string(),
            cmd.payload.details.clone(),
        )?;
        let code = case
            .append_session(*follow_up.id())
            .map_err(|err| self.partial(err, "session closed, but case update failed"))?;
        follow_up.attach_to_case(*case.id(), code)?;

        self.sessions
            .save(&follow_up)
            .await
            .map_err(|err| self.partial(err, "session closed, but follow-up save failed"))?;
        self.cases
            .update(&case)
            .await
            .map_err(|err| self.partial(err, "follow-up saved, but case update failed"))?;

        self.coordinator.follow_up_created(&case, &follow_up).await;

        Ok(AddEntryOutcome::FollowUpCreated {
            case,
            closed_session: session,
            new_session: follow_up,
        })
    }

    async fn close_case(
        &self,
        mut case: Case,
        session: Session,
        payload: &EntryPayload,
    ) -> Result<AddEntryOutcome, DomainError> {
        let concern_raised = payload.concern_raised.ok_or_else(|| {
            DomainError::validation("concern_raised", "Closing a case requires the concern date")
        })?;
        let reason = payload.reason_for_closing.clone().ok_or_else(|| {
            DomainError::validation(
                "reason_for_closing",
                "Closing a case requires a closing reason",
            )
        })?;

        case.close(concern_raised, reason)
            .map_err(|err| self.partial(err, "session closed, but case close failed"))?;
        self.cases
            .update(&case)
            .await
            .map_err(|err| self.partial(err, "session closed, but case close failed"))?;

        self.coordinator.case_closed(&case, &session).await;

        Ok(AddEntryOutcome::CaseClosed { case, session })
    }

    async fn refer_with_session(
        &self,
        mut case: Case,
        session: Session,
        referred_to: UserId,
        payload: &EntryPayload,
    ) -> Result<AddEntryOutcome, DomainError> {
        let concern_raised = payload.concern_raised.ok_or_else(|| {
            DomainError::validation("concern_raised", "Referring a case requires the concern date")
        })?;

        case.refer(referred_to.clone(), concern_raised)
            .map_err(|err| self.partial(err, "session closed, but case referral failed"))?;
        self.cases
            .update(&case)
            .await
            .map_err(|err| self.partial(err, "session closed, but case referral failed"))?;

        // A fresh pending session for the new counsellor, carrying over
        // the student, slot, type, and description of the closed one.
        let mut new_session = Session::request(
            SessionId::new(),
            session.student().clone(),
            referred_to,
            session.date(),
            *session.interval(),
            session.kind().to_string(),
            session.description().map(str::to_string),
        )?;
        let number = self
            .cases
            .next_sequence_number()
            .await
            .map_err(|err| self.partial(err, "case referred, but new case creation failed"))?;
        let mut new_case = Case::new(
            CaseId::new(),
            session.student().clone(),
            CaseCode::new(number),
        );
        let code = new_case.append_session(*new_session.id())?;
        new_session.attach_to_case(*new_case.id(), code)?;

        self.sessions
            .save(&new_session)
            .await
            .map_err(|err| self.partial(err, "case referred, but new session save failed"))?;
        self.cases
            .save(&new_case)
            .await
            .map_err(|err| self.partial(err, "new session saved, but new case save failed"))?;

        self.coordinator
            .referral_created(&new_case, &new_session, session.counsellor())
            .await;

        Ok(AddEntryOutcome::Referred {
            original_case: case,
            closed_session: session,
            new_case,
            new_session,
        })
    }

    async fn request_feedback(
        &self,
        mut case: Case,
        session: Session,
        referred_to: UserId,
        cmd: &AddEntryCommand,
    ) -> Result<AddEntryOutcome, DomainError> {
        let remark = cmd.payload.remarks.clone().map(|text| ReferralRemark {
            author: cmd.counsellor.clone(),
            text,
        });
        case.add_referer(referred_to.clone(), cmd.payload.concern_raised, remark)
            .map_err(|err| self.partial(err, "session closed, but referral update failed"))?;
        self.cases
            .update(&case)
            .await
            .map_err(|err| self.partial(err, "session closed, but referral update failed"))?;

        self.coordinator
            .feedback_requested(&case, &session, &referred_to, &cmd.counsellor)
            .await;

        Ok(AddEntryOutcome::FeedbackRequested { case, session })
    }

    fn partial(&self, err: DomainError, step: &str) -> DomainError {
        tracing::error!(error = %err, step, "partial add-entry write");
        err.with_step(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryUserDirectory, MemoryStore, RecordingMailSender};
    use crate::application::handlers::session::{
        AcceptSessionCommand, AcceptSessionHandler, RequestSessionCommand, RequestSessionHandler,
    };
    use crate::domain::foundation::{CaseStatus, StateMachine};
    use crate::ports::NotificationRepository;
    use chrono::NaiveTime;

    fn student() -> UserId {
        UserId::new("student-1").unwrap()
    }

    fn counsellor() -> UserId {
        UserId::new("counsellor-1").unwrap()
    }

    fn peer() -> UserId {
        UserId::new("counsellor-2").unwrap()
    }

    fn slot() -> Interval {
        Interval::new(
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        )
        .unwrap()
    }

    fn concern_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn coordinator(store: &MemoryStore) -> Arc<NotificationCoordinator> {
        Arc::new(NotificationCoordinator::new(
            Arc::new(store.notifications()),
            Arc::new(RecordingMailSender::new()),
            Arc::new(InMemoryUserDirectory::new()),
        ))
    }

    /// Requests and accepts a session, returning (case_id, session_id).
    async fn accepted_session(store: &MemoryStore) -> (CaseId, SessionId) {
        let request = RequestSessionHandler::new(
            Arc::new(store.sessions()),
            Arc::new(store.cases()),
            coordinator(store),
        );
        let result = request
            .handle(RequestSessionCommand {
                student: student(),
                counsellor: counsellor(),
                date: concern_date(),
                interval: slot(),
                kind: "career".to_string(),
                description: Some("Choosing a major".to_string()),
            })
            .await
            .unwrap();

        let accept = AcceptSessionHandler::new(
            Arc::new(store.sessions()),
            Arc::new(store.cases()),
            coordinator(store),
        );
        accept
            .handle(AcceptSessionCommand {
                counsellor: counsellor(),
                session_id: *result.session.id(),
                platform: None,
                meeting_link: None,
            })
            .await
            .unwrap();

        (*result.case.id(), *result.session.id())
    }

    fn handler(store: &MemoryStore) -> AddEntryHandler {
        AddEntryHandler::new(
            Arc::new(store.sessions()),
            Arc::new(store.cases()),
            coordinator(store),
        )
    }

    #[tokio::test]
    async fn close_branch_completes_session_and_case() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let mut payload = EntryPayload::close(session_id, concern_date(), "resolved");
        payload.details = Some("Discussed study plan".to_string());

        let outcome = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload,
            })
            .await
            .unwrap();

        let AddEntryOutcome::CaseClosed { case, session } = outcome else {
            panic!("expected CaseClosed");
        };
        assert_eq!(session.status(), SessionStatus::Completed);
        assert_eq!(session.interaction_notes(), Some("Discussed study plan"));
        assert_eq!(case.status(), CaseStatus::Completed);
        assert_eq!(case.reason_for_closing(), Some("resolved"));
        assert_eq!(case.concern_raised(), Some(concern_date()));
    }

    #[tokio::test]
    async fn close_branch_requires_concern_and_reason() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let payload = EntryPayload {
            close: true,
            ..EntryPayload::follow_up(session_id, concern_date(), slot())
        };
        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn refer_with_session_hands_the_case_over() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let outcome = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload: EntryPayload::refer_with_session(session_id, peer(), concern_date()),
            })
            .await
            .unwrap();

        let AddEntryOutcome::Referred {
            original_case,
            closed_session,
            new_case,
            new_session,
        } = outcome
        else {
            panic!("expected Referred");
        };

        // Original case is terminal; the new case belongs to the same
        // student and contains exactly the new session.
        assert_eq!(original_case.status(), CaseStatus::Referred);
        assert!(original_case.status().is_terminal());
        assert_eq!(closed_session.status(), SessionStatus::Completed);
        assert_eq!(new_case.student(), &student());
        assert_eq!(new_case.session_ids(), &[*new_session.id()]);
        assert_eq!(new_case.status(), CaseStatus::Pending);

        // The new session carries over the old one's particulars for the
        // referred-to counsellor.
        assert_eq!(new_session.status(), SessionStatus::Pending);
        assert_eq!(new_session.counsellor(), &peer());
        assert_eq!(new_session.kind(), "career");
        assert_eq!(new_session.description(), Some("Choosing a major"));
        assert_eq!(new_session.date(), closed_session.date());
        assert_eq!(new_session.interval(), closed_session.interval());
        assert_eq!(new_case.code().as_str(), "CS_002");

        // Both the student and the new counsellor hear about it.
        assert!(!store
            .notifications()
            .find_unread_by_recipient(&peer())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn feedback_branch_keeps_status_and_grows_referrals_by_one() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let before = store
            .cases()
            .find_by_id(&case_id)
            .await
            .unwrap()
            .unwrap();
        let status_before = before.status();
        let referrals_before = before.referrals().len();

        let mut payload = EntryPayload::request_feedback(session_id, peer());
        payload.remarks = Some("Second opinion please".to_string());

        let outcome = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload,
            })
            .await
            .unwrap();

        let AddEntryOutcome::FeedbackRequested { case, session } = outcome else {
            panic!("expected FeedbackRequested");
        };
        assert_eq!(case.status(), status_before);
        assert_eq!(case.referrals().len(), referrals_before + 1);
        assert_eq!(case.referral_remarks().len(), 1);
        assert_eq!(session.status(), SessionStatus::Completed);

        // The peer gets an in-app notification.
        let to_peer = store
            .notifications()
            .find_unread_by_recipient(&peer())
            .await
            .unwrap();
        assert_eq!(to_peer.len(), 1);
        assert!(to_peer[0].details().contains("feedback"));
    }

    #[tokio::test]
    async fn default_branch_opens_a_follow_up_in_progress() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let next_date = NaiveDate::from_ymd_opt(2024, 5, 8).unwrap();
        let mut payload = EntryPayload::follow_up(session_id, next_date, slot());
        payload.details = Some("Continue with mock interviews".to_string());

        let outcome = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload,
            })
            .await
            .unwrap();

        let AddEntryOutcome::FollowUpCreated {
            case,
            closed_session,
            new_session,
        } = outcome
        else {
            panic!("expected FollowUpCreated");
        };

        assert_eq!(closed_session.status(), SessionStatus::Completed);
        assert_eq!(new_session.status(), SessionStatus::Progress);
        assert_eq!(new_session.counsellor(), &counsellor());
        assert_eq!(new_session.kind(), "career");
        assert_eq!(new_session.date(), next_date);
        assert_eq!(case.session_ids().len(), 2);
        assert_eq!(new_session.code().unwrap().as_str(), "CS_001/SC_02");
        assert_eq!(case.session_ids()[1], *new_session.id());
    }

    #[tokio::test]
    async fn default_branch_requires_a_slot() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let payload = EntryPayload {
            session_id,
            ..EntryPayload::default()
        };
        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn closing_a_pending_session_is_rejected() {
        let store = MemoryStore::new();
        // Requested but never accepted: still pending.
        let request = RequestSessionHandler::new(
            Arc::new(store.sessions()),
            Arc::new(store.cases()),
            coordinator(&store),
        );
        let result = request
            .handle(RequestSessionCommand {
                student: student(),
                counsellor: counsellor(),
                date: concern_date(),
                interval: slot(),
                kind: "career".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id: *result.case.id(),
                payload: EntryPayload::close(*result.session.id(), concern_date(), "r"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(
            err.details.get("current_status"),
            Some(&"pending".to_string())
        );
    }

    #[tokio::test]
    async fn session_from_another_case_is_rejected() {
        let store = MemoryStore::new();
        let (case_id, _) = accepted_session(&store).await;

        // A second, unrelated session.
        let request = RequestSessionHandler::new(
            Arc::new(store.sessions()),
            Arc::new(store.cases()),
            coordinator(&store),
        );
        let other = request
            .handle(RequestSessionCommand {
                student: UserId::new("student-2").unwrap(),
                counsellor: counsellor(),
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                interval: slot(),
                kind: "career".to_string(),
                description: None,
            })
            .await
            .unwrap();

        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload: EntryPayload::close(*other.session.id(), concern_date(), "r"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[tokio::test]
    async fn foreign_counsellor_is_forbidden() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: peer(),
                case_id,
                payload: EntryPayload::close(session_id, concern_date(), "r"),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn case_close_failure_is_annotated_after_session_close() {
        let store = MemoryStore::new();
        let (case_id, session_id) = accepted_session(&store).await;

        // Drive the case terminal behind the workflow's back so the
        // second step fails after the session is already closed.
        let mut case = store.cases().find_by_id(&case_id).await.unwrap().unwrap();
        case.cancel().unwrap();
        store.cases().update(&case).await.unwrap();

        let err = handler(&store)
            .handle(AddEntryCommand {
                counsellor: counsellor(),
                case_id,
                payload: EntryPayload::close(session_id, concern_date(), "r"),
            })
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(
            err.details.get("step"),
            Some(&"session closed, but case close failed".to_string())
        );
        // The session close is left as it reached: no rollback.
        let session = store
            .sessions()
            .find_by_id(&session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
    }
}
