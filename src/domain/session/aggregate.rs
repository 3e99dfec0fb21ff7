//! Session aggregate entity.
//!
//! A session is one requested or scheduled meeting between a student and
//! a counsellor. All status changes go through the methods below, guarded
//! by the `SessionStatus` state machine.
//!
//! # Ownership
//!
//! Sessions reference their owning case by ID but do NOT own it.
//! Cases are managed by the Case module.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Actor, CaseId, DomainError, Interval, SessionCode, SessionId, SessionStatus, StateMachine,
    Timestamp, UserId,
};

/// Free-text remark recorded on a transition, tagged by the acting party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub actor: Actor,
    pub text: String,
}

/// Session aggregate - one counselling meeting.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `case_id` and `code` are assigned together, exactly once
/// - an active (pending/progress) session's interval must not overlap
///   another active session of the same counsellor on the same date
///   (enforced by the request/reschedule workflows)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,

    /// Human-readable sequence code, assigned on first case attachment.
    code: Option<SessionCode>,

    /// Student who requested or attends the session.
    student: UserId,

    /// Counsellor conducting the session.
    counsellor: UserId,

    /// Owning case (set when the session is attached).
    case_id: Option<CaseId>,

    /// Calendar date of the meeting.
    date: NaiveDate,

    /// Wall-clock interval of the meeting.
    interval: Interval,

    /// Counselling type/category (e.g. "career").
    kind: String,

    /// Optional free-text description from the requester.
    description: Option<String>,

    /// Current lifecycle status.
    status: SessionStatus,

    /// Meeting platform, attached on acceptance.
    platform: Option<String>,

    /// Meeting link, attached on acceptance.
    meeting_link: Option<String>,

    /// Remark recorded by the last reschedule, tagged by actor.
    reschedule_remark: Option<Remark>,

    /// Remark recorded on cancellation, tagged by actor.
    cancel_remark: Option<Remark>,

    /// Interaction notes recorded when the session is closed.
    interaction_notes: Option<String>,

    /// Case-summary text recorded when the session is closed.
    case_summary: Option<String>,

    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Create a new pending session (student request, or the session
    /// carried into a referral).
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `kind` is empty
    pub fn request(
        id: SessionId,
        student: UserId,
        counsellor: UserId,
        date: NaiveDate,
        interval: Interval,
        kind: String,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::build(
            id,
            student,
            counsellor,
            date,
            interval,
            kind,
            description,
            SessionStatus::Pending,
        )
    }

    /// Create a counsellor-initiated follow-up session.
    ///
    /// Follow-ups are self-approving and start in `Progress`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `kind` is empty
    pub fn follow_up(
        id: SessionId,
        student: UserId,
        counsellor: UserId,
        date: NaiveDate,
        interval: Interval,
        kind: String,
        description: Option<String>,
    ) -> Result<Self, DomainError> {
        Self::build(
            id,
            student,
            counsellor,
            date,
            interval,
            kind,
            description,
            SessionStatus::Progress,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        id: SessionId,
        student: UserId,
        counsellor: UserId,
        date: NaiveDate,
        interval: Interval,
        kind: String,
        description: Option<String>,
        status: SessionStatus,
    ) -> Result<Self, DomainError> {
        if kind.trim().is_empty() {
            return Err(DomainError::validation(
                "kind",
                "Counselling type cannot be empty",
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            id,
            code: None,
            student,
            counsellor,
            case_id: None,
            date,
            interval,
            kind,
            description,
            status,
            platform: None,
            meeting_link: None,
            reschedule_remark: None,
            cancel_remark: None,
            interaction_notes: None,
            case_summary: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        code: Option<SessionCode>,
        student: UserId,
        counsellor: UserId,
        case_id: Option<CaseId>,
        date: NaiveDate,
        interval: Interval,
        kind: String,
        description: Option<String>,
        status: SessionStatus,
        platform: Option<String>,
        meeting_link: Option<String>,
        reschedule_remark: Option<Remark>,
        cancel_remark: Option<Remark>,
        interaction_notes: Option<String>,
        case_summary: Option<String>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            code,
            student,
            counsellor,
            case_id,
            date,
            interval,
            kind,
            description,
            status,
            platform,
            meeting_link,
            reschedule_remark,
            cancel_remark,
            interaction_notes,
            case_summary,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn code(&self) -> Option<&SessionCode> {
        self.code.as_ref()
    }

    pub fn student(&self) -> &UserId {
        &self.student
    }

    pub fn counsellor(&self) -> &UserId {
        &self.counsellor
    }

    pub fn case_id(&self) -> Option<&CaseId> {
        self.case_id.as_ref()
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn meeting_link(&self) -> Option<&str> {
        self.meeting_link.as_deref()
    }

    pub fn reschedule_remark(&self) -> Option<&Remark> {
        self.reschedule_remark.as_ref()
    }

    pub fn cancel_remark(&self) -> Option<&Remark> {
        self.cancel_remark.as_ref()
    }

    pub fn interaction_notes(&self) -> Option<&str> {
        self.interaction_notes.as_deref()
    }

    pub fn case_summary(&self) -> Option<&str> {
        self.case_summary.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Returns true if this session claims the given slot: it is active
    /// (pending/progress), on the same date, and its interval overlaps.
    pub fn occupies(&self, date: NaiveDate, interval: &Interval) -> bool {
        self.status.is_active() && self.date == date && self.interval.overlaps(interval)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach this session to its owning case and assign its sequence code.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the session is already attached; the code
    ///   is immutable after first assignment
    pub fn attach_to_case(&mut self, case_id: CaseId, code: SessionCode) -> Result<(), DomainError> {
        if self.case_id.is_some() {
            return Err(DomainError::validation(
                "case_id",
                format!("Session {} is already attached to a case", self.id),
            ));
        }
        self.case_id = Some(case_id);
        self.code = Some(code);
        self.touch();
        Ok(())
    }

    /// Accept the session (counsellor): `pending -> progress`.
    ///
    /// Optionally attaches a meeting platform and link.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the session is pending
    pub fn accept(
        &mut self,
        platform: Option<String>,
        meeting_link: Option<String>,
    ) -> Result<(), DomainError> {
        if self.status != SessionStatus::Pending {
            return Err(DomainError::invalid_transition(
                self.status,
                "Only a pending session can be accepted",
            ));
        }
        self.status = SessionStatus::Progress;
        self.platform = platform;
        self.meeting_link = meeting_link;
        self.touch();
        Ok(())
    }

    /// Reschedule the session to a new date and interval.
    ///
    /// A student may reschedule only while the session is pending, and
    /// the result awaits counsellor confirmation (`rescheduled`). A
    /// counsellor reschedule is self-approving and lands in `progress`,
    /// from either `pending` or `rescheduled`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the current status does not permit
    ///   the actor's reschedule; the session is left unmodified
    pub fn reschedule(
        &mut self,
        actor: Actor,
        new_date: NaiveDate,
        new_interval: Interval,
        remark: impl Into<String>,
    ) -> Result<(), DomainError> {
        let next = match actor {
            Actor::Student => {
                if self.status != SessionStatus::Pending {
                    return Err(DomainError::invalid_transition(
                        self.status,
                        "Only a pending session can be rescheduled by the student",
                    ));
                }
                SessionStatus::Rescheduled
            }
            Actor::Counsellor => {
                if !matches!(
                    self.status,
                    SessionStatus::Pending | SessionStatus::Rescheduled
                ) {
                    return Err(DomainError::invalid_transition(
                        self.status,
                        "Only a pending or rescheduled session can be rescheduled by the counsellor",
                    ));
                }
                SessionStatus::Progress
            }
        };

        self.status = next;
        self.date = new_date;
        self.interval = new_interval;
        self.reschedule_remark = Some(Remark {
            actor,
            text: remark.into(),
        });
        self.touch();
        Ok(())
    }

    /// Cancel the session from any non-terminal status.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session is already completed or
    ///   cancelled
    pub fn cancel(&mut self, actor: Actor, remark: impl Into<String>) -> Result<(), DomainError> {
        self.status = self.status.transition_to(SessionStatus::Cancelled)?;
        self.cancel_remark = Some(Remark {
            actor,
            text: remark.into(),
        });
        self.touch();
        Ok(())
    }

    /// Close the session (counsellor, via add-entry): `progress -> completed`.
    ///
    /// Records interaction notes and the case-summary text.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the session is in progress
    pub fn close(
        &mut self,
        interaction_notes: Option<String>,
        case_summary: Option<String>,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(SessionStatus::Completed)?;
        self.interaction_notes = interaction_notes;
        self.case_summary = case_summary;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
