//! Case aggregate entity.
//!
//! A case tracks a student's counselling thread across one or more
//! sessions. Its status mirrors the outcome of its governing session and
//! is written nowhere else; the referral list and the session list are
//! append-only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CaseCode, CaseId, CaseStatus, DomainError, SessionCode, SessionId, StateMachine, Timestamp,
    UserId,
};

/// A counsellor the case has been referred to for ownership or feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralEntry {
    pub counsellor: UserId,
}

/// A remark attached to a referral, with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRemark {
    pub author: UserId,
    pub text: String,
}

/// Case aggregate - a student's counselling thread.
///
/// # Invariants
///
/// - `session_ids` only ever grows; referral and follow-up create new
///   sessions rather than mutating old ones
/// - `referrals` is append-only
/// - status changes only through the methods below
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Unique identifier for this case.
    id: CaseId,

    /// Human-readable sequence code (`CS_###`), assigned at creation.
    code: CaseCode,

    /// Student who owns the case.
    student: UserId,

    /// Sessions in this case, oldest first (not owned).
    session_ids: Vec<SessionId>,

    /// Current lifecycle status.
    status: CaseStatus,

    /// Date the concern was raised, recorded on close/refer.
    concern_raised: Option<NaiveDate>,

    /// Counsellors this case was referred to, in order.
    referrals: Vec<ReferralEntry>,

    /// Remarks recorded alongside referrals.
    referral_remarks: Vec<ReferralRemark>,

    /// Reason recorded when the case was closed.
    reason_for_closing: Option<String>,

    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Case {
    /// Create a new pending case with no sessions yet.
    ///
    /// The first session is appended immediately afterwards by the
    /// requesting workflow; a case with zero sessions is still owned by
    /// its creating student.
    pub fn new(id: CaseId, student: UserId, code: CaseCode) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            code,
            student,
            session_ids: Vec::new(),
            status: CaseStatus::Pending,
            concern_raised: None,
            referrals: Vec::new(),
            referral_remarks: Vec::new(),
            reason_for_closing: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a case from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: CaseId,
        code: CaseCode,
        student: UserId,
        session_ids: Vec<SessionId>,
        status: CaseStatus,
        concern_raised: Option<NaiveDate>,
        referrals: Vec<ReferralEntry>,
        referral_remarks: Vec<ReferralRemark>,
        reason_for_closing: Option<String>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            code,
            student,
            session_ids,
            status,
            concern_raised,
            referrals,
            referral_remarks,
            reason_for_closing,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &CaseId {
        &self.id
    }

    pub fn code(&self) -> &CaseCode {
        &self.code
    }

    pub fn student(&self) -> &UserId {
        &self.student
    }

    pub fn session_ids(&self) -> &[SessionId] {
        &self.session_ids
    }

    pub fn session_count(&self) -> usize {
        self.session_ids.len()
    }

    pub fn status(&self) -> CaseStatus {
        self.status
    }

    pub fn concern_raised(&self) -> Option<NaiveDate> {
        self.concern_raised
    }

    pub fn referrals(&self) -> &[ReferralEntry] {
        &self.referrals
    }

    pub fn referral_remarks(&self) -> &[ReferralRemark] {
        &self.referral_remarks
    }

    pub fn reason_for_closing(&self) -> Option<&str> {
        self.reason_for_closing.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Accept the case: `pending -> progress`, mirroring the first
    /// session's acceptance.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the case is pending
    pub fn accept(&mut self) -> Result<(), DomainError> {
        if self.status != CaseStatus::Pending {
            return Err(DomainError::invalid_transition(
                self.status,
                "Only a pending case can be accepted",
            ));
        }
        self.status = CaseStatus::Progress;
        self.touch();
        Ok(())
    }

    /// Close the case: records the concern date and the closing reason.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the case is already terminal
    pub fn close(
        &mut self,
        concern_raised: NaiveDate,
        reason_for_closing: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(CaseStatus::Completed)?;
        self.concern_raised = Some(concern_raised);
        self.reason_for_closing = Some(reason_for_closing.into());
        self.touch();
        Ok(())
    }

    /// Refer the entire case to a different counsellor.
    ///
    /// The case becomes terminal; the receiving counsellor gets a fresh
    /// case and session created by the workflow.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the case is already terminal
    pub fn refer(
        &mut self,
        referred_to: UserId,
        concern_raised: NaiveDate,
    ) -> Result<(), DomainError> {
        self.status = self.status.transition_to(CaseStatus::Referred)?;
        self.referrals.push(ReferralEntry {
            counsellor: referred_to,
        });
        self.concern_raised = Some(concern_raised);
        self.touch();
        Ok(())
    }

    /// Ask a peer counsellor for feedback without handing the case over.
    ///
    /// Appends to the referral list; status and ownership are unchanged.
    /// Not to be confused with [`Case::refer`], which closes the case
    /// out to a new owner.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the case is already terminal
    pub fn add_referer(
        &mut self,
        referred_to: UserId,
        concern_raised: Option<NaiveDate>,
        remark: Option<ReferralRemark>,
    ) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                self.status,
                "Cannot request feedback on a closed case",
            ));
        }
        self.referrals.push(ReferralEntry {
            counsellor: referred_to,
        });
        if let Some(date) = concern_raised {
            self.concern_raised = Some(date);
        }
        if let Some(remark) = remark {
            self.referral_remarks.push(remark);
        }
        self.touch();
        Ok(())
    }

    /// Cancel the case, mirroring its active session's cancellation.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the case is already terminal
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.status = self.status.transition_to(CaseStatus::Cancelled)?;
        self.touch();
        Ok(())
    }

    /// Append a session to the case and derive its sequence code from
    /// the case code and the session's ordinal position.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the case is terminal
    /// - `ValidationFailed` if the session is already in the case
    pub fn append_session(&mut self, session_id: SessionId) -> Result<SessionCode, DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(
                self.status,
                format!("Cannot add a session to a {} case", self.status),
            ));
        }
        if self.session_ids.contains(&session_id) {
            return Err(DomainError::validation(
                "session_id",
                format!("Session {} is already part of case {}", session_id, self.code),
            ));
        }
        self.session_ids.push(session_id);
        self.touch();
        Ok(self.code.session_code(self.session_ids.len()))
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
