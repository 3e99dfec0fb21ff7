//! Referral/Notification Coordinator.
//!
//! The one place lifecycle transitions fan out from. Workflow handlers
//! call the event-level methods after their state change is durable;
//! entity managers never dispatch anything themselves.
//!
//! Dispatch failures are logged and swallowed: a committed transition is
//! never rolled back, and the workflow still reports success.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::case::Case;
use crate::domain::foundation::{
    Actor, CaseId, DomainError, Interval, NotificationId, SessionId, UserId,
};
use crate::domain::notification::Notification;
use crate::domain::session::Session;
use crate::ports::{EmailMessage, MailSender, NotificationRepository, UserDirectory, UserProfile};

/// Coordinates in-app notifications and outbound email for lifecycle
/// events.
pub struct NotificationCoordinator {
    notifications: Arc<dyn NotificationRepository>,
    mail: Arc<dyn MailSender>,
    directory: Arc<dyn UserDirectory>,
}

impl NotificationCoordinator {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        mail: Arc<dyn MailSender>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            notifications,
            mail,
            directory,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Primitives
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates one unread notification row.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    pub async fn notify(
        &self,
        recipient: &UserId,
        case_id: &CaseId,
        session_id: &SessionId,
        details: impl Into<String>,
    ) -> Result<Notification, DomainError> {
        let notification = Notification::new(
            NotificationId::new(),
            recipient.clone(),
            *case_id,
            *session_id,
            details,
        );
        self.notifications.save(&notification).await?;
        Ok(notification)
    }

    /// Hands one email to the delivery transport.
    ///
    /// The transport enqueues without awaiting delivery; failure here
    /// means the message was not even accepted.
    ///
    /// # Errors
    ///
    /// - `InternalError` if the message could not be enqueued
    pub async fn notify_email(
        &self,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), DomainError> {
        self.mail
            .send(EmailMessage {
                to: to.into(),
                subject: subject.into(),
                body: body.into(),
            })
            .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle events
    // ─────────────────────────────────────────────────────────────────────────

    /// A student requested a new session; both parties wait for approval.
    pub async fn session_requested(&self, case: &Case, session: &Session) {
        let (student, counsellor) = self.both_profiles(session).await;
        let student_name = name_of(&student, session.student());

        let to_student = format!(
            "Your session has been requested with Session ID: {} and Case ID: {} for {}. Please wait for approval",
            code_of(session),
            case.code(),
            slot_of(session),
        );
        let to_counsellor = format!(
            "New session requested by {} with Session ID: {} and Case ID: {} for {}",
            student_name,
            code_of(session),
            case.code(),
            slot_of(session),
        );

        futures::join!(
            self.dispatch_notification(session.student(), case, session, to_student.clone()),
            self.dispatch_notification(session.counsellor(), case, session, to_counsellor.clone()),
        );
        self.dispatch_email(student.as_ref(), "Session Requested", &to_student)
            .await;
        self.dispatch_email(counsellor.as_ref(), "New Session Request", &to_counsellor)
            .await;
    }

    /// The counsellor accepted the session.
    pub async fn session_accepted(&self, case: &Case, session: &Session) {
        let (student, counsellor) = self.both_profiles(session).await;
        let counsellor_name = name_of(&counsellor, session.counsellor());

        let to_student = format!(
            "Your session {} has been accepted by {} and is scheduled for {}",
            code_of(session),
            counsellor_name,
            slot_of(session),
        );
        let to_counsellor = format!(
            "Session {} of case {} accepted, scheduled for {}",
            code_of(session),
            case.code(),
            slot_of(session),
        );

        futures::join!(
            self.dispatch_notification(session.student(), case, session, to_student.clone()),
            self.dispatch_notification(session.counsellor(), case, session, to_counsellor.clone()),
        );
        self.dispatch_email(student.as_ref(), "Session Accepted", &to_student)
            .await;
        self.dispatch_email(counsellor.as_ref(), "Session Accepted", &to_counsellor)
            .await;
    }

    /// The session moved to a new slot; both parties see old and new.
    pub async fn session_rescheduled(
        &self,
        case: &Case,
        session: &Session,
        old_date: NaiveDate,
        old_interval: Interval,
        actor: Actor,
    ) {
        let (student, counsellor) = self.both_profiles(session).await;
        let actor_name = match actor {
            Actor::Student => name_of(&student, session.student()),
            Actor::Counsellor => name_of(&counsellor, session.counsellor()),
        };
        let change = format!(
            "from {} {} to {}",
            old_date,
            old_interval,
            slot_of(session)
        );

        let (to_student, to_counsellor, subject) = match actor {
            Actor::Student => (
                format!(
                    "Your reschedule of session {} {} has been requested. Please wait for approval",
                    code_of(session),
                    change,
                ),
                format!(
                    "{} requested to reschedule session {} {}",
                    actor_name,
                    code_of(session),
                    change,
                ),
                "Session Reschedule Requested",
            ),
            Actor::Counsellor => (
                format!(
                    "Your session {} was rescheduled by {} {}",
                    code_of(session),
                    actor_name,
                    change,
                ),
                format!("Session {} rescheduled {}", code_of(session), change),
                "Session Rescheduled",
            ),
        };

        futures::join!(
            self.dispatch_notification(session.student(), case, session, to_student.clone()),
            self.dispatch_notification(session.counsellor(), case, session, to_counsellor.clone()),
        );
        self.dispatch_email(student.as_ref(), subject, &to_student)
            .await;
        self.dispatch_email(counsellor.as_ref(), subject, &to_counsellor)
            .await;
    }

    /// The session was cancelled; the other party is told why.
    pub async fn session_cancelled(&self, case: &Case, session: &Session, actor: Actor) {
        let (student, counsellor) = self.both_profiles(session).await;
        let reason = session
            .cancel_remark()
            .map(|remark| remark.text.clone())
            .unwrap_or_default();

        let (recipient, recipient_profile, actor_name) = match actor {
            Actor::Student => (
                session.counsellor(),
                counsellor.as_ref(),
                name_of(&student, session.student()),
            ),
            Actor::Counsellor => (
                session.student(),
                student.as_ref(),
                name_of(&counsellor, session.counsellor()),
            ),
        };

        let details = format!(
            "Session {} on {} was cancelled by {}. Reason: {}",
            code_of(session),
            slot_of(session),
            actor_name,
            reason,
        );

        self.dispatch_notification(recipient, case, session, details.clone())
            .await;
        self.dispatch_email(recipient_profile, "Session Cancelled", &details)
            .await;
    }

    /// The case was closed out by its counsellor.
    pub async fn case_closed(&self, case: &Case, session: &Session) {
        let student = self.profile(session.student()).await;
        let details = format!(
            "Your case {} has been closed. Reason: {}",
            case.code(),
            case.reason_for_closing().unwrap_or_default(),
        );

        self.dispatch_notification(session.student(), case, session, details.clone())
            .await;
        self.dispatch_email(student.as_ref(), "Case Closed", &details)
            .await;
    }

    /// The case was handed over; a fresh session awaits the new
    /// counsellor's approval.
    pub async fn referral_created(
        &self,
        new_case: &Case,
        new_session: &Session,
        referred_by: &UserId,
    ) {
        let (student, counsellor) = self.both_profiles(new_session).await;
        let referrer = self.profile(referred_by).await;
        let referrer_name = name_of(&referrer, referred_by);

        let to_student = format!(
            "Your session has been requested with Session ID: {} and Case ID: {} for {}. Please wait for approval",
            code_of(new_session),
            new_case.code(),
            slot_of(new_session),
        );
        let to_counsellor = format!(
            "Session referred to you by {} with Session ID: {} and Case ID: {} for {}",
            referrer_name,
            code_of(new_session),
            new_case.code(),
            slot_of(new_session),
        );

        futures::join!(
            self.dispatch_notification(
                new_session.student(),
                new_case,
                new_session,
                to_student.clone()
            ),
            self.dispatch_notification(
                new_session.counsellor(),
                new_case,
                new_session,
                to_counsellor.clone()
            ),
        );
        self.dispatch_email(student.as_ref(), "New Session Requested", &to_student)
            .await;
        self.dispatch_email(counsellor.as_ref(), "New Session Request", &to_counsellor)
            .await;
    }

    /// A peer counsellor was asked for feedback; case ownership is
    /// unchanged.
    pub async fn feedback_requested(
        &self,
        case: &Case,
        session: &Session,
        referred_to: &UserId,
        requested_by: &UserId,
    ) {
        let peer = self.profile(referred_to).await;
        let requester = self.profile(requested_by).await;
        let details = format!(
            "{} requested your feedback on case {} (session {}, {})",
            name_of(&requester, requested_by),
            case.code(),
            code_of(session),
            slot_of(session),
        );

        self.dispatch_notification(referred_to, case, session, details.clone())
            .await;
        self.dispatch_email(peer.as_ref(), "Feedback Requested", &details)
            .await;
    }

    /// A follow-up session was opened under the same counsellor.
    pub async fn follow_up_created(&self, case: &Case, session: &Session) {
        let student = self.profile(session.student()).await;
        let counsellor = self.profile(session.counsellor()).await;
        let details = format!(
            "A follow-up session {} with {} has been scheduled for {}",
            code_of(session),
            name_of(&counsellor, session.counsellor()),
            slot_of(session),
        );

        self.dispatch_notification(session.student(), case, session, details.clone())
            .await;
        self.dispatch_email(student.as_ref(), "Follow-up Session Scheduled", &details)
            .await;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    async fn dispatch_notification(
        &self,
        recipient: &UserId,
        case: &Case,
        session: &Session,
        details: String,
    ) {
        if let Err(err) = self
            .notify(recipient, case.id(), session.id(), details)
            .await
        {
            tracing::warn!(
                recipient = %recipient,
                case = %case.code(),
                error = %err,
                "notification dispatch failed"
            );
        }
    }

    async fn dispatch_email(&self, profile: Option<&UserProfile>, subject: &str, body: &str) {
        let Some(profile) = profile else {
            tracing::warn!(subject, "email skipped: recipient profile unknown");
            return;
        };
        if let Err(err) = self
            .notify_email(profile.email.clone(), subject, body)
            .await
        {
            tracing::warn!(to = %profile.email, error = %err, "email dispatch failed");
        }
    }

    async fn profile(&self, id: &UserId) -> Option<UserProfile> {
        match self.directory.find(id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(user = %id, error = %err, "profile lookup failed");
                None
            }
        }
    }

    async fn both_profiles(
        &self,
        session: &Session,
    ) -> (Option<UserProfile>, Option<UserProfile>) {
        futures::join!(
            self.profile(session.student()),
            self.profile(session.counsellor())
        )
    }
}

fn code_of(session: &Session) -> String {
    session
        .code()
        .map(|code| code.to_string())
        .unwrap_or_else(|| session.id().to_string())
}

fn slot_of(session: &Session) -> String {
    format!("{} {}", session.date(), session.interval())
}

fn name_of(profile: &Option<UserProfile>, fallback: &UserId) -> String {
    profile
        .as_ref()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| fallback.to_string())
}
