//! In-app notification record.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CaseId, NotificationId, SessionId, Timestamp, UserId};

/// One delivery record of a lifecycle event to one user.
///
/// Created only by the notification coordinator as a side effect of
/// Session/Case transitions; the only mutation is flipping the read
/// flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    id: NotificationId,
    recipient: UserId,
    case_id: CaseId,
    session_id: SessionId,
    details: String,
    read: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Notification {
    /// Creates a new unread notification.
    pub fn new(
        id: NotificationId,
        recipient: UserId,
        case_id: CaseId,
        session_id: SessionId,
        details: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            recipient,
            case_id,
            session_id,
            details: details.into(),
            read: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitute a notification from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: NotificationId,
        recipient: UserId,
        case_id: CaseId,
        session_id: SessionId,
        details: String,
        read: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            recipient,
            case_id,
            session_id,
            details,
            read,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &NotificationId {
        &self.id
    }

    pub fn recipient(&self) -> &UserId {
        &self.recipient
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Marks the notification as read. Idempotent.
    pub fn mark_read(&mut self) {
        if !self.read {
            self.read = true;
            self.updated_at = Timestamp::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification::new(
            NotificationId::new(),
            UserId::new("student-1").unwrap(),
            CaseId::new(),
            SessionId::new(),
            "Your session has been requested. Please wait for approval",
        )
    }

    #[test]
    fn new_notification_is_unread() {
        assert!(!notification().is_read());
    }

    #[test]
    fn mark_read_flips_the_flag() {
        let mut n = notification();
        n.mark_read();
        assert!(n.is_read());
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut n = notification();
        n.mark_read();
        let updated = *n.updated_at();
        n.mark_read();
        assert_eq!(n.updated_at(), &updated);
    }
}
