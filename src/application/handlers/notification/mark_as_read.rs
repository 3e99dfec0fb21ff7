//! MarkNotificationReadHandler - flip a notification's read flag.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, NotificationId, UserId};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

/// Command marking one notification as read.
#[derive(Debug, Clone)]
pub struct MarkNotificationReadCommand {
    pub recipient: UserId,
    pub notification_id: NotificationId,
}

/// Handler for marking notifications read.
pub struct MarkNotificationReadHandler {
    notifications: Arc<dyn NotificationRepository>,
}

impl MarkNotificationReadHandler {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    pub async fn handle(
        &self,
        cmd: MarkNotificationReadCommand,
    ) -> Result<Notification, DomainError> {
        let mut notification = self
            .notifications
            .find_by_id(&cmd.notification_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::NotificationNotFound,
                    format!("Notification not found: {}", cmd.notification_id),
                )
            })?;

        if notification.recipient() != &cmd.recipient {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only the recipient can mark this notification as read",
            ));
        }

        notification.mark_read();
        self.notifications.update(&notification).await?;
        Ok(notification)
    }
}
