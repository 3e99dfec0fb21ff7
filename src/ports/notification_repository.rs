//! Notification repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId, UserId};
use crate::domain::notification::Notification;

/// Repository port for notification rows.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Save a new notification.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, notification: &Notification) -> Result<(), DomainError>;

    /// Update an existing notification (read-flag changes).
    ///
    /// # Errors
    ///
    /// - `NotificationNotFound` if the notification doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, notification: &Notification) -> Result<(), DomainError>;

    /// Find a notification by its ID. Returns `None` if not found.
    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError>;

    /// Find a recipient's unread notifications, newest first.
    async fn find_unread_by_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<Notification>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn NotificationRepository) {}
    }
}
