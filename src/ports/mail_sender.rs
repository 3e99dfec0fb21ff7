//! MailSender port - outbound email dispatch.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;

/// One outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Port for handing email to the delivery transport.
///
/// # Contract
///
/// `send` must return once the message has been accepted for delivery;
/// it must NOT await delivery completion. Lifecycle workflows call this
/// after their state change is durable, and a send failure never rolls
/// that change back.
#[async_trait]
pub trait MailSender: Send + Sync {
    /// Enqueue a message for asynchronous delivery.
    ///
    /// # Errors
    ///
    /// - `InternalError` if the message could not be enqueued
    async fn send(&self, message: EmailMessage) -> Result<(), DomainError>;
}
